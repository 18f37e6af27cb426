pub mod client;
pub mod config;
pub mod location;
pub mod nearby_places;
pub mod render;
pub mod search;
pub mod state;

pub use places_api as api;

pub use nearby_places::NearbyPlaces;
