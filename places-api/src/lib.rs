pub mod geo;
pub mod request;
pub mod response;
pub mod status;

pub mod endpoint {
    pub const PLACES_BASE_URL: &str = "https://places.googleapis.com";
    pub const API_VERSION: &str = "v1";

    pub const API_KEY_HEADER: &str = "X-Goog-Api-Key";
    pub const FIELD_MASK_HEADER: &str = "X-Goog-FieldMask";
    /// Field mask asking the provider for every response field.
    pub const FIELD_MASK_ALL: &str = "*";

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum SearchKind {
        Nearby,
        Text,
    }

    impl SearchKind {
        pub fn path(self) -> &'static str {
            match self {
                SearchKind::Nearby => "/v1/places:searchNearby",
                SearchKind::Text => "/v1/places:searchText",
            }
        }

        pub fn as_str(self) -> &'static str {
            match self {
                SearchKind::Nearby => "nearby",
                SearchKind::Text => "text",
            }
        }
    }

    /// Join a base such as `https://places.googleapis.com/` with the endpoint path.
    pub fn url_for(base: &str, kind: SearchKind) -> String {
        format!("{}{}", base.trim_end_matches('/'), kind.path())
    }
}

pub use geo::{Circle, CircleArea, Coordinate};
pub use request::{PlacesRequest, SearchOptions, SearchRequest};
pub use response::{Place, PlacesResponse};
