use serde::{Deserialize, Serialize};

/// Point in degrees, as reported by the device location service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    pub center: Coordinate,
    pub radius: f64,
}

/// `{ "circle": { ... } }`, the shape used by both `locationRestriction` and `locationBias`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircleArea {
    pub circle: Circle,
}

impl CircleArea {
    pub fn around(center: Coordinate, radius: f64) -> Self {
        Self { circle: Circle { center, radius } }
    }
}
