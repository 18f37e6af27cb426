use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of a successful search. The provider answers `{}` when nothing matched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacesResponse {
    #[serde(default)]
    pub places: Vec<Place>,
}

/// A point of interest exactly as the provider returned it.
///
/// The record is kept verbatim (every field, in order); the accessors only
/// read well-known fields and never reshape it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Place(pub Map<String, Value>);

impl Place {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn id(&self) -> Option<&str> {
        self.get("id").and_then(Value::as_str)
    }

    pub fn display_name(&self) -> Option<&str> {
        self.get("displayName")
            .and_then(|v| v.get("text"))
            .and_then(Value::as_str)
    }

    pub fn formatted_address(&self) -> Option<&str> {
        self.get("formattedAddress").and_then(Value::as_str)
    }

    pub fn rating(&self) -> Option<f64> {
        self.get("rating").and_then(Value::as_f64)
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Place {
    fn from(fields: Map<String, Value>) -> Self {
        Place(fields)
    }
}
