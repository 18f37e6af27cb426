use serde::Serialize;

use crate::endpoint::SearchKind;
use crate::geo::{CircleArea, Coordinate};

pub const DEFAULT_RADIUS: f64 = 25.0;
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const DEFAULT_PLACE_TYPE: &str = "restaurant";

/// Caller-facing search input; anything left unset falls back to the defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOptions {
    pub search_terms: Option<String>,
    pub radius: Option<f64>,
    pub page_size: Option<u32>,
    pub place_type: Option<String>,
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn terms(mut self, terms: impl Into<String>) -> Self {
        self.search_terms = Some(terms.into());
        self
    }

    pub fn radius(mut self, radius: f64) -> Self {
        self.radius = Some(radius);
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn place_type(mut self, place_type: impl Into<String>) -> Self {
        self.place_type = Some(place_type.into());
        self
    }

    /// Apply defaults. Values are not range checked; the provider rejects what it rejects.
    pub fn resolve(self) -> SearchRequest {
        SearchRequest {
            search_terms: self.search_terms.unwrap_or_default(),
            radius: self.radius.unwrap_or(DEFAULT_RADIUS),
            page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
            place_type: self
                .place_type
                .unwrap_or_else(|| DEFAULT_PLACE_TYPE.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub search_terms: String,
    pub radius: f64,
    pub page_size: u32,
    pub place_type: String,
}

impl Default for SearchRequest {
    fn default() -> Self {
        SearchOptions::default().resolve()
    }
}

impl SearchRequest {
    /// Empty terms select nearby-search, anything else (whitespace included) text-search.
    pub fn kind(&self) -> SearchKind {
        if self.search_terms.is_empty() {
            SearchKind::Nearby
        } else {
            SearchKind::Text
        }
    }

    /// Build the provider payload for a search centered on `center`.
    pub fn to_places_request(&self, center: Coordinate) -> PlacesRequest {
        let area = CircleArea::around(center, self.radius);
        match self.kind() {
            SearchKind::Nearby => PlacesRequest::Nearby(NearbySearchBody {
                included_types: vec![self.place_type.clone()],
                max_result_count: self.page_size,
                location_restriction: area,
            }),
            SearchKind::Text => PlacesRequest::Text(TextSearchBody {
                text_query: self.search_terms.clone(),
                included_type: self.place_type.clone(),
                page_size: self.page_size,
                location_bias: area,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbySearchBody {
    pub included_types: Vec<String>,
    pub max_result_count: u32,
    pub location_restriction: CircleArea,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextSearchBody {
    pub text_query: String,
    pub included_type: String,
    pub page_size: u32,
    pub location_bias: CircleArea,
}

/// One outbound search; serializes to the bare body of its endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PlacesRequest {
    Nearby(NearbySearchBody),
    Text(TextSearchBody),
}

impl PlacesRequest {
    pub fn kind(&self) -> SearchKind {
        match self {
            PlacesRequest::Nearby(_) => SearchKind::Nearby,
            PlacesRequest::Text(_) => SearchKind::Text,
        }
    }

    pub fn path(&self) -> &'static str {
        self.kind().path()
    }

    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
