use places_api::{Coordinate, Place};
use serde::Serialize;
use tokio::sync::watch;

use crate::location::LocationReading;
use crate::search::SearchError;

/// Everything the presentation layer renders from.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchState {
    pub searching: bool,
    pub error: Option<String>,
    pub places: Vec<Place>,
    pub location: Option<Coordinate>,
    pub location_timestamp: Option<u64>,
}

/// Single published state cell shared by the tracker and the orchestrator.
///
/// The tracker is the only writer of the location fields; the orchestrator
/// owns `searching` and `places`. Both may set `error`.
#[derive(Clone)]
pub struct PlacesStore {
    tx: watch::Sender<SearchState>,
}

impl Default for PlacesStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PlacesStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SearchState::default());
        Self { tx }
    }

    pub fn snapshot(&self) -> SearchState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.tx.subscribe()
    }

    /// Latest reading, read at the moment of the call.
    pub fn location(&self) -> Option<LocationReading> {
        let state = self.tx.borrow();
        match (state.location, state.location_timestamp) {
            (Some(coords), Some(timestamp)) => Some(LocationReading { coords, timestamp }),
            _ => None,
        }
    }

    pub fn record_location(&self, reading: LocationReading) {
        self.tx.send_modify(|s| {
            s.location = Some(reading.coords);
            s.location_timestamp = Some(reading.timestamp);
        });
    }

    pub fn record_location_error(&self, message: String) {
        self.tx.send_modify(|s| s.error = Some(message));
    }

    pub fn begin_search(&self) {
        self.tx.send_modify(|s| {
            s.searching = true;
            s.error = None;
            s.places.clear();
        });
    }

    pub fn finish_search(&self, outcome: Result<Vec<Place>, SearchError>) {
        self.tx.send_modify(|s| {
            match outcome {
                Ok(places) => s.places = places,
                Err(err) => {
                    s.places.clear();
                    s.error = Some(err.to_string());
                }
            }
            s.searching = false;
        });
    }
}
