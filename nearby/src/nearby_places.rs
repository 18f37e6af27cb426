use std::sync::Arc;
use std::time::Duration;

use places_api::SearchOptions;
use tokio::sync::watch;

use crate::client::PlacesClient;
use crate::location::{LocationReading, LocationTracker, PositionSource};
use crate::search::{SearchOrchestrator, SearchOutcome};
use crate::state::{PlacesStore, SearchState};

/// Tracker, orchestrator and published state wired together.
///
/// Location tracking starts on construction and stops when this value is dropped.
pub struct NearbyPlaces {
    store: PlacesStore,
    orchestrator: SearchOrchestrator,
    tracker: LocationTracker,
}

impl NearbyPlaces {
    pub fn start(source: Arc<dyn PositionSource>, client: PlacesClient) -> Self {
        let store = PlacesStore::new();
        let tracker = LocationTracker::start(source, store.clone());
        let orchestrator = SearchOrchestrator::new(client, store.clone());
        Self {
            store,
            orchestrator,
            tracker,
        }
    }

    pub async fn search(&self, options: SearchOptions) -> SearchOutcome {
        self.orchestrator.search(options).await
    }

    /// Handle for issuing searches from other tasks.
    pub fn orchestrator(&self) -> SearchOrchestrator {
        self.orchestrator.clone()
    }

    pub fn state(&self) -> SearchState {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchState> {
        self.store.subscribe()
    }

    pub fn is_tracking(&self) -> bool {
        self.tracker.is_observing()
    }

    /// Wait until a reading or a location error is published, at most `timeout`.
    pub async fn wait_for_location(&self, timeout: Duration) -> Option<LocationReading> {
        let mut rx = self.store.subscribe();
        let settled = rx.wait_for(|s| s.location.is_some() || s.error.is_some());
        let _ = tokio::time::timeout(timeout, async { settled.await.map(|_| ()) }).await;
        self.store.location()
    }
}
