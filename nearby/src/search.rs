use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use places_api::{Place, SearchOptions, SearchRequest};
use thiserror::Error;
use tracing::{debug, info};

use crate::client::{ClientError, PlacesClient};
use crate::state::PlacesStore;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error("Waiting for GPS location...")]
    LocationUnavailable,
    #[error(transparent)]
    Request(#[from] ClientError),
}

/// What happened to one `search` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Completed,
    Failed,
    /// A newer search was started before this one resolved; its result was dropped.
    Superseded,
}

/// Runs searches against the latest tracked location and publishes the result.
///
/// Every dispatch takes a new generation. Only the most recently started
/// search may publish, so a slow earlier response never overwrites a newer
/// one and the in-flight flag belongs to the newest search.
#[derive(Clone)]
pub struct SearchOrchestrator {
    client: PlacesClient,
    store: PlacesStore,
    generation: Arc<AtomicU64>,
}

impl SearchOrchestrator {
    pub fn new(client: PlacesClient, store: PlacesStore) -> Self {
        Self {
            client,
            store,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn search(&self, options: SearchOptions) -> SearchOutcome {
        let request = options.resolve();
        let id = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.store.begin_search();

        let outcome = self.run(&request).await;

        if self.generation.load(Ordering::SeqCst) != id {
            debug!(generation = id, "[search] discarding superseded result");
            return SearchOutcome::Superseded;
        }
        let status = match &outcome {
            Ok(places) => {
                info!(generation = id, count = places.len(), "[search] completed");
                SearchOutcome::Completed
            }
            Err(err) => {
                info!(generation = id, "[search] failed: {err}");
                SearchOutcome::Failed
            }
        };
        self.store.finish_search(outcome);
        status
    }

    async fn run(&self, request: &SearchRequest) -> Result<Vec<Place>, SearchError> {
        // read once; later readings do not affect this dispatch
        let reading = self
            .store
            .location()
            .ok_or(SearchError::LocationUnavailable)?;
        let body = request.to_places_request(reading.coords);
        Ok(self.client.submit(&body).await?)
    }
}
