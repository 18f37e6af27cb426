use std::sync::Arc;

use places_api::Coordinate;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::state::PlacesStore;

pub mod source;

pub use source::{FeedSource, ManualSource, StaticSource};

/// A coordinate plus the device time (ms since the epoch) it was captured at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationReading {
    pub coords: Coordinate,
    pub timestamp: u64,
}

/// Failure categories of the platform geolocation service, numbered as the platform numbers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionErrorCode {
    PermissionDenied = 1,
    PositionUnavailable = 2,
    Timeout = 3,
}

impl PositionErrorCode {
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(PositionErrorCode::PermissionDenied),
            2 => Some(PositionErrorCode::PositionUnavailable),
            3 => Some(PositionErrorCode::Timeout),
            _ => None,
        }
    }

    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct PositionError {
    pub code: PositionErrorCode,
    pub message: String,
}

impl PositionError {
    pub fn new(code: PositionErrorCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

pub type PositionEvent = Result<LocationReading, PositionError>;
pub type PositionSink = UnboundedSender<PositionEvent>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchId(pub u64);

/// Continuous position updates from the platform.
///
/// A source owns its own retry policy; it keeps delivering events after an
/// error for as long as the watch is active.
pub trait PositionSource: Send + Sync {
    fn watch_position(&self, sink: PositionSink) -> WatchId;

    fn clear_watch(&self, id: WatchId);
}

/// Observes a [`PositionSource`] from creation until drop.
///
/// Each reading overwrites the previous one in the store; each error is
/// surfaced as the store's error text. There is no pause/resume: dropping
/// the tracker (or calling [`LocationTracker::stop`]) clears the watch.
pub struct LocationTracker {
    source: Arc<dyn PositionSource>,
    watch: Option<WatchId>,
    task: JoinHandle<()>,
}

impl LocationTracker {
    /// Subscribe to `source` and start applying its events to `store`.
    /// Must be called from within a tokio runtime.
    pub fn start(source: Arc<dyn PositionSource>, store: PlacesStore) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let watch = source.watch_position(tx);
        info!(watch_id = watch.0, "[location] watching position");
        let task = tokio::spawn(apply_events(rx, store));
        Self {
            source,
            watch: Some(watch),
            task,
        }
    }

    pub fn is_observing(&self) -> bool {
        self.watch.is_some()
    }

    pub fn stop(self) {
        drop(self);
    }

    fn release(&mut self) {
        if let Some(id) = self.watch.take() {
            self.source.clear_watch(id);
            info!(watch_id = id.0, "[location] watch cleared");
        }
        self.task.abort();
    }
}

impl Drop for LocationTracker {
    fn drop(&mut self) {
        self.release();
    }
}

async fn apply_events(mut rx: UnboundedReceiver<PositionEvent>, store: PlacesStore) {
    while let Some(event) = rx.recv().await {
        match event {
            Ok(reading) => {
                debug!(
                    latitude = reading.coords.latitude,
                    longitude = reading.coords.longitude,
                    timestamp = reading.timestamp,
                    "[location] reading"
                );
                store.record_location(reading);
            }
            Err(err) => {
                warn!(code = err.code.as_u16(), "[location] watch error: {}", err);
                store.record_location_error(err.message);
            }
        }
    }
    debug!("[location] position source closed");
}
