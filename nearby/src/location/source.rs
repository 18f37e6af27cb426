use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use places_api::Coordinate;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{
    LocationReading, PositionError, PositionErrorCode, PositionEvent, PositionSink,
    PositionSource, WatchId,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("expected \"lat,lon\" but got {0:?}")]
    Malformed(String),
    #[error("invalid number {0:?}")]
    InvalidNumber(String),
    #[error("coordinate out of range: {0}")]
    OutOfRange(String),
    #[error("unknown position error code {0}")]
    UnknownCode(u16),
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn parse_f64(raw: &str) -> Result<f64, FeedError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| FeedError::InvalidNumber(raw.trim().to_string()))
}

/// Parse `"lat,lon"` in degrees.
pub fn parse_coordinate(raw: &str) -> Result<Coordinate, FeedError> {
    let (lat, lon) = raw
        .split_once(',')
        .ok_or_else(|| FeedError::Malformed(raw.to_string()))?;
    let latitude = parse_f64(lat)?;
    let longitude = parse_f64(lon)?;
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(FeedError::OutOfRange(raw.trim().to_string()));
    }
    Ok(Coordinate::new(latitude, longitude))
}

/// One line of a position feed:
/// - `lat,lon` (captured now)
/// - `lat,lon,timestamp_ms`
/// - `error <code> <message>` with the platform error codes 1..=3
pub fn parse_feed_line(line: &str) -> Result<PositionEvent, FeedError> {
    let line = line.trim();
    let (head, tail) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    if head == "error" {
        let rest = tail.trim_start();
        let (code, message) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        let code = code
            .parse::<u16>()
            .map_err(|_| FeedError::InvalidNumber(code.to_string()))?;
        let code = PositionErrorCode::from_code(code).ok_or(FeedError::UnknownCode(code))?;
        return Ok(Err(PositionError::new(code, message.trim())));
    }

    let mut parts = line.splitn(3, ',');
    let (lat, lon) = match (parts.next(), parts.next()) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => return Err(FeedError::Malformed(line.to_string())),
    };
    let coords = parse_coordinate(&format!("{lat},{lon}"))?;
    let timestamp = match parts.next() {
        Some(ts) => ts
            .trim()
            .parse::<u64>()
            .map_err(|_| FeedError::InvalidNumber(ts.trim().to_string()))?,
        None => now_millis(),
    };
    Ok(Ok(LocationReading { coords, timestamp }))
}

/// Reports a single fixed coordinate to every new watch.
#[derive(Debug)]
pub struct StaticSource {
    coords: Coordinate,
    next_id: AtomicU64,
}

impl StaticSource {
    pub fn new(coords: Coordinate) -> Self {
        Self { coords, next_id: AtomicU64::new(1) }
    }
}

impl PositionSource for StaticSource {
    fn watch_position(&self, sink: PositionSink) -> WatchId {
        let id = WatchId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let _ = sink.send(Ok(LocationReading {
            coords: self.coords,
            timestamp: now_millis(),
        }));
        id
    }

    fn clear_watch(&self, id: WatchId) {
        debug!(watch_id = id.0, "[location] static watch cleared");
    }
}

/// Fans caller-pushed events out to every active watch.
#[derive(Debug, Default)]
pub struct ManualSource {
    next_id: AtomicU64,
    watches: Mutex<HashMap<WatchId, PositionSink>>,
}

impl ManualSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to all active watches; returns how many received it.
    pub fn push(&self, event: PositionEvent) -> usize {
        let watches = self.watches.lock().unwrap_or_else(PoisonError::into_inner);
        watches
            .values()
            .filter(|sink| sink.send(event.clone()).is_ok())
            .count()
    }

    pub fn push_reading(&self, coords: Coordinate, timestamp: u64) -> usize {
        self.push(Ok(LocationReading { coords, timestamp }))
    }

    pub fn push_error(&self, code: PositionErrorCode, message: &str) -> usize {
        self.push(Err(PositionError::new(code, message)))
    }

    pub fn active_watches(&self) -> usize {
        self.watches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl PositionSource for ManualSource {
    fn watch_position(&self, sink: PositionSink) -> WatchId {
        let id = WatchId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.watches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, sink);
        id
    }

    fn clear_watch(&self, id: WatchId) {
        self.watches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }
}

type BoxedReader = Box<dyn AsyncBufRead + Unpin + Send>;

/// Line-oriented position feed (see [`parse_feed_line`]), e.g. stdin.
///
/// The reader can back one watch only; later watches receive a
/// `PositionUnavailable` error.
pub struct FeedSource {
    reader: Mutex<Option<BoxedReader>>,
    next_id: AtomicU64,
    tasks: Mutex<HashMap<WatchId, JoinHandle<()>>>,
}

impl FeedSource {
    pub fn new<R>(reader: R) -> Self
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        Self {
            reader: Mutex::new(Some(Box::new(reader))),
            next_id: AtomicU64::new(1),
            tasks: Mutex::new(HashMap::new()),
        }
    }

    pub fn stdin() -> Self {
        Self::new(tokio::io::BufReader::new(tokio::io::stdin()))
    }
}

impl PositionSource for FeedSource {
    fn watch_position(&self, sink: PositionSink) -> WatchId {
        let id = WatchId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let reader = self
            .reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(reader) = reader else {
            let _ = sink.send(Err(PositionError::new(
                PositionErrorCode::PositionUnavailable,
                "position feed is already being watched",
            )));
            return id;
        };
        let task = tokio::spawn(pump_feed(reader, sink));
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, task);
        id
    }

    fn clear_watch(&self, id: WatchId) {
        let task = self
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        if let Some(task) = task {
            task.abort();
        }
    }
}

async fn pump_feed(reader: BoxedReader, sink: PositionSink) {
    let mut lines = reader.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                warn!("[location] feed read error: {e}");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_feed_line(&line) {
            Ok(event) => {
                if sink.send(event).is_err() {
                    break;
                }
            }
            Err(e) => warn!("[location] skipping feed line: {e}"),
        }
    }
    debug!("[location] feed ended");
}
