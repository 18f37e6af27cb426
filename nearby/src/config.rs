use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use places_api::endpoint::PLACES_BASE_URL;
use places_api::{Coordinate, SearchOptions};
use thiserror::Error;
use url::Url;

use crate::location::source::{parse_coordinate, FeedError};
use crate::location::{FeedSource, PositionSource, StaticSource};

#[derive(Debug, Clone, PartialEq)]
pub enum PositionConfig {
    Static(Coordinate),
    Stdin,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub api_key: Option<String>,
    pub base_url: Url,
    pub request_timeout_ms: Option<u64>, // None (client default)

    pub position: PositionConfig, // stdin
    pub fix_timeout_ms: u64,      // 10000

    pub radius: Option<f64>,
    pub page_size: Option<u32>,
    pub place_type: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            request_timeout_ms: None,
            position: PositionConfig::Stdin,
            fix_timeout_ms: 10_000,
            radius: None,
            page_size: None,
            place_type: None,
        }
    }
}

fn default_base_url() -> Url {
    Url::parse(PLACES_BASE_URL).expect("default base url")
}

impl Config {
    /// - PLACES_API_KEY (required to build the HTTP client)
    /// - PLACES_BASE_URL (default https://places.googleapis.com)
    /// - PLACES_REQUEST_TIMEOUT_MS (optional)
    /// - NEARBY_POSITION ("lat,lon" or "stdin", default stdin)
    /// - NEARBY_FIX_TIMEOUT_MS (default 10000)
    /// - NEARBY_RADIUS / NEARBY_PAGE_SIZE / NEARBY_TYPE (optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        cfg.api_key = get("PLACES_API_KEY");
        if let Some(raw) = get("PLACES_BASE_URL") {
            cfg.base_url =
                Url::parse(&raw).map_err(|e| ConfigError::InvalidBaseUrl(format!("{raw}: {e}")))?;
            if !matches!(cfg.base_url.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidBaseUrl(raw));
            }
        }
        cfg.request_timeout_ms = parse_number(&get, "PLACES_REQUEST_TIMEOUT_MS")?;

        cfg.position = match get("NEARBY_POSITION") {
            None => PositionConfig::Stdin,
            Some(v) if v.eq_ignore_ascii_case("stdin") => PositionConfig::Stdin,
            Some(v) => PositionConfig::Static(parse_coordinate(&v)?),
        };
        cfg.fix_timeout_ms =
            parse_number(&get, "NEARBY_FIX_TIMEOUT_MS")?.unwrap_or(cfg.fix_timeout_ms);

        cfg.radius = parse_number(&get, "NEARBY_RADIUS")?;
        cfg.page_size = parse_number(&get, "NEARBY_PAGE_SIZE")?;
        cfg.place_type = get("NEARBY_TYPE");

        Ok(cfg)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    pub fn fix_timeout(&self) -> Duration {
        Duration::from_millis(self.fix_timeout_ms)
    }

    pub fn position_source(&self) -> Arc<dyn PositionSource> {
        match &self.position {
            PositionConfig::Static(coords) => Arc::new(StaticSource::new(*coords)),
            PositionConfig::Stdin => Arc::new(FeedSource::stdin()),
        }
    }

    /// Search options for `terms`, with the configured overrides filled in.
    pub fn search_options(&self, terms: String) -> SearchOptions {
        SearchOptions {
            search_terms: Some(terms),
            radius: self.radius,
            page_size: self.page_size,
            place_type: self.place_type.clone(),
        }
    }
}

fn parse_number<T, G>(get: &G, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber {
                key: key.to_string(),
                value: raw,
            }),
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PLACES_API_KEY is not set")]
    MissingApiKey,

    #[error("invalid PLACES_BASE_URL: {0}")]
    InvalidBaseUrl(String),

    #[error("{key} must be a number, got {value:?}")]
    InvalidNumber { key: String, value: String },

    #[error("invalid NEARBY_POSITION: {0}")]
    InvalidPosition(#[from] FeedError),

    #[error("http client setup failed: {0}")]
    Client(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| env.get(k).cloned())
    }

    #[test]
    fn defaults_without_env() {
        let cfg = load(&[]).unwrap();
        assert!(cfg.api_key.is_none());
        assert_eq!(cfg.base_url.as_str(), "https://places.googleapis.com/");
        assert_eq!(cfg.position, PositionConfig::Stdin);
        assert_eq!(cfg.fix_timeout_ms, 10_000);
        assert!(cfg.request_timeout().is_none());
    }

    #[test]
    fn reads_overrides() {
        let cfg = load(&[
            ("PLACES_API_KEY", "k"),
            ("NEARBY_POSITION", "43.6,-79.4"),
            ("NEARBY_RADIUS", "5"),
            ("NEARBY_PAGE_SIZE", "20"),
            ("NEARBY_TYPE", "cafe"),
            ("PLACES_REQUEST_TIMEOUT_MS", "1500"),
        ])
        .unwrap();
        assert_eq!(cfg.api_key.as_deref(), Some("k"));
        assert_eq!(cfg.position, PositionConfig::Static(Coordinate::new(43.6, -79.4)));
        assert_eq!(cfg.request_timeout(), Some(Duration::from_millis(1500)));
        let opts = cfg.search_options("sushi".into()).resolve();
        assert_eq!(opts.radius, 5.0);
        assert_eq!(opts.page_size, 20);
        assert_eq!(opts.place_type, "cafe");
    }

    #[test]
    fn rejects_bad_position_and_url() {
        assert!(matches!(
            load(&[("NEARBY_POSITION", "north")]),
            Err(ConfigError::InvalidPosition(_))
        ));
        assert!(matches!(
            load(&[("PLACES_BASE_URL", "ftp://example.com")]),
            Err(ConfigError::InvalidBaseUrl(_))
        ));
    }

    #[test]
    fn rejects_non_numeric_overrides() {
        for key in [
            "PLACES_REQUEST_TIMEOUT_MS",
            "NEARBY_FIX_TIMEOUT_MS",
            "NEARBY_RADIUS",
            "NEARBY_PAGE_SIZE",
        ] {
            match load(&[(key, "abc")]) {
                Err(ConfigError::InvalidNumber { key: k, value }) => {
                    assert_eq!(k, key);
                    assert_eq!(value, "abc");
                }
                other => panic!("{key}: expected InvalidNumber, got {other:?}"),
            }
        }
        let err = load(&[("NEARBY_RADIUS", "abc")]).unwrap_err();
        assert_eq!(err.to_string(), "NEARBY_RADIUS must be a number, got \"abc\"");
    }
}
