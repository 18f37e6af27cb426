use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use places_api::endpoint::{url_for, API_KEY_HEADER, FIELD_MASK_ALL, FIELD_MASK_HEADER};
use places_api::status::{is_success, parse_error_body};
use places_api::{Place, PlacesRequest, PlacesResponse};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{Config, ConfigError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("Request failed with status code {}{}", .status, detail(.message))]
    Status { status: u16, message: Option<String> },
    #[error("Network Error: {0}")]
    Network(String),
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("invalid request body: {0}")]
    Encode(String),
}

fn detail(message: &Option<String>) -> String {
    match message {
        Some(m) => format!(": {m}"),
        None => String::new(),
    }
}

/// One outbound POST, already fully addressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpCall {
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpCall {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub code: u16,
    pub body: Vec<u8>,
}

pub type TransportFuture = Pin<Box<dyn Future<Output = Result<HttpReply, ClientError>> + Send>>;

pub type TransportFn = dyn Fn(HttpCall) -> TransportFuture + Send + Sync;

#[derive(Clone)]
pub struct PlacesClient {
    transport: Arc<TransportFn>,
    base_url: String,
    api_key: String,
}

impl PlacesClient {
    pub fn new_with_transport(
        transport: Arc<TransportFn>,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Client whose calls go to `transport` instead of the network (for tests).
    pub fn new_test(transport: Arc<TransportFn>) -> Self {
        Self::new_with_transport(transport, "http://places.test", "test-key")
    }

    /// Client backed by reqwest. Without `request_timeout` no deadline is set.
    pub fn new_reqwest(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        request_timeout: Option<Duration>,
    ) -> Result<Self, ClientError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;
        Ok(Self::new_with_http(http, base_url, api_key))
    }

    pub fn new_with_http(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self::new_with_transport(reqwest_transport(http), base_url, api_key)
    }

    pub fn from_config(cfg: &Config) -> Result<Self, ConfigError> {
        let api_key = cfg.api_key.clone().ok_or(ConfigError::MissingApiKey)?;
        Self::new_reqwest(cfg.base_url.as_str(), api_key, cfg.request_timeout())
            .map_err(|e| ConfigError::Client(e.to_string()))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST `request` to its endpoint and return the provider's places verbatim.
    pub async fn submit(&self, request: &PlacesRequest) -> Result<Vec<Place>, ClientError> {
        let body = request
            .to_json()
            .map_err(|e| ClientError::Encode(e.to_string()))?;
        let call = HttpCall {
            url: url_for(&self.base_url, request.kind()),
            headers: vec![
                ("Content-Type".to_string(), "application/json".to_string()),
                (API_KEY_HEADER.to_string(), self.api_key.clone()),
                (FIELD_MASK_HEADER.to_string(), FIELD_MASK_ALL.to_string()),
            ],
            body,
        };
        debug!(kind = request.kind().as_str(), url = %call.url, "[places] dispatch");

        let reply = (self.transport)(call).await?;
        if !is_success(reply.code) {
            let message = parse_error_body(&reply.body).map(|s| s.message);
            warn!(status = reply.code, "[places] provider rejected request");
            return Err(ClientError::Status {
                status: reply.code,
                message,
            });
        }
        if reply.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        let parsed: PlacesResponse = serde_json::from_slice(&reply.body)
            .map_err(|e| ClientError::Decode(e.to_string()))?;
        debug!(count = parsed.places.len(), "[places] response");
        Ok(parsed.places)
    }
}

fn reqwest_transport(http: reqwest::Client) -> Arc<TransportFn> {
    Arc::new(move |call: HttpCall| {
        let http = http.clone();
        Box::pin(async move {
            let mut req = http.post(call.url.as_str()).body(call.body);
            for (name, value) in call.headers {
                req = req.header(name, value);
            }
            let resp = req
                .send()
                .await
                .map_err(|e| ClientError::Network(e.to_string()))?;
            let code = resp.status().as_u16();
            let body = resp
                .bytes()
                .await
                .map_err(|e| ClientError::Network(e.to_string()))?;
            Ok(HttpReply {
                code,
                body: body.to_vec(),
            })
        }) as TransportFuture
    })
}
