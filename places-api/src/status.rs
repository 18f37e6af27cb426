use serde::Deserialize;
use thiserror::Error;

/// `{ "error": { "code": 400, "message": "...", "status": "INVALID_ARGUMENT" } }`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ProviderStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Error)]
#[error("{message}")]
pub struct ProviderStatus {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

/// Pull the provider's error description out of a failed response body, if it has one.
pub fn parse_error_body(body: &[u8]) -> Option<ProviderStatus> {
    let envelope: ErrorEnvelope = serde_json::from_slice(body).ok()?;
    if envelope.error.message.trim().is_empty() {
        return None;
    }
    Some(envelope.error)
}

pub fn is_success(code: u16) -> bool {
    (200..300).contains(&code)
}
