//! Request and response types exchanged over the gateway's HTTP API.
//!
//! JSON field names are camelCase to match the browser client and the
//! downstream payment API.

use serde::{Deserialize, Serialize};

use crate::checkout::CheckoutPayload;

// ---------------------------------------------------------------------------
// Encrypt endpoint
// ---------------------------------------------------------------------------

/// Request body for `POST /api/encrypt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncryptRequest {
    /// Arbitrary JSON object to seal.
    pub payload: serde_json::Value,
    /// 64-character hex key; the configured key is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
}

/// Successful response body for `POST /api/encrypt`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptResponse {
    /// The sealed token.
    pub payload: String,
}

// ---------------------------------------------------------------------------
// Proxy endpoint
// ---------------------------------------------------------------------------

/// Request body for `POST /api/proxy`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyRequest {
    /// A token produced by the sealer.
    pub payload: String,
    /// Downstream API key; the configured key is used when absent or empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Successful response body for `POST /api/proxy`: the downstream JSON, as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyResponse {
    /// Body returned by the payment API.
    pub data: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Create-checkout endpoint
// ---------------------------------------------------------------------------

/// Request body for `POST /api/checkouts`: seal and forward in one call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutRequest {
    /// The checkout to seal.
    pub payload: CheckoutPayload,
    /// Overrides the configured secret key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    /// Overrides the configured downstream API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Response body for `POST /api/checkouts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCheckoutResponse {
    /// Hosted checkout URL, when the payment API returned one.
    pub redirect_url: Option<String>,
    /// Full body returned by the payment API.
    pub data: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Error response
// ---------------------------------------------------------------------------

/// Standard error response body returned on any non-2xx status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short machine-readable error code (e.g. `"bad_request"`).
    pub code: String,
    /// Human-readable description safe to expose to callers.
    pub message: String,
}

impl ErrorResponse {
    /// Construct an [`ErrorResponse`] from a code and message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

impl From<&crate::ServiceError> for ErrorResponse {
    fn from(err: &crate::ServiceError) -> Self {
        Self::new(err.code(), err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall service status: always `"ok"` once the server is accepting requests.
    pub status: String,
    /// Crate version of the running gateway.
    pub version: String,
}
