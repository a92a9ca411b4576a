//! Client side of the downstream payment API.
//!
//! The gateway only ever relays tokens and transaction ids; it never sends
//! decrypted payloads downstream.
//!
//! # Endpoints used
//!
//! - `POST {API_URL}/checkout` with body `{"payload": <token>}`
//! - `POST {API_URL}/checkout/{transactionId}/confirm`
//!
//! Both carry the merchant key in the `x-api-key` header.

pub mod client;

pub use client::HttpCheckoutApi;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors produced when talking to the payment API.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The request could not be built (bad header value, unusable transaction id).
    #[error("invalid upstream request: {0}")]
    InvalidRequest(String),

    /// Connection, TLS, or protocol failure.
    #[error("upstream transport error: {0}")]
    Transport(String),

    /// No complete response within the configured timeout.
    #[error("upstream call timed out after {0:?}")]
    Timeout(Duration),

    /// The API answered with a non-2xx status.
    #[error("upstream returned status {status}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, parsed as JSON when possible.
        body: Value,
    },

    /// A 2xx response whose body is not JSON.
    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),
}

/// Operations the gateway needs from the payment API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CheckoutApi: Send + Sync {
    /// Register a sealed checkout token; returns the API's JSON response.
    async fn create_checkout(&self, token: String, api_key: String) -> Result<Value, UpstreamError>;

    /// Confirm a transaction after the customer opened its checkout link.
    async fn confirm_transaction(
        &self,
        transaction_id: String,
        api_key: String,
    ) -> Result<Value, UpstreamError>;
}

/// Reject transaction ids that would change the shape of the confirm URL.
///
/// Only RFC 3986 unreserved characters are allowed, and the dot segments
/// `.` and `..` are refused.
///
/// # Errors
///
/// Returns [`UpstreamError::InvalidRequest`] for an unusable id.
pub fn validate_transaction_id(id: &str) -> Result<(), UpstreamError> {
    let unreserved = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '~');
    if id.is_empty() || id == "." || id == ".." || !id.chars().all(unreserved) {
        return Err(UpstreamError::InvalidRequest(
            "transaction id contains unsupported characters".into(),
        ));
    }
    Ok(())
}
