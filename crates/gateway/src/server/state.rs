//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use envelope::{EnvelopeError, SecretKey};

use crate::upstream::CheckoutApi;

/// Application state shared across all request handlers.
///
/// All fields are `Arc`-wrapped so that Axum can clone the state for each
/// request without copying key material or the client pool.
#[derive(Clone)]
pub struct AppState {
    /// Key used to open checkout links and to seal when callers supply none.
    pub secret_key: Arc<SecretKey>,
    /// Downstream payment API.
    pub checkout_api: Arc<dyn CheckoutApi>,
    /// `x-api-key` used when a request does not carry its own.
    pub default_api_key: Arc<String>,
}

impl AppState {
    /// Create a new [`AppState`].
    pub fn new(
        secret_key: SecretKey,
        checkout_api: Arc<dyn CheckoutApi>,
        default_api_key: String,
    ) -> Self {
        Self {
            secret_key: Arc::new(secret_key),
            checkout_api,
            default_api_key: Arc::new(default_api_key),
        }
    }

    /// The key to seal with: the caller's hex key when given, else the configured one.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::KeyFormat`] if a caller-supplied key is invalid.
    pub fn sealing_key(&self, requested: Option<&str>) -> Result<Arc<SecretKey>, EnvelopeError> {
        match requested.filter(|k| !k.trim().is_empty()) {
            Some(hex_key) => SecretKey::from_hex(hex_key).map(Arc::new),
            None => Ok(Arc::clone(&self.secret_key)),
        }
    }

    /// The downstream API key: the caller's when non-empty, else the configured one.
    pub fn api_key(&self, requested: Option<String>) -> String {
        requested
            .filter(|k| !k.trim().is_empty())
            .unwrap_or_else(|| self.default_api_key.as_str().to_owned())
    }
}
