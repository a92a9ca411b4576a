//! [`HttpCheckoutApi`]: pooled HTTPS client for the payment API.

use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use axum::body::Body;
use bytes::Bytes;
use hyper::{header, Method, Request, StatusCode};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use serde_json::{json, Value};
use tracing::debug;

use super::{validate_transaction_id, CheckoutApi, UpstreamError};

/// Header carrying the merchant API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Upper bound on a buffered response body.
const MAX_RESPONSE_BYTES: usize = 1024 * 1024;

/// Payment API client over `hyper-util`'s connection pool with rustls.
///
/// Cheap to clone; clones share the pool.
#[derive(Clone)]
pub struct HttpCheckoutApi {
    client: Client<HttpsConnector<HttpConnector>, Body>,
    base_url: String,
    timeout: Duration,
}

impl HttpCheckoutApi {
    /// Create a client for the API rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the rustls client configuration cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let https = hyper_rustls::HttpsConnectorBuilder::new()
            .with_provider_and_webpki_roots(rustls::crypto::ring::default_provider())
            .context("failed to configure TLS for the payment API client")?
            .https_or_http()
            .enable_http1()
            .build();
        let client = Client::builder(TokioExecutor::new()).build(https);

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
            timeout,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post_json(&self, url: String, body: &Value, api_key: &str) -> Result<Value, UpstreamError> {
        let bytes =
            serde_json::to_vec(body).map_err(|e| UpstreamError::InvalidRequest(e.to_string()))?;
        let req = Request::builder()
            .method(Method::POST)
            .uri(&url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
            .header(API_KEY_HEADER, api_key)
            .body(Body::from(bytes))
            .map_err(|e| UpstreamError::InvalidRequest(e.to_string()))?;

        let exchange = async {
            let resp = self
                .client
                .request(req)
                .await
                .map_err(|e| UpstreamError::Transport(e.to_string()))?;
            let status = resp.status();
            let body: Bytes = axum::body::to_bytes(Body::new(resp.into_body()), MAX_RESPONSE_BYTES)
                .await
                .map_err(|e| UpstreamError::Transport(e.to_string()))?;
            Ok::<_, UpstreamError>((status, body))
        };

        let (status, body) = tokio::time::timeout(self.timeout, exchange)
            .await
            .map_err(|_| UpstreamError::Timeout(self.timeout))??;

        debug!(status = status.as_u16(), bytes = body.len(), "payment API responded");
        interpret_response(status, &body)
    }
}

#[async_trait]
impl CheckoutApi for HttpCheckoutApi {
    async fn create_checkout(&self, token: String, api_key: String) -> Result<Value, UpstreamError> {
        self.post_json(self.endpoint("checkout"), &json!({ "payload": token }), &api_key)
            .await
    }

    async fn confirm_transaction(
        &self,
        transaction_id: String,
        api_key: String,
    ) -> Result<Value, UpstreamError> {
        validate_transaction_id(&transaction_id)?;
        let url = self.endpoint(&format!("checkout/{transaction_id}/confirm"));
        self.post_json(url, &json!({}), &api_key).await
    }
}

/// Map a buffered response to the parsed JSON body or a typed error.
///
/// An empty 2xx body is reported as `null`.
fn interpret_response(status: StatusCode, body: &[u8]) -> Result<Value, UpstreamError> {
    let parsed = if body.is_empty() {
        Ok(Value::Null)
    } else {
        serde_json::from_slice::<Value>(body)
    };

    if !status.is_success() {
        let body = parsed
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()));
        return Err(UpstreamError::Status {
            status: status.as_u16(),
            body,
        });
    }

    parsed.map_err(|e| UpstreamError::InvalidResponse(e.to_string()))
}
