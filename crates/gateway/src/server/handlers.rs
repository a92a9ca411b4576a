//! Axum request handlers for all service endpoints.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use common::protocol::{
    CreateCheckoutRequest, CreateCheckoutResponse, EncryptRequest, EncryptResponse,
    ErrorResponse, HealthResponse, ProxyRequest, ProxyResponse,
};
use common::ServiceError;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::render;
use super::state::AppState;
use crate::upstream::UpstreamError;

/// `POST /api/encrypt` — seal a JSON object into a checkout token.
pub async fn encrypt(State(state): State<AppState>, Json(req): Json<EncryptRequest>) -> Response {
    if !req.payload.is_object() {
        return error_response(&ServiceError::BadRequest(
            "payload must be a JSON object".into(),
        ));
    }

    let key = match state.sealing_key(req.secret_key.as_deref()) {
        Ok(k) => k,
        Err(e) => {
            warn!(kind = e.kind(), "rejected caller-supplied secret key");
            return error_response(&invalid_secret_key());
        }
    };

    match envelope::seal(&req.payload, &key) {
        Ok(token) => {
            info!(
                key_fingerprint = %key.fingerprint(),
                token_len = token.len(),
                "payload sealed"
            );
            (StatusCode::OK, Json(EncryptResponse { payload: token })).into_response()
        }
        Err(e) => {
            warn!(kind = e.kind(), error = %e, "sealing failed");
            error_response(&ServiceError::Internal("failed to seal payload".into()))
        }
    }
}

/// `POST /api/proxy` — forward a sealed token to the payment API.
pub async fn proxy(State(state): State<AppState>, Json(req): Json<ProxyRequest>) -> Response {
    if req.payload.trim().is_empty() {
        return error_response(&ServiceError::BadRequest(
            "payload must be a non-empty token".into(),
        ));
    }

    let api_key = state.api_key(req.api_key);
    match state.checkout_api.create_checkout(req.payload, api_key).await {
        Ok(data) => (StatusCode::OK, Json(ProxyResponse { data })).into_response(),
        Err(e) => {
            log_upstream_failure(&e, "checkout creation failed");
            error_response(&failed_to_process())
        }
    }
}

/// `POST /api/checkouts` — validate, seal and forward a checkout in one call.
pub async fn create_checkout(
    State(state): State<AppState>,
    Json(req): Json<CreateCheckoutRequest>,
) -> Response {
    if let Err(msg) = req.payload.validate() {
        return error_response(&ServiceError::BadRequest(msg));
    }

    let key = match state.sealing_key(req.secret_key.as_deref()) {
        Ok(k) => k,
        Err(e) => {
            warn!(kind = e.kind(), "rejected caller-supplied secret key");
            return error_response(&invalid_secret_key());
        }
    };

    let token = match envelope::seal(&req.payload, &key) {
        Ok(t) => t,
        Err(e) => {
            warn!(kind = e.kind(), error = %e, "sealing failed");
            return error_response(&ServiceError::Internal("failed to seal payload".into()));
        }
    };

    let api_key = state.api_key(req.api_key);
    match state.checkout_api.create_checkout(token, api_key).await {
        Ok(data) => {
            let redirect_url = redirect_url(&data);
            if redirect_url.is_none() {
                warn!("transaction created but the response carries no redirect URL");
            }
            info!(products = req.payload.products.len(), "checkout created");
            (StatusCode::OK, Json(CreateCheckoutResponse { redirect_url, data })).into_response()
        }
        Err(e) => {
            log_upstream_failure(&e, "checkout creation failed");
            error_response(&failed_to_process())
        }
    }
}

/// Query string of `GET /checkout`.
#[derive(Debug, Deserialize)]
pub struct CheckoutQuery {
    /// The sealed token.
    pub payload: Option<String>,
}

/// `GET /checkout?payload=<token>` — open a checkout link and confirm it.
///
/// Any failure to open the token renders the same page; the error kind is
/// logged for operators. An undecodable query string (e.g. a repeated
/// `payload`) gets the invalid-format page rather than the extractor's text.
pub async fn checkout_page(
    State(state): State<AppState>,
    query: Result<Query<CheckoutQuery>, QueryRejection>,
) -> Response {
    let query = match query {
        Ok(Query(q)) => q,
        Err(e) => {
            warn!(error = %e, "checkout query rejected");
            return page(StatusCode::BAD_REQUEST, render::message_page(render::INVALID_FORMAT));
        }
    };

    let token = match query.payload.as_deref().map(str::trim) {
        // Form decoding turns an unescaped '+' into ' '; base64 never contains spaces.
        Some(t) if !t.is_empty() => t.replace(' ', "+"),
        _ => return page(StatusCode::BAD_REQUEST, render::message_page(render::INVALID_FORMAT)),
    };

    let payload: Value = match envelope::open(&token, &state.secret_key) {
        Ok(v) => v,
        Err(e) => {
            warn!(kind = e.kind(), token_len = token.len(), "checkout token rejected");
            return page(StatusCode::BAD_REQUEST, render::message_page(render::INVALID_LINK));
        }
    };

    let Some(transaction_id) = payload.get("transactionId").and_then(Value::as_str) else {
        warn!("opened checkout payload has no transactionId");
        return page(
            StatusCode::UNPROCESSABLE_ENTITY,
            render::message_page(render::MISSING_TRANSACTION),
        );
    };

    let api_key = state.api_key(None);
    match state
        .checkout_api
        .confirm_transaction(transaction_id.to_owned(), api_key)
        .await
    {
        Ok(_) => {
            info!("transaction confirmed");
            page(StatusCode::OK, render::success_page(&payload))
        }
        Err(e) => {
            log_upstream_failure(&e, "transaction confirmation failed");
            page(StatusCode::BAD_GATEWAY, render::message_page(render::CONFIRM_FAILED))
        }
    }
}

/// `GET /health` — liveness check.
pub async fn health() -> Response {
    let body = HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    };
    (StatusCode::OK, Json(body)).into_response()
}

/// Catch-all 404 handler.
pub async fn not_found() -> impl IntoResponse {
    let err = ErrorResponse::new("not_found", "the requested resource does not exist");
    (StatusCode::NOT_FOUND, Json(err))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn error_response(err: &ServiceError) -> Response {
    let status =
        StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorResponse::from(err))).into_response()
}

fn page(status: StatusCode, rendered: Result<String, askama::Error>) -> Response {
    match rendered {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            warn!(error = %e, "failed to render checkout page");
            error_response(&ServiceError::Internal("failed to render page".into()))
        }
    }
}

fn invalid_secret_key() -> ServiceError {
    ServiceError::BadRequest("secretKey must be exactly 64 hex characters".into())
}

fn failed_to_process() -> ServiceError {
    ServiceError::Upstream("failed to process request".into())
}

/// `data.redirectUrl` of a payment API response.
fn redirect_url(data: &Value) -> Option<String> {
    data.pointer("/data/redirectUrl")
        .and_then(Value::as_str)
        .map(str::to_owned)
}

fn log_upstream_failure(err: &UpstreamError, message: &str) {
    match err {
        UpstreamError::Status { status, body } => {
            warn!(status, body = %body, "{message}");
        }
        other => warn!(error = %other, "{message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum_test::TestServer;
    use common::{CheckoutPayload, Product};
    use envelope::SecretKey;
    use serde_json::json;

    use crate::server::router;
    use crate::upstream::MockCheckoutApi;

    const DEFAULT_API_KEY: &str = "default-api-key";

    fn zero_key() -> SecretKey {
        SecretKey::from_hex(&"00".repeat(32)).unwrap()
    }

    fn server(api: MockCheckoutApi) -> TestServer {
        let state = AppState::new(zero_key(), Arc::new(api), DEFAULT_API_KEY.into());
        TestServer::new(router::build(state)).unwrap()
    }

    fn sample_checkout() -> CheckoutPayload {
        CheckoutPayload {
            products: vec![Product {
                name: "Mi Cha".into(),
                image: "https://example.com/noodles.webp".into(),
                price: 200.0,
                product_id: "asjhda".into(),
                quantity: 1,
            }],
            currency: "KHR".into(),
        }
    }

    // -- /api/encrypt -------------------------------------------------------

    #[tokio::test]
    async fn encrypt_seals_with_configured_key() {
        let server = server(MockCheckoutApi::new());
        let payload = json!({"transactionId": "abc123", "amount": 100});
        let resp = server
            .post("/api/encrypt")
            .json(&json!({ "payload": payload }))
            .await;
        assert_eq!(resp.status_code(), StatusCode::OK);

        let body: EncryptResponse = resp.json();
        let opened: Value = envelope::open(&body.payload, &zero_key()).unwrap();
        assert_eq!(opened, payload);
    }

    #[tokio::test]
    async fn encrypt_uses_request_secret_key() {
        let server = server(MockCheckoutApi::new());
        let ff_hex = "ff".repeat(32);
        let resp = server
            .post("/api/encrypt")
            .json(&json!({ "payload": {"a": 1}, "secretKey": ff_hex }))
            .await;
        let body: EncryptResponse = resp.json();

        let ff_key = SecretKey::from_hex(&ff_hex).unwrap();
        assert!(envelope::open::<Value>(&body.payload, &ff_key).is_ok());
        assert!(matches!(
            envelope::open::<Value>(&body.payload, &zero_key()),
            Err(envelope::EnvelopeError::AuthenticationFailure)
        ));
    }

    #[tokio::test]
    async fn encrypt_rejects_bad_secret_key() {
        let server = server(MockCheckoutApi::new());
        let resp = server
            .post("/api/encrypt")
            .json(&json!({ "payload": {"a": 1}, "secretKey": "abcd" }))
            .await;
        assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
        let err: ErrorResponse = resp.json();
        assert_eq!(err.code, "bad_request");
    }

    #[tokio::test]
    async fn encrypt_rejects_non_object_payload() {
        let server = server(MockCheckoutApi::new());
        let resp = server
            .post("/api/encrypt")
            .json(&json!({ "payload": [1, 2, 3] }))
            .await;
        assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
    }

    // -- /api/proxy ---------------------------------------------------------

    #[tokio::test]
    async fn proxy_forwards_token_with_default_api_key() {
        let mut api = MockCheckoutApi::new();
        api.expect_create_checkout()
            .withf(|token, api_key| token == "dG9rZW4=" && api_key == DEFAULT_API_KEY)
            .times(1)
            .returning(|_, _| Ok(json!({"data": {"redirectUrl": "https://pay.example.com/c/1"}})));

        let resp = server(api)
            .post("/api/proxy")
            .json(&json!({ "payload": "dG9rZW4=" }))
            .await;
        assert_eq!(resp.status_code(), StatusCode::OK);
        let body: ProxyResponse = resp.json();
        assert_eq!(body.data["data"]["redirectUrl"], "https://pay.example.com/c/1");
    }

    #[tokio::test]
    async fn proxy_prefers_request_api_key() {
        let mut api = MockCheckoutApi::new();
        api.expect_create_checkout()
            .withf(|_, api_key| api_key == "merchant-key")
            .times(1)
            .returning(|_, _| Ok(json!({})));

        let resp = server(api)
            .post("/api/proxy")
            .json(&json!({ "payload": "dG9rZW4=", "apiKey": "merchant-key" }))
            .await;
        assert_eq!(resp.status_code(), StatusCode::OK);
    }

    #[tokio::test]
    async fn proxy_upstream_failure_is_generic_500() {
        let mut api = MockCheckoutApi::new();
        api.expect_create_checkout().times(1).returning(|_, _| {
            Err(UpstreamError::Status {
                status: 422,
                body: json!({"error": {"issues": ["amount"]}}),
            })
        });

        let resp = server(api)
            .post("/api/proxy")
            .json(&json!({ "payload": "dG9rZW4=" }))
            .await;
        assert_eq!(resp.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        let err: ErrorResponse = resp.json();
        assert_eq!(err.code, "upstream_error");
        assert!(!err.message.contains("issues"));
    }

    #[tokio::test]
    async fn proxy_rejects_empty_token() {
        let resp = server(MockCheckoutApi::new())
            .post("/api/proxy")
            .json(&json!({ "payload": "   " }))
            .await;
        assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
    }

    // -- /api/checkouts -----------------------------------------------------

    #[tokio::test]
    async fn create_checkout_seals_and_returns_redirect_url() {
        let mut api = MockCheckoutApi::new();
        api.expect_create_checkout()
            .withf(|token, _| {
                envelope::open::<CheckoutPayload>(token, &zero_key())
                    .map(|p| p == sample_checkout())
                    .unwrap_or(false)
            })
            .times(1)
            .returning(|_, _| Ok(json!({"data": {"redirectUrl": "https://pay.example.com/c/9"}})));

        let resp = server(api)
            .post("/api/checkouts")
            .json(&json!({ "payload": sample_checkout() }))
            .await;
        assert_eq!(resp.status_code(), StatusCode::OK);
        let body: CreateCheckoutResponse = resp.json();
        assert_eq!(body.redirect_url.as_deref(), Some("https://pay.example.com/c/9"));
    }

    #[tokio::test]
    async fn create_checkout_without_redirect_url_still_succeeds() {
        let mut api = MockCheckoutApi::new();
        api.expect_create_checkout()
            .times(1)
            .returning(|_, _| Ok(json!({"data": {}})));

        let resp = server(api)
            .post("/api/checkouts")
            .json(&json!({ "payload": sample_checkout() }))
            .await;
        assert_eq!(resp.status_code(), StatusCode::OK);
        let body: CreateCheckoutResponse = resp.json();
        assert!(body.redirect_url.is_none());
    }

    /// Collects formatted log output in memory.
    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for CapturedLogs {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[tokio::test]
    async fn create_checkout_logs_no_payload_values() {
        let logs = CapturedLogs::default();
        let subscriber = tracing_subscriber::fmt()
            .json()
            .with_writer(logs.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let mut api = MockCheckoutApi::new();
        api.expect_create_checkout()
            .times(1)
            .returning(|_, _| Ok(json!({"data": {"redirectUrl": "https://pay.example.com/c/3"}})));

        let mut checkout = sample_checkout();
        checkout.currency = "CURRENCYMARKER".into();
        checkout.products[0].name = "NAMEMARKER".into();
        let resp = server(api)
            .post("/api/checkouts")
            .json(&json!({ "payload": checkout }))
            .await;
        assert_eq!(resp.status_code(), StatusCode::OK);

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("checkout created"));
        assert!(!output.contains("CURRENCYMARKER"));
        assert!(!output.contains("NAMEMARKER"));
    }

    #[tokio::test]
    async fn create_checkout_rejects_empty_cart() {
        let mut checkout = sample_checkout();
        checkout.products.clear();
        let resp = server(MockCheckoutApi::new())
            .post("/api/checkouts")
            .json(&json!({ "payload": checkout }))
            .await;
        assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
    }

    // -- /checkout ----------------------------------------------------------

    #[tokio::test]
    async fn checkout_page_requires_payload() {
        let server = server(MockCheckoutApi::new());
        let resp = server.get("/checkout").await;
        assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
        assert!(resp.text().contains(render::INVALID_FORMAT));

        let resp = server.get("/checkout").add_query_param("payload", "  ").await;
        assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn checkout_page_repeated_payload_renders_invalid_format() {
        let resp = server(MockCheckoutApi::new())
            .get("/checkout")
            .add_query_param("payload", "AAAA")
            .add_query_param("payload", "BBBB")
            .await;
        assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
        let content_type = resp
            .headers()
            .get(axum::http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        assert!(content_type.starts_with("text/html"), "got {content_type}");
        assert!(resp.text().contains(render::INVALID_FORMAT));
    }

    #[tokio::test]
    async fn checkout_page_confirms_and_renders_transaction() {
        let mut api = MockCheckoutApi::new();
        api.expect_confirm_transaction()
            .withf(|id, api_key| id == "abc123" && api_key == DEFAULT_API_KEY)
            .times(1)
            .returning(|_, _| Ok(json!({"status": "confirmed"})));

        let token = envelope::seal(&json!({"transactionId": "abc123", "amount": 100}), &zero_key())
            .unwrap();
        let resp = server(api)
            .get("/checkout")
            .add_query_param("payload", &token)
            .await;
        assert_eq!(resp.status_code(), StatusCode::OK);
        let html = resp.text();
        assert!(html.contains("Success"));
        assert!(html.contains("abc123"));
    }

    #[tokio::test]
    async fn checkout_page_restores_plus_signs() {
        let payload = json!({"transactionId": "plus-test"});
        let token = (0..200)
            .map(|_| envelope::seal(&payload, &zero_key()).unwrap())
            .find(|t| t.contains('+'))
            .unwrap();

        let mut api = MockCheckoutApi::new();
        api.expect_confirm_transaction()
            .times(1)
            .returning(|_, _| Ok(json!({})));

        let resp = server(api)
            .get("/checkout")
            .add_query_param("payload", token.replace('+', " "))
            .await;
        assert_eq!(resp.status_code(), StatusCode::OK);
    }

    #[tokio::test]
    async fn checkout_page_treats_every_open_failure_alike() {
        let other_key = SecretKey::from_hex(&"ff".repeat(32)).unwrap();
        let foreign = envelope::seal(&json!({"transactionId": "abc123"}), &other_key).unwrap();
        let server = server(MockCheckoutApi::new());

        for token in [foreign.as_str(), "not-base64!", "AAAA"] {
            let resp = server
                .get("/checkout")
                .add_query_param("payload", token)
                .await;
            assert_eq!(resp.status_code(), StatusCode::BAD_REQUEST);
            let html = resp.text();
            assert!(html.contains(render::INVALID_LINK));
            assert!(!html.contains("abc123"));
        }
    }

    #[tokio::test]
    async fn checkout_page_requires_transaction_id() {
        let token = envelope::seal(&json!({"amount": 100}), &zero_key()).unwrap();
        let resp = server(MockCheckoutApi::new())
            .get("/checkout")
            .add_query_param("payload", &token)
            .await;
        assert_eq!(resp.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(resp.text().contains(render::MISSING_TRANSACTION));
    }

    #[tokio::test]
    async fn checkout_page_reports_confirmation_failure() {
        let mut api = MockCheckoutApi::new();
        api.expect_confirm_transaction()
            .times(1)
            .returning(|_, _| Err(UpstreamError::Transport("connection refused".into())));

        let token = envelope::seal(&json!({"transactionId": "abc123"}), &zero_key()).unwrap();
        let resp = server(api)
            .get("/checkout")
            .add_query_param("payload", &token)
            .await;
        assert_eq!(resp.status_code(), StatusCode::BAD_GATEWAY);
        assert!(resp.text().contains(render::CONFIRM_FAILED));
    }

    #[tokio::test]
    async fn checkout_page_escapes_payload_values() {
        let mut api = MockCheckoutApi::new();
        api.expect_confirm_transaction()
            .times(1)
            .returning(|_, _| Ok(json!({})));

        let token = envelope::seal(
            &json!({"transactionId": "t1", "note": "<script>alert(1)</script>"}),
            &zero_key(),
        )
        .unwrap();
        let html = server(api)
            .get("/checkout")
            .add_query_param("payload", &token)
            .await
            .text();
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }

    // -- helpers ------------------------------------------------------------

    #[test]
    fn redirect_url_reads_nested_field() {
        let data = json!({"data": {"redirectUrl": "https://pay.example.com/c/2"}});
        assert_eq!(redirect_url(&data).as_deref(), Some("https://pay.example.com/c/2"));
        assert!(redirect_url(&json!({"redirectUrl": "top-level"})).is_none());
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let resp = server(MockCheckoutApi::new()).get("/health").await;
        assert_eq!(resp.status_code(), StatusCode::OK);
        let body: HealthResponse = resp.json();
        assert_eq!(body.status, "ok");
    }
}
