//! HTML for the customer-facing checkout page.
//!
//! Every failure to open a link renders the same [`INVALID_LINK`] message; the
//! specific reason is only ever logged.

use askama::Template;
use serde_json::Value;

/// Shown for a missing, empty, or repeated `payload` query parameter.
pub const INVALID_FORMAT: &str = "Invalid payload format - expected non-empty string";

/// Shown for any token that cannot be opened.
pub const INVALID_LINK: &str = "This checkout link is invalid or has expired.";

/// Shown when an authentic payload carries no transaction id.
pub const MISSING_TRANSACTION: &str = "Transaction ID not found in payload";

/// Shown when the payment API does not confirm the transaction.
pub const CONFIRM_FAILED: &str = "We could not confirm this transaction. Please try again later.";

// ---------------------------------------------------------------------------
// Askama template structs
// ---------------------------------------------------------------------------

#[derive(Template)]
#[template(path = "message.html", escape = "html")]
struct MessageTemplate<'a> {
    message: &'a str,
}

#[derive(Template)]
#[template(path = "success.html", escape = "html")]
struct SuccessTemplate {
    payload_json: String,
}

/// Page with a single centred message.
///
/// # Errors
///
/// Returns the template error if rendering fails.
pub fn message_page(message: &str) -> Result<String, askama::Error> {
    MessageTemplate { message }.render()
}

/// Confirmation page showing the decoded transaction, pretty-printed.
///
/// # Errors
///
/// Returns the template error if rendering fails.
pub fn success_page(payload: &Value) -> Result<String, askama::Error> {
    let payload_json = serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());
    SuccessTemplate { payload_json }.render()
}
