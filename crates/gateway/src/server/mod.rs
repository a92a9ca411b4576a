//! Axum HTTP server, routing, and middleware.
//!
//! # Responsibilities
//! - Define the Axum router with all routes and shared middleware.
//! - Inject shared application state (`AppState`) into handlers.
//! - Render the customer-facing checkout page.

pub mod handlers;
pub mod middleware;
pub mod render;
pub mod router;
pub mod state;
