//! Tracing setup: structured JSON logs, plus OTLP span export when configured.
//!
//! # Telemetry invariants
//!
//! - **No key material, tokens, or decrypted payload values** may appear in any
//!   span attribute or log field. Log error kinds, key fingerprints, status
//!   codes and lengths instead.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`), overridden by
//!   `RUST_LOG` when set.

pub mod init;

pub use init::init_telemetry;
