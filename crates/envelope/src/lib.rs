//! Symmetric authenticated-encryption envelope for checkout payloads.
//!
//! A payload is serialised to JSON, sealed with AES-256-GCM under a caller
//! supplied 32-byte key and packed into a single base64 token. Opening reverses
//! the process and fails closed on any integrity violation.
//!
//! # Token format
//!
//! ```text
//! token_bytes  = nonce(12) || ciphertext(len = plaintext_len) || tag(16)
//! token_string = base64_standard_with_padding(token_bytes)
//! ```
//!
//! Both operations are pure functions of their inputs apart from drawing the
//! nonce from the OS CSPRNG. They hold no shared state and may be called from
//! any number of threads concurrently.

pub mod cipher;
pub mod error;
pub mod key;
pub mod token;

pub use cipher::{open, open_bytes, open_with_hex_key, seal, seal_bytes, seal_with_hex_key};
pub use error::EnvelopeError;
pub use key::{SecretKey, KEY_LEN};
pub use token::{encoded_len, TokenParts, MIN_TOKEN_LEN, NONCE_LEN, TAG_LEN};
