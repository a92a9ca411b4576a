//! Failure kinds produced by the envelope.

use thiserror::Error;

use crate::key::KEY_LEN;
use crate::token::MIN_TOKEN_LEN;

/// Errors returned by [`seal`](crate::seal) and [`open`](crate::open).
///
/// Every variant is terminal for the call that produced it. The envelope never
/// hands back ciphertext, unauthenticated plaintext, or a partial parse.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The key is not exactly [`KEY_LEN`] bytes, or its hex form is invalid.
    #[error("invalid key: {0}")]
    KeyFormat(String),

    /// The token is not valid base64 or is shorter than [`MIN_TOKEN_LEN`] bytes.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// The authentication tag did not verify: tampering, a different key, or
    /// corruption in transit.
    #[error("token failed authentication")]
    AuthenticationFailure,

    /// The payload could not be serialised before sealing.
    #[error("payload serialisation failed: {0}")]
    Serialization(#[source] serde_json::Error),

    /// The AEAD refused to encrypt the plaintext (GCM length limit exceeded).
    #[error("aead encryption failed")]
    Encryption,

    /// The authenticated plaintext is not valid JSON for the requested type.
    #[error("payload deserialisation failed: {0}")]
    Deserialization(#[source] serde_json::Error),
}

impl EnvelopeError {
    /// Stable snake_case label for structured log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            EnvelopeError::KeyFormat(_) => "key_format",
            EnvelopeError::Malformed(_) => "malformed",
            EnvelopeError::AuthenticationFailure => "authentication_failure",
            EnvelopeError::Serialization(_) => "serialization_failure",
            EnvelopeError::Encryption => "encryption_failure",
            EnvelopeError::Deserialization(_) => "deserialization_failure",
        }
    }

    pub(crate) fn wrong_key_length(len: usize) -> Self {
        EnvelopeError::KeyFormat(format!("expected {KEY_LEN} bytes, got {len}"))
    }

    pub(crate) fn too_short(len: usize) -> Self {
        EnvelopeError::Malformed(format!(
            "decoded token is {len} bytes, need at least {MIN_TOKEN_LEN}"
        ))
    }
}
