//! [`SecretKey`]: the 32-byte AES-256 key shared by sealer and opener.
//!
//! Callers normally hold the key as a 64-character hex string (environment
//! variable, settings form). No derivation is applied: the decoded bytes are
//! the cipher key.

use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::EnvelopeError;

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Number of digest bytes shown by [`SecretKey::fingerprint`].
const FINGERPRINT_LEN: usize = 8;

/// A 256-bit symmetric key. Wiped from memory when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey([u8; KEY_LEN]);

impl SecretKey {
    /// Decode a key from exactly 64 hex characters (either case).
    ///
    /// Leading and trailing whitespace is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::KeyFormat`] if the input is not 64 hex digits.
    pub fn from_hex(hex_key: &str) -> Result<Self, EnvelopeError> {
        let hex_key = hex_key.trim();
        if hex_key.len() != KEY_LEN * 2 {
            return Err(EnvelopeError::KeyFormat(format!(
                "expected {} hex characters, got {}",
                KEY_LEN * 2,
                hex_key.len()
            )));
        }
        let mut key = SecretKey([0u8; KEY_LEN]);
        hex::decode_to_slice(hex_key, &mut key.0)
            .map_err(|e| EnvelopeError::KeyFormat(format!("invalid hex: {e}")))?;
        Ok(key)
    }

    /// Build a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::KeyFormat`] unless `bytes` is exactly [`KEY_LEN`] long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EnvelopeError> {
        if bytes.len() != KEY_LEN {
            return Err(EnvelopeError::wrong_key_length(bytes.len()));
        }
        let mut key = SecretKey([0u8; KEY_LEN]);
        key.0.copy_from_slice(bytes);
        Ok(key)
    }

    /// Raw key bytes, for handing to the cipher.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Short non-secret identifier: hex of the first 8 bytes of SHA-256(key).
    ///
    /// Safe to log; lets operators confirm two deployments share a key.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0);
        hex::encode(&digest[..FINGERPRINT_LEN])
    }
}

impl FromStr for SecretKey {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SecretKey::from_hex(s)
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material.
        f.write_str("SecretKey([REDACTED])")
    }
}
