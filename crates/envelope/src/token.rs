//! Byte layout of a token: `nonce || ciphertext || tag`, base64 encoded.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::EnvelopeError;

/// Byte length of an AES-GCM nonce (12 bytes = 96 bits).
pub const NONCE_LEN: usize = 12;

/// Byte length of the AES-GCM authentication tag (16 bytes = 128 bits).
pub const TAG_LEN: usize = 16;

/// Smallest structurally valid decoded token: nonce and tag, empty ciphertext.
pub const MIN_TOKEN_LEN: usize = NONCE_LEN + TAG_LEN;

/// Borrowed view of the three regions of a decoded token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenParts<'a> {
    /// First [`NONCE_LEN`] bytes.
    pub nonce: &'a [u8; NONCE_LEN],
    /// Everything between the nonce and the tag. May be empty.
    pub ciphertext: &'a [u8],
    /// Last [`TAG_LEN`] bytes.
    pub tag: &'a [u8; TAG_LEN],
}

impl<'a> TokenParts<'a> {
    /// Split decoded token bytes into nonce, ciphertext and tag.
    ///
    /// A buffer of exactly [`MIN_TOKEN_LEN`] bytes is accepted with an empty
    /// ciphertext; whether it authenticates is left to the cipher.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Malformed`] if `bytes` is shorter than
    /// [`MIN_TOKEN_LEN`].
    pub fn parse(bytes: &'a [u8]) -> Result<Self, EnvelopeError> {
        if bytes.len() < MIN_TOKEN_LEN {
            return Err(EnvelopeError::too_short(bytes.len()));
        }
        let (nonce, rest) = bytes
            .split_first_chunk::<NONCE_LEN>()
            .ok_or_else(|| EnvelopeError::too_short(bytes.len()))?;
        let (ciphertext, tag) = rest
            .split_last_chunk::<TAG_LEN>()
            .ok_or_else(|| EnvelopeError::too_short(bytes.len()))?;
        Ok(Self {
            nonce,
            ciphertext,
            tag,
        })
    }
}

/// Concatenate the regions and base64-encode them (standard alphabet, padded).
pub(crate) fn encode(nonce: &[u8], ciphertext: &[u8], tag: &[u8]) -> String {
    let mut buf = Vec::with_capacity(nonce.len() + ciphertext.len() + tag.len());
    buf.extend_from_slice(nonce);
    buf.extend_from_slice(ciphertext);
    buf.extend_from_slice(tag);
    STANDARD.encode(buf)
}

/// Decode a token string to raw bytes without interpreting the layout.
pub(crate) fn decode(token: &str) -> Result<Vec<u8>, EnvelopeError> {
    STANDARD
        .decode(token)
        .map_err(|e| EnvelopeError::Malformed(format!("invalid base64: {e}")))
}

/// Length of the token string produced for a plaintext of `plaintext_len` bytes.
pub fn encoded_len(plaintext_len: usize) -> usize {
    (MIN_TOKEN_LEN + plaintext_len).div_ceil(3) * 4
}
