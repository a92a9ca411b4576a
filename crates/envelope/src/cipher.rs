//! AES-256-GCM sealing and opening of whole payloads.
//!
//! A fresh 96-bit nonce is drawn from the OS CSPRNG on every seal. Nonce reuse
//! under one key breaks both confidentiality and authentication in GCM, so a
//! nonce must never be supplied by the caller.

use aes_gcm::{
    aead::{AeadCore, AeadInPlace, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce, Tag,
};
use serde::{de::DeserializeOwned, Serialize};
use zeroize::Zeroizing;

use crate::error::EnvelopeError;
use crate::key::SecretKey;
use crate::token::{self, TokenParts};

/// No associated data is bound into the tag.
const AAD: &[u8] = b"";

/// Serialise `payload` to JSON and seal it into a token string.
///
/// Two calls with the same payload and key return different tokens.
///
/// # Errors
///
/// Returns [`EnvelopeError::Serialization`] if the payload cannot be written as
/// JSON, or [`EnvelopeError::Encryption`] if the AEAD rejects the plaintext.
pub fn seal<T: Serialize + ?Sized>(payload: &T, key: &SecretKey) -> Result<String, EnvelopeError> {
    let plaintext =
        Zeroizing::new(serde_json::to_vec(payload).map_err(EnvelopeError::Serialization)?);
    seal_bytes(&plaintext, key)
}

/// Open a token and deserialise the authenticated JSON into `T`.
///
/// # Errors
///
/// - [`EnvelopeError::Malformed`] for bad base64 or an undersized token.
/// - [`EnvelopeError::AuthenticationFailure`] if the tag does not verify.
/// - [`EnvelopeError::Deserialization`] if the plaintext is not valid JSON for `T`.
pub fn open<T: DeserializeOwned>(token: &str, key: &SecretKey) -> Result<T, EnvelopeError> {
    let plaintext = Zeroizing::new(open_bytes(token, key)?);
    serde_json::from_slice(&plaintext).map_err(EnvelopeError::Deserialization)
}

/// Seal raw bytes into a token string.
///
/// # Errors
///
/// Returns [`EnvelopeError::Encryption`] if the plaintext exceeds the GCM limit.
pub fn seal_bytes(plaintext: &[u8], key: &SecretKey) -> Result<String, EnvelopeError> {
    let cipher = build_cipher(key);
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let mut buffer = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(&nonce, AAD, &mut buffer)
        .map_err(|_| EnvelopeError::Encryption)?;

    Ok(token::encode(&nonce, &buffer, &tag))
}

/// Open a token string back into the raw plaintext bytes.
///
/// Nothing is returned unless the tag verifies.
///
/// # Errors
///
/// Returns [`EnvelopeError::Malformed`] before touching the cipher if the token
/// is not base64 or is shorter than [`MIN_TOKEN_LEN`](crate::MIN_TOKEN_LEN),
/// and [`EnvelopeError::AuthenticationFailure`] if verification fails.
pub fn open_bytes(token: &str, key: &SecretKey) -> Result<Vec<u8>, EnvelopeError> {
    let raw = token::decode(token)?;
    let parts = TokenParts::parse(&raw)?;

    let cipher = build_cipher(key);
    let mut buffer = parts.ciphertext.to_vec();
    cipher
        .decrypt_in_place_detached(
            Nonce::from_slice(parts.nonce),
            AAD,
            &mut buffer,
            Tag::from_slice(parts.tag),
        )
        .map_err(|_| EnvelopeError::AuthenticationFailure)?;

    Ok(buffer)
}

/// [`seal`] with the key given in its 64-character hex form.
///
/// # Errors
///
/// Returns [`EnvelopeError::KeyFormat`] before any cryptographic work if the
/// key does not decode to 32 bytes; otherwise as [`seal`].
pub fn seal_with_hex_key<T: Serialize + ?Sized>(
    payload: &T,
    hex_key: &str,
) -> Result<String, EnvelopeError> {
    let key = SecretKey::from_hex(hex_key)?;
    seal(payload, &key)
}

/// [`open`] with the key given in its 64-character hex form.
///
/// # Errors
///
/// Returns [`EnvelopeError::KeyFormat`] before the token is inspected if the
/// key does not decode to 32 bytes; otherwise as [`open`].
pub fn open_with_hex_key<T: DeserializeOwned>(
    token: &str,
    hex_key: &str,
) -> Result<T, EnvelopeError> {
    let key = SecretKey::from_hex(hex_key)?;
    open(token, &key)
}

fn build_cipher(key: &SecretKey) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()))
}
