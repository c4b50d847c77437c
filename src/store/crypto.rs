//! Cryptographic operations for the encrypted connection blob
//!
//! Blob layout: `nonce (24 bytes) || ciphertext || tag (16 bytes)`.
//! XChaCha20-Poly1305 with a random nonce per save; there is no header
//! or version field, the AEAD tag is the only integrity check.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};
use rand::RngCore;

use super::error::StoreError;
use crate::keys::SecretKey;

/// Lengths of fixed-size fields
pub const NONCE_LEN: usize = 24;
pub const TAG_LEN: usize = 16;

/// Encrypt `plaintext` into a self-contained blob
pub fn seal(key: &SecretKey, plaintext: &[u8]) -> Result<Vec<u8>, StoreError> {
    let cipher =
        XChaCha20Poly1305::new_from_slice(key.as_bytes()).map_err(|_| StoreError::Encryption)?;

    let mut nonce = [0u8; NONCE_LEN];
    rand::rngs::OsRng.fill_bytes(&mut nonce);

    let ciphertext = cipher
        .encrypt(XNonce::from_slice(&nonce), plaintext)
        .map_err(|_| StoreError::Encryption)?;

    let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

/// Decrypt and authenticate a blob produced by [`seal`]
///
/// Returns `Decryption` if the key is wrong or the data is truncated or tampered
pub fn open(key: &SecretKey, blob: &[u8]) -> Result<Vec<u8>, StoreError> {
    if blob.len() < NONCE_LEN + TAG_LEN {
        return Err(StoreError::Decryption);
    }

    let cipher =
        XChaCha20Poly1305::new_from_slice(key.as_bytes()).map_err(|_| StoreError::Decryption)?;
    let (nonce, ciphertext) = blob.split_at(NONCE_LEN);

    cipher
        .decrypt(XNonce::from_slice(nonce), ciphertext)
        .map_err(|_| StoreError::Decryption)
}
