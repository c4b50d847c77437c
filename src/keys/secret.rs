//! Store key material

use base64::{engine::general_purpose::URL_SAFE, Engine};
use rand::RngCore;
use std::fmt;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::error::KeyAccessError;

/// Key length in bytes (256-bit)
pub const KEY_LEN: usize = 32;

/// The symmetric key protecting the connection store.
///
/// Wiped from memory on drop. At rest it is URL-safe base64 text.
#[derive(Clone)]
pub struct SecretKey(Zeroizing<[u8; KEY_LEN]>);

impl SecretKey {
    /// Generate a fresh key from the OS CSPRNG
    pub fn generate() -> Self {
        let mut bytes = Zeroizing::new([0u8; KEY_LEN]);
        rand::rngs::OsRng.fill_bytes(&mut *bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Text form written to key files and keychain entries
    pub fn encode(&self) -> Zeroizing<String> {
        Zeroizing::new(URL_SAFE.encode(&*self.0))
    }

    /// Parse the text form, ignoring surrounding whitespace
    pub fn decode(text: &str) -> Result<Self, KeyAccessError> {
        let raw = Zeroizing::new(
            URL_SAFE
                .decode(text.trim())
                .map_err(|e| KeyAccessError::Malformed(e.to_string()))?,
        );

        if raw.len() != KEY_LEN {
            return Err(KeyAccessError::Malformed(format!(
                "expected {} key bytes, found {}",
                KEY_LEN,
                raw.len()
            )));
        }

        let mut bytes = Zeroizing::new([0u8; KEY_LEN]);
        bytes.copy_from_slice(&raw);
        Ok(Self(bytes))
    }
}

impl PartialEq for SecretKey {
    fn eq(&self, other: &Self) -> bool {
        self.0[..].ct_eq(&other.0[..]).into()
    }
}

impl Eq for SecretKey {}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_random() {
        let a = SecretKey::generate();
        let b = SecretKey::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_text_form() {
        let key = SecretKey::from_bytes([7u8; KEY_LEN]);
        let text = key.encode();

        // 32 bytes -> 44 chars of padded URL-safe base64
        assert_eq!(text.len(), 44);
        assert!(!text.contains('+') && !text.contains('/'));

        let parsed = SecretKey::decode(&format!("{}\n", &*text)).unwrap();
        assert_eq!(parsed, key);
    }

    #[test]
    fn test_decode_rejects_bad_input() {
        assert!(matches!(
            SecretKey::decode("not base64 at all!"),
            Err(KeyAccessError::Malformed(_))
        ));

        let short = URL_SAFE.encode([1u8; 16]);
        assert!(matches!(
            SecretKey::decode(&short),
            Err(KeyAccessError::Malformed(_))
        ));
    }

    #[test]
    fn test_debug_hides_material() {
        let key = SecretKey::from_bytes([0xAB; KEY_LEN]);
        assert_eq!(format!("{:?}", key), "SecretKey(..)");
    }
}
