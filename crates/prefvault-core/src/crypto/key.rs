//! The process-wide preference encryption key.
//!
//! A key is validated once, when it is constructed. Every codec call takes a
//! `&EncryptionKey`, so a value of this type is always the right length.

use aes_gcm::aead::{KeyInit, OsRng};
use aes_gcm::Aes256Gcm;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use secrecy::{ExposeSecret, SecretString};
use zeroize::{ZeroizeOnDrop, Zeroizing};

use crate::error::{PrefError, Result};

/// Length of the AES-256 key in bytes.
pub const KEY_LENGTH: usize = 32;

/// A 256-bit AES-GCM key.
///
/// Key material is zeroized when the value is dropped and never printed by
/// `Debug`.
#[derive(Clone, ZeroizeOnDrop)]
pub struct EncryptionKey {
    key: [u8; KEY_LENGTH],
}

impl EncryptionKey {
    /// Build a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `PrefError::Config` if `bytes` is not exactly 32 bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let key: [u8; KEY_LENGTH] = bytes.try_into().map_err(|_| {
            PrefError::Config(format!(
                "Encryption key must be {} bytes, got {}",
                KEY_LENGTH,
                bytes.len()
            ))
        })?;
        Ok(Self { key })
    }

    /// Build a key from its base64 text form (standard alphabet).
    ///
    /// Surrounding whitespace is ignored so keyfiles with a trailing newline
    /// load cleanly.
    ///
    /// # Examples
    ///
    /// ```
    /// use prefvault_core::crypto::EncryptionKey;
    /// use secrecy::SecretString;
    ///
    /// let text = SecretString::from("AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA=".to_string());
    /// let key = EncryptionKey::from_base64(&text).unwrap();
    /// assert_eq!(key.as_bytes(), &[0u8; 32]);
    /// ```
    pub fn from_base64(encoded: &SecretString) -> Result<Self> {
        let decoded = STANDARD
            .decode(encoded.expose_secret().trim())
            .map_err(|e| PrefError::Config(format!("Encryption key is not valid base64: {}", e)))?;
        let decoded = Zeroizing::new(decoded);
        Self::from_bytes(&decoded)
    }

    /// Generate a fresh random key from the OS RNG.
    pub fn generate() -> Self {
        let generated = Aes256Gcm::generate_key(OsRng);
        let mut key = [0u8; KEY_LENGTH];
        key.copy_from_slice(generated.as_slice());
        Self { key }
    }

    /// Base64 text form, suitable for a keyfile or environment variable.
    pub fn to_base64(&self) -> SecretString {
        SecretString::from(STANDARD.encode(self.key))
    }

    /// Raw key bytes. Do not log or persist this value.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}
