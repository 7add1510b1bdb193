//! AES-256-GCM codec for preference mappings.
//!
//! The mapping is serialized to compact JSON (keys sorted, since the mapping
//! is a `BTreeMap`), encrypted with a fresh random nonce and no associated
//! data, and split into nonce, tag and ciphertext.

use aes_gcm::aead::{AeadCore, AeadInPlace, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce, Tag};
use zeroize::Zeroizing;

use super::blob::{EncryptedBlob, NONCE_LENGTH, TAG_LENGTH};
use super::key::EncryptionKey;
use crate::error::{PrefError, Result};
use crate::storage::PreferenceMapping;

const ASSOCIATED_DATA: &[u8] = b"";

fn cipher(key: &EncryptionKey) -> Result<Aes256Gcm> {
    Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| PrefError::Config(format!("Failed to create cipher: {}", e)))
}

/// Encrypt a preference mapping.
///
/// # Errors
///
/// Returns `PrefError::Config` if the cipher cannot be built from `key`.
///
/// # Examples
///
/// ```
/// use prefvault_core::crypto::{decode, encode, EncryptionKey};
/// use prefvault_core::PreferenceMapping;
///
/// let key = EncryptionKey::generate();
/// let mut prefs = PreferenceMapping::new();
/// prefs.insert("order_created".to_string(), true);
///
/// let blob = encode(&prefs, &key).unwrap();
/// assert_eq!(decode(&blob, &key).unwrap(), prefs);
/// ```
pub fn encode(mapping: &PreferenceMapping, key: &EncryptionKey) -> Result<EncryptedBlob> {
    let cipher = cipher(key)?;

    // Encrypted in place: the buffer holds ciphertext after this call.
    let mut buffer = serde_json::to_vec(mapping)?;
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let tag = cipher
        .encrypt_in_place_detached(&nonce, ASSOCIATED_DATA, buffer.as_mut_slice())
        .map_err(|e| PrefError::Config(format!("Encryption failed: {}", e)))?;

    let mut nonce_bytes = [0u8; NONCE_LENGTH];
    nonce_bytes.copy_from_slice(nonce.as_slice());
    let mut tag_bytes = [0u8; TAG_LENGTH];
    tag_bytes.copy_from_slice(tag.as_slice());

    Ok(EncryptedBlob::new(nonce_bytes, tag_bytes, buffer))
}

/// Decrypt and verify a blob produced by [`encode`].
///
/// # Errors
///
/// Returns `PrefError::Integrity` if the tag does not verify. A wrong key
/// and a tampered blob produce the same error.
///
/// Returns `PrefError::Format` if the plaintext is not a JSON object of
/// string keys to boolean values.
pub fn decode(blob: &EncryptedBlob, key: &EncryptionKey) -> Result<PreferenceMapping> {
    let cipher = cipher(key)?;
    let nonce = Nonce::from_slice(blob.nonce());
    let tag = Tag::from_slice(blob.tag());

    let mut buffer = Zeroizing::new(blob.ciphertext().to_vec());
    cipher
        .decrypt_in_place_detached(nonce, ASSOCIATED_DATA, buffer.as_mut_slice(), tag)
        .map_err(|_| PrefError::Integrity)?;

    serde_json::from_slice(buffer.as_slice()).map_err(|e| {
        PrefError::Format(format!("Decrypted payload is not a preference object: {}", e))
    })
}

/// Parse the wire form and decode it in one step.
pub fn decode_str(encoded: &str, key: &EncryptionKey) -> Result<PreferenceMapping> {
    let blob = EncryptedBlob::parse(encoded)?;
    decode(&blob, key)
}
