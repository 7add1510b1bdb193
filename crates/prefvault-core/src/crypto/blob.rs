//! At-rest representation of an encrypted preference mapping.
//!
//! Wire form: `base64(nonce):base64(tag):base64(ciphertext)`, standard
//! alphabet with padding. The blob carries no key material and no key id.

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::{PrefError, Result};

/// AES-GCM nonce length in bytes.
pub const NONCE_LENGTH: usize = 12;

/// AES-GCM authentication tag length in bytes.
pub const TAG_LENGTH: usize = 16;

/// Segment delimiter in the wire form.
pub const DELIMITER: char = ':';

/// Nonce, detached authentication tag, and ciphertext of one encoding call.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedBlob {
    nonce: [u8; NONCE_LENGTH],
    tag: [u8; TAG_LENGTH],
    ciphertext: Vec<u8>,
}

impl EncryptedBlob {
    pub fn new(nonce: [u8; NONCE_LENGTH], tag: [u8; TAG_LENGTH], ciphertext: Vec<u8>) -> Self {
        Self {
            nonce,
            tag,
            ciphertext,
        }
    }

    /// Parse the wire form.
    ///
    /// # Errors
    ///
    /// Returns `PrefError::Format` if:
    /// - There are not exactly three segments
    /// - A segment is empty or not valid base64
    /// - The nonce or tag has the wrong length
    pub fn parse(encoded: &str) -> Result<Self> {
        let segments: Vec<&str> = encoded.split(DELIMITER).collect();
        let [nonce_b64, tag_b64, ciphertext_b64] = segments.as_slice() else {
            return Err(PrefError::Format(format!(
                "expected 3 segments, found {}",
                segments.len()
            )));
        };

        let nonce = decode_segment("nonce", nonce_b64)?;
        let tag = decode_segment("tag", tag_b64)?;
        let ciphertext = decode_segment("ciphertext", ciphertext_b64)?;

        let nonce: [u8; NONCE_LENGTH] = nonce.as_slice().try_into().map_err(|_| {
            PrefError::Format(format!(
                "nonce must be {} bytes, got {}",
                NONCE_LENGTH,
                nonce.len()
            ))
        })?;
        let tag: [u8; TAG_LENGTH] = tag.as_slice().try_into().map_err(|_| {
            PrefError::Format(format!("tag must be {} bytes, got {}", TAG_LENGTH, tag.len()))
        })?;

        Ok(Self::new(nonce, tag, ciphertext))
    }

    pub fn nonce(&self) -> &[u8; NONCE_LENGTH] {
        &self.nonce
    }

    pub fn tag(&self) -> &[u8; TAG_LENGTH] {
        &self.tag
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }
}

fn decode_segment(name: &str, segment: &str) -> Result<Vec<u8>> {
    if segment.is_empty() {
        return Err(PrefError::Format(format!("{} segment is empty", name)));
    }
    STANDARD
        .decode(segment)
        .map_err(|e| PrefError::Format(format!("{} segment is not valid base64: {}", name, e)))
}

impl fmt::Display for EncryptedBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}{}{}",
            STANDARD.encode(self.nonce),
            DELIMITER,
            STANDARD.encode(self.tag),
            DELIMITER,
            STANDARD.encode(&self.ciphertext)
        )
    }
}

// Ciphertext is opaque, but its length is the only thing worth seeing in logs.
impl fmt::Debug for EncryptedBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedBlob")
            .field("ciphertext_len", &self.ciphertext.len())
            .finish_non_exhaustive()
    }
}

impl FromStr for EncryptedBlob {
    type Err = PrefError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
