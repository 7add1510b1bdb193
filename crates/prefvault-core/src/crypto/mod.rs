//! Cryptographic operations for Prefvault.
//!
//! - **key**: the 256-bit encryption key, validated at construction
//! - **blob**: the `nonce:tag:ciphertext` wire form
//! - **codec**: AES-256-GCM encode/decode of preference mappings
//!
//! ## Security Model
//!
//! - One process-wide key, injected by the caller, zeroized on drop
//! - A fresh random 96-bit nonce per encryption
//! - Authentication failures are reported as a single `Integrity` error
//!   whatever the cause
//!
//! Key rotation and key identifiers are out of scope: a blob can only be
//! read with the key that wrote it.

pub mod blob;
pub mod codec;
pub mod key;

pub use blob::{EncryptedBlob, NONCE_LENGTH, TAG_LENGTH};
pub use codec::{decode, decode_str, encode};
pub use key::{EncryptionKey, KEY_LENGTH};
