//! crypto/types.rs
//! Key types and crypto-level errors.

use std::fmt;

use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::constants::KEY_LEN;

/// Caller-supplied 256-bit key bound to a positive key id.
/// Used only to wrap and unwrap data keys, never on content.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey {
    key_id: i32,
    bytes: [u8; KEY_LEN],
}

impl MasterKey {
    pub fn new(key_id: i32, bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != KEY_LEN {
            return Err(CryptoError::InvalidKeyLen { expected: KEY_LEN, actual: bytes.len() });
        }
        if key_id <= 0 {
            return Err(CryptoError::InvalidKeyId { key_id });
        }
        let mut arr = [0u8; KEY_LEN];
        arr.copy_from_slice(bytes);
        Ok(Self { key_id, bytes: arr })
    }

    #[inline]
    pub fn key_id(&self) -> i32 {
        self.key_id
    }

    #[inline]
    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MasterKey").field("key_id", &self.key_id).finish_non_exhaustive()
    }
}

/// Ephemeral per-stream content key. Zeroized on drop, never persisted unwrapped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DataKey([u8; KEY_LEN]);

impl DataKey {
    /// Fresh random key from the OS RNG.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub(crate) fn from_bytes(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub(crate) fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for DataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DataKey(..)")
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NonceError {
    /// Counter is negative: the chunk counter ran out.
    #[error("nonce counter exhausted (counter={counter})")]
    CounterExhausted { counter: i64 },
}

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid key length: expected={expected}, actual={actual}")]
    InvalidKeyLen { expected: usize, actual: usize },

    #[error("invalid key id {key_id}: must be positive")]
    InvalidKeyId { key_id: i32 },

    #[error("invalid tag length: expected={expected}, actual={actual}")]
    InvalidTagLen { expected: usize, actual: usize },

    #[error("invalid wrapped key length: expected={expected}, actual={actual}")]
    WrappedKeyLen { expected: usize, actual: usize },

    #[error("declared chunk length {declared} does not match ciphertext length {actual}")]
    LengthMismatch { declared: i64, actual: usize },

    #[error("AEAD tag mismatch at chunk {index}")]
    TagMismatch { index: i64 },

    #[error("data key unwrap failed: wrong master key or tampered header")]
    UnwrapFailed,

    #[error("key id mismatch: expected={expected}, found={found}")]
    KeyIdMismatch { expected: i32, found: i32 },

    #[error(transparent)]
    Nonce(#[from] NonceError),

    #[error("crypto failure: {0}")]
    Failure(String),
}
