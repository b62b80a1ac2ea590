//! crypto/aead.rs
//! Per-chunk AES-256-GCM under the data key.
//!
//! - Nonce: `compose_nonce(prefix, index)`.
//! - AAD: `AadBuilder(key_id).fill(index, len)`.
//! - Tags are detached; the ciphertext has the plaintext's length.
//! - Open fails closed: no plaintext is returned on any mismatch.

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce, Tag};

use crate::constants::{NONCE_LEN, TAG_LEN};
use crate::crypto::aad::AadBuilder;
use crate::crypto::nonce::compose_nonce;
use crate::crypto::types::{CryptoError, DataKey};

/// Output of [`ChunkCodec::encrypt_chunk`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedChunk {
    pub index: i64,
    pub ciphertext: Vec<u8>,
    pub tag: [u8; TAG_LEN],
}

/// Immutable chunk cipher shared read-only by all workers of one stream.
#[derive(Clone)]
pub struct ChunkCodec {
    aead: Aes256Gcm,
    aad: AadBuilder,
    nonce_prefix: u32,
}

impl ChunkCodec {
    pub fn new(data_key: &DataKey, key_id: i32, nonce_prefix: u32) -> Self {
        Self {
            aead: Aes256Gcm::new(data_key.as_bytes().into()),
            aad: AadBuilder::new(key_id),
            nonce_prefix,
        }
    }

    /// Encrypt chunk `index` in place.
    pub fn encrypt_chunk(&self, index: i64, mut plaintext: Vec<u8>) -> Result<SealedChunk, CryptoError> {
        let mut nonce = [0u8; NONCE_LEN];
        compose_nonce(&mut nonce, self.nonce_prefix, index)?;
        let mut aad = self.aad;
        let aad = aad.fill(index, plaintext.len() as i64);

        let tag = self
            .aead
            .encrypt_in_place_detached(Nonce::from_slice(&nonce), aad, &mut plaintext)
            .map_err(|_| CryptoError::Failure("AES-GCM seal failed".into()))?;

        let mut tag_out = [0u8; TAG_LEN];
        tag_out.copy_from_slice(tag.as_slice());
        Ok(SealedChunk { index, ciphertext: plaintext, tag: tag_out })
    }

    /// Decrypt chunk `index` in place.
    ///
    /// `declared_len` comes from the chunk header and must equal the ciphertext length.
    pub fn decrypt_chunk(
        &self,
        index: i64,
        mut ciphertext: Vec<u8>,
        tag: &[u8],
        declared_len: i64,
    ) -> Result<Vec<u8>, CryptoError> {
        if declared_len < 0 || declared_len as u64 != ciphertext.len() as u64 {
            return Err(CryptoError::LengthMismatch { declared: declared_len, actual: ciphertext.len() });
        }
        if tag.len() != TAG_LEN {
            return Err(CryptoError::InvalidTagLen { expected: TAG_LEN, actual: tag.len() });
        }

        let mut nonce = [0u8; NONCE_LEN];
        compose_nonce(&mut nonce, self.nonce_prefix, index)?;
        let mut aad = self.aad;
        let aad = aad.fill(index, declared_len);

        self.aead
            .decrypt_in_place_detached(Nonce::from_slice(&nonce), aad, &mut ciphertext, Tag::from_slice(tag))
            .map_err(|_| CryptoError::TagMismatch { index })?;

        Ok(ciphertext)
    }
}
