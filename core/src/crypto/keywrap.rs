//! crypto/keywrap.rs
//! Wraps the per-stream data key under the master key.
//!
//! The wrap uses AES-256-GCM with a random nonce and the sentinel AAD
//! (index = -1, length = 32), which no chunk can produce.

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce, Tag};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::Zeroizing;

use crate::constants::{KEY_LEN, KEY_WRAP_AAD_INDEX, NONCE_LEN, TAG_LEN};
use crate::crypto::aad::AadBuilder;
use crate::crypto::types::{CryptoError, DataKey, MasterKey};
use crate::headers::Header;

/// Wrapped data key as stored in the stream header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrappedKey {
    pub nonce: [u8; NONCE_LEN],
    pub tag: [u8; TAG_LEN],
    pub ciphertext: [u8; KEY_LEN],
}

impl WrappedKey {
    /// Stream header for this wrapped key.
    pub fn to_header(&self, key_id: i32, declared_length: i64) -> Header {
        Header::new(key_id, &self.nonce, &self.tag, &self.ciphertext, declared_length)
    }
}

/// Generate a fresh data key and wrap it under `master`.
///
/// Returns the unwrapped key for the pipeline and the wrapped form for the header.
pub fn wrap_data_key(master: &MasterKey) -> Result<(DataKey, WrappedKey), CryptoError> {
    let data_key = DataKey::generate();

    let mut nonce = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);

    let cipher = Aes256Gcm::new(master.as_bytes().into());
    let mut aad = AadBuilder::new(master.key_id());
    let aad = aad.fill(KEY_WRAP_AAD_INDEX, KEY_LEN as i64);

    let mut buf = Zeroizing::new(*data_key.as_bytes());
    let tag = cipher
        .encrypt_in_place_detached(Nonce::from_slice(&nonce), aad, &mut buf[..])
        .map_err(|_| CryptoError::Failure("key wrap seal failed".into()))?;

    let mut tag_out = [0u8; TAG_LEN];
    tag_out.copy_from_slice(tag.as_slice());
    let mut ciphertext = [0u8; KEY_LEN];
    ciphertext.copy_from_slice(&buf[..]);

    Ok((data_key, WrappedKey { nonce, tag: tag_out, ciphertext }))
}

/// Recover the data key from a stream header.
///
/// The key id is compared first; a mismatch fails without touching the cipher.
pub fn unwrap_data_key(master: &MasterKey, header: &Header) -> Result<DataKey, CryptoError> {
    if header.key_id != master.key_id() {
        return Err(CryptoError::KeyIdMismatch { expected: master.key_id(), found: header.key_id });
    }
    if header.tag.len() != TAG_LEN {
        return Err(CryptoError::InvalidTagLen { expected: TAG_LEN, actual: header.tag.len() });
    }
    if header.nonce.len() != NONCE_LEN || header.wrapped_key.len() != KEY_LEN {
        return Err(CryptoError::WrappedKeyLen {
            expected: KEY_LEN,
            actual: header.wrapped_key.len(),
        });
    }

    let cipher = Aes256Gcm::new(master.as_bytes().into());
    let mut aad = AadBuilder::new(master.key_id());
    let aad = aad.fill(KEY_WRAP_AAD_INDEX, KEY_LEN as i64);

    let mut buf = Zeroizing::new([0u8; KEY_LEN]);
    buf.copy_from_slice(&header.wrapped_key);
    cipher
        .decrypt_in_place_detached(
            Nonce::from_slice(&header.nonce),
            aad,
            &mut buf[..],
            Tag::from_slice(&header.tag),
        )
        .map_err(|_| CryptoError::UnwrapFailed)?;

    Ok(DataKey::from_bytes(*buf))
}
