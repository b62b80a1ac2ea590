//! headers/types.rs
//! Header struct, layout selector and header errors.

use std::io;

use thiserror::Error;

use crate::constants::{CHUNK_HEADER_LEN, HEADER_FIXED_LEN, MAGIC_CTN1, NONCE_LEN, TAG_LEN};

/// Expected variable-field sizes for one header mode.
///
/// A zero `nonce_len` selects compact mode: the second 4-byte field is a
/// reserved zero instead of the header length, and there is no wrapped key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderLayout {
    pub nonce_len: usize,
    pub tag_len: usize,
}

impl HeaderLayout {
    /// Full stream header: 12-byte key-wrap nonce, 16-byte tag, variable wrapped key.
    pub const STREAM: HeaderLayout = HeaderLayout { nonce_len: NONCE_LEN, tag_len: TAG_LEN };
    /// Compact chunk header: no nonce, 16-byte tag.
    pub const CHUNK: HeaderLayout = HeaderLayout { nonce_len: 0, tag_len: TAG_LEN };

    #[inline]
    pub fn is_compact(&self) -> bool {
        self.nonce_len == 0
    }

    /// Length of everything except the wrapped key.
    #[inline]
    pub fn fixed_len(&self) -> usize {
        HEADER_FIXED_LEN + self.nonce_len + self.tag_len
    }
}

/// One header definition for both modes.
///
/// Wire layout (little-endian):
/// ```text
/// magic(4) | header_len or reserved(4) | data_length(i64) | key_id(i32) | nonce | tag | wrapped_key
/// ```
/// In compact mode `nonce` and `wrapped_key` are empty and `data_length` is
/// the chunk length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub magic: [u8; 4],
    pub data_length: i64,
    pub key_id: i32,
    pub nonce: Vec<u8>,
    pub tag: Vec<u8>,
    pub wrapped_key: Vec<u8>,
}

impl Header {
    pub fn new(key_id: i32, nonce: &[u8], tag: &[u8], wrapped_key: &[u8], data_length: i64) -> Self {
        Self {
            magic: MAGIC_CTN1,
            data_length,
            key_id,
            nonce: nonce.to_vec(),
            tag: tag.to_vec(),
            wrapped_key: wrapped_key.to_vec(),
        }
    }

    /// Compact per-chunk header.
    pub fn chunk(key_id: i32, tag: &[u8], chunk_length: i64) -> Self {
        Self::new(key_id, &[], tag, &[], chunk_length)
    }

    #[inline]
    pub fn is_compact(&self) -> bool {
        self.nonce.is_empty() && self.wrapped_key.is_empty()
    }

    /// Encoded size in bytes.
    pub fn encoded_len(&self) -> usize {
        HEADER_FIXED_LEN + self.nonce.len() + self.tag.len() + self.wrapped_key.len()
    }

    /// Encoded size of a compact chunk header plus its ciphertext.
    pub fn frame_len(&self) -> usize {
        debug_assert_eq!(self.encoded_len(), CHUNK_HEADER_LEN);
        self.encoded_len() + self.data_length.max(0) as usize
    }

    /// One-line summary for logs (no key material).
    pub fn summary(&self) -> String {
        format!(
            "Header {{ mode={}, len={}, data_length={}, key_id={} }}",
            if self.is_compact() { "chunk" } else { "stream" },
            self.encoded_len(),
            self.data_length,
            self.key_id,
        )
    }
}

#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("bad magic: expected {:?}, found {found:?}", MAGIC_CTN1)]
    BadMagic { found: [u8; 4] },

    #[error("unexpected end of stream in {context}: needed {needed} bytes, got {got}")]
    Truncated { context: &'static str, needed: usize, got: usize },

    #[error("invalid header length {declared}: allowed {min}..={max}")]
    InvalidLength { declared: usize, min: usize, max: usize },

    #[error("reserved field must be zero, found {raw:#010x}")]
    ReservedNonZero { raw: u32 },

    #[error("header I/O error: {0}")]
    Io(#[from] io::Error),
}
