//! crypto/aad.rs
//! 32-byte associated data bound to every GCM operation.
//!
//! ```text
//! 0..4   magic "CTN1"
//! 4..8   format version (u32 LE)
//! 8..12  key id (i32 LE)
//! 12..20 chunk index (i64 LE)
//! 20..28 chunk length (i64 LE)
//! 28..32 reserved, zero
//! ```
//! Bytes 0..12 are fixed per stream. Changing index, length or physical order
//! makes tag verification fail.

use crate::constants::{AAD_LEN, FORMAT_VERSION, MAGIC_CTN1};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AadBuilder {
    buf: [u8; AAD_LEN],
}

impl AadBuilder {
    /// Initialise the constant prefix for `key_id`.
    pub fn new(key_id: i32) -> Self {
        let mut buf = [0u8; AAD_LEN];
        buf[0..4].copy_from_slice(&MAGIC_CTN1);
        buf[4..8].copy_from_slice(&FORMAT_VERSION.to_le_bytes());
        buf[8..12].copy_from_slice(&key_id.to_le_bytes());
        Self { buf }
    }

    /// Set the per-chunk fields and return the full AAD.
    #[inline]
    pub fn fill(&mut self, index: i64, length: i64) -> &[u8; AAD_LEN] {
        self.buf[12..20].copy_from_slice(&index.to_le_bytes());
        self.buf[20..28].copy_from_slice(&length.to_le_bytes());
        self.buf[28..32].fill(0);
        &self.buf
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; AAD_LEN] {
        &self.buf
    }
}
