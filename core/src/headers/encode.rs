//! headers/encode.rs
//!
//! Header encoding.
//!
//! - Writes the shared fixed prefix, then the variable fields in order.
//! - Full mode stores the total header length in bytes 4..8; compact mode
//!   stores a reserved zero there.

use byteorder::{ByteOrder, LittleEndian};

use crate::constants::MAGIC_CTN1;
use crate::headers::types::Header;

/// Encode a header from its parts.
///
/// `nonce` and `wrapped_key` may both be empty, which produces a compact chunk header.
pub fn encode_header(
    key_id: i32,
    nonce: &[u8],
    tag: &[u8],
    wrapped_key: &[u8],
    data_length: i64,
) -> Vec<u8> {
    let compact = nonce.is_empty() && wrapped_key.is_empty();
    let header_len = 4 + 4 + 8 + 4 + nonce.len() + tag.len() + wrapped_key.len();

    let mut out = vec![0u8; header_len];
    out[0..4].copy_from_slice(&MAGIC_CTN1);
    let len_or_reserved = if compact { 0 } else { header_len as u32 };
    LittleEndian::write_u32(&mut out[4..8], len_or_reserved);
    LittleEndian::write_i64(&mut out[8..16], data_length);
    LittleEndian::write_i32(&mut out[16..20], key_id);

    let mut i = 20;
    for field in [nonce, tag, wrapped_key] {
        out[i..i + field.len()].copy_from_slice(field);
        i += field.len();
    }
    debug_assert_eq!(i, header_len, "encoding wrote incorrect length");

    out
}

impl Header {
    /// Encode this header. The magic is always written as `CTN1`.
    pub fn encode(&self) -> Vec<u8> {
        encode_header(self.key_id, &self.nonce, &self.tag, &self.wrapped_key, self.data_length)
    }
}
