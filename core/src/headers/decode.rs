//! headers/decode.rs
//!
//! Header decoding.
//!
//! - Reads magic + length/reserved first, validates, then reads exactly the
//!   remaining bytes and slices fields positionally.
//! - A clean EOF before the first byte is reported as `None` by
//!   [`read_header_or_eof`]; anything shorter than a full header is `Truncated`.

use std::io::{self, Cursor, Read};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::constants::{MAGIC_CTN1, MAX_STREAM_HEADER_LEN};
use crate::headers::types::{Header, HeaderError, HeaderLayout};

const PREFIX_LEN: usize = 8;

/// Read until `buf` is full or the reader hits EOF. Returns the number of bytes read.
pub fn read_up_to<R: Read + ?Sized>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut off = 0;
    while off < buf.len() {
        match r.read(&mut buf[off..]) {
            Ok(0) => break,
            Ok(n) => off += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(off)
}

/// Decode one header, treating EOF anywhere as truncation.
pub fn decode_header<R: Read + ?Sized>(r: &mut R, layout: HeaderLayout) -> Result<Header, HeaderError> {
    read_header_or_eof(r, layout)?.ok_or(HeaderError::Truncated {
        context: "header",
        needed: PREFIX_LEN,
        got: 0,
    })
}

/// Decode one header, or return `None` if the reader is already at EOF.
pub fn read_header_or_eof<R: Read + ?Sized>(
    r: &mut R,
    layout: HeaderLayout,
) -> Result<Option<Header>, HeaderError> {
    let mut prefix = [0u8; PREFIX_LEN];
    let got = read_up_to(r, &mut prefix)?;
    if got == 0 {
        return Ok(None);
    }
    if got < PREFIX_LEN {
        return Err(HeaderError::Truncated { context: "header prefix", needed: PREFIX_LEN, got });
    }

    let mut magic = [0u8; 4];
    magic.copy_from_slice(&prefix[0..4]);
    if magic != MAGIC_CTN1 {
        return Err(HeaderError::BadMagic { found: magic });
    }

    let field = u32::from_le_bytes([prefix[4], prefix[5], prefix[6], prefix[7]]);
    let header_len = if layout.is_compact() {
        if field != 0 {
            return Err(HeaderError::ReservedNonZero { raw: field });
        }
        layout.fixed_len()
    } else {
        let declared = field as usize;
        if declared < layout.fixed_len() || declared > MAX_STREAM_HEADER_LEN {
            return Err(HeaderError::InvalidLength {
                declared,
                min: layout.fixed_len(),
                max: MAX_STREAM_HEADER_LEN,
            });
        }
        declared
    };

    let mut rest = vec![0u8; header_len - PREFIX_LEN];
    let got = read_up_to(r, &mut rest)?;
    if got < rest.len() {
        return Err(HeaderError::Truncated {
            context: "header body",
            needed: header_len,
            got: PREFIX_LEN + got,
        });
    }

    let mut cur = Cursor::new(&rest[..]);
    let data_length = cur.read_i64::<LittleEndian>()?;
    let key_id = cur.read_i32::<LittleEndian>()?;

    let mut i = cur.position() as usize;
    let nonce = rest[i..i + layout.nonce_len].to_vec();
    i += layout.nonce_len;
    let tag = rest[i..i + layout.tag_len].to_vec();
    i += layout.tag_len;
    let wrapped_key = rest[i..].to_vec();

    Ok(Some(Header { magic, data_length, key_id, nonce, tag, wrapped_key }))
}
