//! stream/io.rs
//! Normalised input and chunk-frame I/O.

use std::fs::File;
use std::io::{Cursor, Read, Write};
use std::path::PathBuf;

use crate::constants::MAX_CHUNK_SIZE;
use crate::headers::{read_header_or_eof, read_up_to, Header, HeaderLayout};
use crate::types::StreamError;

/// Canonical input abstraction.
///
/// `File` and `Memory` have a known length, which is declared in the stream
/// header. `Reader` is treated as non-seekable and declares 0.
pub enum InputSource {
    Reader(Box<dyn Read + Send>),
    File(PathBuf),
    Memory(Vec<u8>),
}

impl InputSource {
    pub fn reader<R: Read + Send + 'static>(r: R) -> Self {
        InputSource::Reader(Box::new(r))
    }
}

impl From<Vec<u8>> for InputSource {
    fn from(bytes: Vec<u8>) -> Self {
        InputSource::Memory(bytes)
    }
}

impl From<&[u8]> for InputSource {
    fn from(bytes: &[u8]) -> Self {
        InputSource::Memory(bytes.to_vec())
    }
}

impl From<PathBuf> for InputSource {
    fn from(path: PathBuf) -> Self {
        InputSource::File(path)
    }
}

/// Normalise an input source into a boxed reader plus its known length, if any.
pub fn open_input(src: InputSource) -> Result<(Box<dyn Read + Send>, Option<u64>), StreamError> {
    let opened: (Box<dyn Read + Send>, Option<u64>) = match src {
        InputSource::Reader(r) => (r, None),
        InputSource::File(p) => {
            let file = File::open(p)?;
            let len = file.metadata()?.len();
            (Box::new(file), Some(len))
        }
        InputSource::Memory(b) => {
            let len = b.len() as u64;
            (Box::new(Cursor::new(b)), Some(len))
        }
    };
    Ok(opened)
}

/// Read up to `len` bytes. A short result means EOF; empty means nothing left.
pub fn read_exact_or_eof<R: Read + ?Sized>(r: &mut R, len: usize) -> Result<Vec<u8>, StreamError> {
    let mut buf = vec![0u8; len];
    let n = read_up_to(r, &mut buf)?;
    buf.truncate(n);
    Ok(buf)
}

/// Write one compact chunk header followed by its ciphertext.
pub fn write_chunk_frame<W: Write + ?Sized>(
    w: &mut W,
    key_id: i32,
    tag: &[u8],
    ciphertext: &[u8],
) -> Result<usize, StreamError> {
    let header = Header::chunk(key_id, tag, ciphertext.len() as i64);
    w.write_all(&header.encode())?;
    w.write_all(ciphertext)?;
    Ok(header.frame_len())
}

/// Read the next chunk header and its ciphertext.
///
/// - `Ok(None)`: clean EOF before the header.
/// - EOF inside the header or ciphertext: `Truncation`.
/// - Key id different from the stream's, or length outside
///   `[0, MAX_CHUNK_SIZE]`: `Format`.
pub fn read_chunk_frame<R: Read + ?Sized>(
    r: &mut R,
    stream_key_id: i32,
) -> Result<Option<(Header, Vec<u8>)>, StreamError> {
    let Some(header) = read_header_or_eof(r, HeaderLayout::CHUNK)? else {
        return Ok(None);
    };

    if header.key_id != stream_key_id {
        return Err(StreamError::Format(format!(
            "chunk key id {} does not match stream key id {}",
            header.key_id, stream_key_id
        )));
    }
    if header.data_length < 0 || header.data_length > MAX_CHUNK_SIZE as i64 {
        return Err(StreamError::Format(format!("invalid chunk length {}", header.data_length)));
    }

    let len = header.data_length as usize;
    let mut ciphertext = vec![0u8; len];
    let got = read_up_to(r, &mut ciphertext)?;
    if got < len {
        return Err(StreamError::Truncation(format!(
            "chunk ciphertext: needed {len} bytes, got {got}"
        )));
    }

    Ok(Some((header, ciphertext)))
}
