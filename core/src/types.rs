use std::io;

use thiserror::Error;

use crate::crypto::{CryptoError, NonceError};
use crate::headers::HeaderError;

/// Unified stream error covering configuration, wire format, truncation,
/// authentication, key selection, cancellation and I/O.
/// - Leaf errors convert via `From`, so `?` works across the pipeline.
/// - Truncation is kept apart from authentication so callers can tell
///   "incomplete" from "corrupted".
#[derive(Debug, Error)]
pub enum StreamError {
    /// Invalid key, key id, chunk size or worker settings. Raised before any I/O.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Bad magic, malformed header or inconsistent stream metadata.
    #[error("format error: {0}")]
    Format(String),

    /// EOF inside a header or inside chunk ciphertext.
    #[error("truncated stream: {0}")]
    Truncation(String),

    /// GCM tag mismatch while unwrapping the data key or opening a chunk.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Header key id differs from the key id the cipher is configured with.
    #[error("key id mismatch: expected={expected}, found={found}")]
    KeyIdMismatch { expected: i32, found: i32 },

    /// Cooperative cancellation was observed.
    #[error("operation cancelled")]
    Cancelled,

    /// Underlying reader/writer failure.
    #[error("I/O error: {0}")]
    Io(io::Error),

    /// Internal worker/channel breakdown.
    #[error("pipeline error: {0}")]
    Pipeline(&'static str),
}

impl StreamError {
    /// True for failures that mean the ciphertext was modified or the wrong key was used.
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, StreamError::Authentication(_))
    }

    /// Wrap into an `io::Error` so it can travel through `Read`/`Write` impls.
    pub fn into_io(self) -> io::Error {
        let kind = match &self {
            StreamError::Io(e) => e.kind(),
            StreamError::Truncation(_) => io::ErrorKind::UnexpectedEof,
            // Not `Interrupted`: std read/write loops would retry it.
            StreamError::Cancelled => io::ErrorKind::Other,
            StreamError::Configuration(_) => io::ErrorKind::InvalidInput,
            _ => io::ErrorKind::InvalidData,
        };
        io::Error::new(kind, self)
    }
}

impl From<io::Error> for StreamError {
    /// Unwraps a `StreamError` that was carried inside an `io::Error`
    /// (see [`StreamError::into_io`]); anything else stays `Io`.
    fn from(e: io::Error) -> Self {
        if !e.get_ref().is_some_and(|inner| inner.is::<StreamError>()) {
            return StreamError::Io(e);
        }
        match e.into_inner().map(|inner| inner.downcast::<StreamError>()) {
            Some(Ok(inner)) => *inner,
            _ => StreamError::Pipeline("nested stream error lost"),
        }
    }
}

impl From<HeaderError> for StreamError {
    fn from(e: HeaderError) -> Self {
        match e {
            HeaderError::Truncated { .. } => StreamError::Truncation(e.to_string()),
            HeaderError::Io(io) => StreamError::from(io),
            other => StreamError::Format(other.to_string()),
        }
    }
}

impl From<NonceError> for StreamError {
    fn from(e: NonceError) -> Self {
        StreamError::Configuration(e.to_string())
    }
}

impl From<CryptoError> for StreamError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::InvalidKeyLen { .. } | CryptoError::InvalidKeyId { .. } => {
                StreamError::Configuration(e.to_string())
            }
            CryptoError::Nonce(n) => StreamError::from(n),
            CryptoError::WrappedKeyLen { .. } => StreamError::Format(e.to_string()),
            CryptoError::KeyIdMismatch { expected, found } => {
                StreamError::KeyIdMismatch { expected, found }
            }
            CryptoError::TagMismatch { .. }
            | CryptoError::UnwrapFailed
            | CryptoError::LengthMismatch { .. }
            | CryptoError::InvalidTagLen { .. } => StreamError::Authentication(e.to_string()),
            CryptoError::Failure(_) => StreamError::Pipeline("AEAD primitive failure"),
        }
    }
}
