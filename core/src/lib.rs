//! gcmstream-core
//!
//! Chunked, parallel, order-preserving AES-256-GCM stream encryption.
//! Pure Rust, no FFI.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;

// Wire format and crypto
pub mod headers;
pub mod crypto;
pub mod telemetry;

// Stream layer
pub mod stream;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::crypto::MasterKey;
    pub use crate::stream::{
        CancelToken, CipherConfig, InputSource, ParallelismProfile, PipeReader, StreamCipher,
    };
    pub use crate::telemetry::TelemetrySnapshot;
    pub use crate::types::StreamError;
}
