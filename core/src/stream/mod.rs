//! stream/mod.rs
//! Chunked, parallel, order-preserving AES-256-GCM pipeline.
//!
//! One reader thread owns the input, a fixed worker pool runs chunk crypto,
//! and the calling thread owns the output and emits results strictly in
//! chunk-index order.

pub mod cancel;
pub mod parallelism;
pub mod reorder;
pub mod worker;
pub mod io;
pub mod pipeline;
pub mod pipe;
pub mod core;

pub use cancel::CancelToken;
pub use io::InputSource;
pub use parallelism::ParallelismProfile;
pub use pipe::PipeReader;
pub use pipeline::{run_decrypt_pipeline, run_encrypt_pipeline, validate_chunk_size};
pub use self::core::{CipherConfig, StreamCipher};
