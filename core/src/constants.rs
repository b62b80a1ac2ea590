//! constants.rs
//! Wire-level constants shared by headers, crypto and the stream pipeline.
//!
//! All multi-byte integers on the wire are little-endian.

/// Magic marker shared by stream headers and chunk headers.
/// "CTN1" = chunked transport, format 1.
pub const MAGIC_CTN1: [u8; 4] = *b"CTN1";

/// Format version bound into every AAD.
pub const FORMAT_VERSION: u32 = 1;

/// AES-256 key length (master key and data key).
pub const KEY_LEN: usize = 32;

/// AES-GCM nonce length.
pub const NONCE_LEN: usize = 12;

/// AES-GCM tag length.
pub const TAG_LEN: usize = 16;

/// Associated data length: magic(4) + version(4) + key_id(4) + index(8) + length(8) + reserved(4).
pub const AAD_LEN: usize = 32;

/// Smallest accepted chunk size (64 KiB).
pub const MIN_CHUNK_SIZE: usize = 64 * 1024;
/// Largest accepted chunk size (16 MiB).
pub const MAX_CHUNK_SIZE: usize = 16 * 1024 * 1024;
/// Chunk size used when the caller does not pick one (1 MiB).
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Fixed prefix shared by both header modes: magic(4) + len/reserved(4) + length(8) + key_id(4).
pub const HEADER_FIXED_LEN: usize = 4 + 4 + 8 + 4;

/// Full stream header with a 32-byte wrapped key.
pub const STREAM_HEADER_LEN: usize = HEADER_FIXED_LEN + NONCE_LEN + TAG_LEN + KEY_LEN; // 80
/// Compact chunk header (no nonce, no wrapped key).
pub const CHUNK_HEADER_LEN: usize = HEADER_FIXED_LEN + TAG_LEN; // 36

/// Upper bound on a declared stream header length; rejects absurd allocations.
pub const MAX_STREAM_HEADER_LEN: usize = 4096;

/// Chunk index reserved for the key-wrap AAD. Chunk indices are never negative.
pub const KEY_WRAP_AAD_INDEX: i64 = -1;

/// Default number of slots in the bounded pipe behind the stream-returning API.
pub const DEFAULT_PIPE_CAPACITY: usize = 8;

/// In-flight chunks per worker when the window is derived from the worker count.
pub const INFLIGHT_PER_WORKER: usize = 4;

/// Largest accepted worker pool.
pub const MAX_WORKERS: usize = 256;

/// Largest accepted in-flight window. Each slot can hold one chunk of up to `MAX_CHUNK_SIZE`.
pub const MAX_INFLIGHT_CHUNKS: usize = MAX_WORKERS * INFLIGHT_PER_WORKER;

/// Largest accepted pipe capacity.
pub const MAX_PIPE_CAPACITY: usize = 1024;
