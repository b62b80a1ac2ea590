//! telemetry/counters.rs
//! Mutable counters used during streaming pipelines.
//!
//! Owned by the writer side of the pipeline; converted into a
//! `TelemetrySnapshot` at the end.

use serde::{Deserialize, Serialize};

/// Deterministic counters collected during stream processing
#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryCounters {
    pub headers: u64,
    pub chunks: u64,
    pub bytes_plaintext: u64,
    pub bytes_ciphertext: u64,
    pub bytes_overhead: u64,
}

impl TelemetryCounters {
    /// Record the stream header as overhead.
    pub fn add_header(&mut self, header_len: usize) {
        self.headers += 1;
        self.bytes_overhead += header_len as u64;
    }

    /// Record one chunk.
    ///
    /// - `pt_len`: plaintext length
    /// - `ct_len`: ciphertext length (equal to `pt_len` for GCM with a detached tag)
    /// - `overhead_len`: chunk header length
    pub fn add_chunk(&mut self, pt_len: usize, ct_len: usize, overhead_len: usize) {
        self.chunks += 1;
        self.bytes_plaintext += pt_len as u64;
        self.bytes_ciphertext += ct_len as u64;
        self.bytes_overhead += overhead_len as u64;
    }

    /// Total bytes on the wire.
    pub fn wire_bytes(&self) -> u64 {
        self.bytes_ciphertext + self.bytes_overhead
    }
}
