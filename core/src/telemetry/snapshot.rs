//! telemetry/snapshot.rs
//! Immutable result of one encrypt or decrypt run.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::telemetry::counters::TelemetryCounters;
use crate::telemetry::timers::TelemetryTimer;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub counters: TelemetryCounters,
    pub worker_count: usize,
    /// Chunk size used for encryption; `None` for decryption.
    pub chunk_size: Option<usize>,
    pub throughput_plaintext_bytes_per_sec: f64,
    pub elapsed: Duration,
}

impl TelemetrySnapshot {
    pub fn from(
        counters: &TelemetryCounters,
        timer: &TelemetryTimer,
        worker_count: usize,
        chunk_size: Option<usize>,
    ) -> Self {
        let elapsed = timer.elapsed();
        let throughput = if elapsed.as_secs_f64() > 0.0 {
            counters.bytes_plaintext as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        Self {
            counters: counters.clone(),
            worker_count,
            chunk_size,
            throughput_plaintext_bytes_per_sec: throughput,
            elapsed,
        }
    }

    pub fn chunks(&self) -> u64 {
        self.counters.chunks
    }

    pub fn bytes_plaintext(&self) -> u64 {
        self.counters.bytes_plaintext
    }

    /// Bytes written (encrypt) or read (decrypt) on the wire.
    pub fn wire_bytes(&self) -> u64 {
        self.counters.wire_bytes()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
