//! stream/parallelism.rs
//! Worker pool sizing.

use crate::constants::{INFLIGHT_PER_WORKER, MAX_INFLIGHT_CHUNKS, MAX_WORKERS};
use crate::types::StreamError;

/// Parallelism configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParallelismProfile {
    /// Chunk crypto workers. `1` runs the pipeline on the calling thread.
    pub worker_count: usize,
    /// Chunks read but not yet written. Also the reassembly ring capacity.
    pub inflight_chunks: usize,
}

impl ParallelismProfile {
    pub fn single_threaded() -> Self {
        Self { worker_count: 1, inflight_chunks: 1 }
    }

    pub fn new(worker_count: usize) -> Self {
        Self {
            worker_count,
            inflight_chunks: worker_count.saturating_mul(INFLIGHT_PER_WORKER),
        }
    }

    /// One worker per available core, capped at `MAX_WORKERS`.
    pub fn dynamic() -> Self {
        Self::new(num_cpus::get().clamp(1, MAX_WORKERS))
    }

    pub fn with_inflight(mut self, inflight_chunks: usize) -> Self {
        self.inflight_chunks = inflight_chunks;
        self
    }

    #[inline]
    pub fn is_parallel(&self) -> bool {
        self.worker_count > 1
    }

    pub fn validate(&self) -> Result<(), StreamError> {
        if self.worker_count == 0 {
            return Err(StreamError::Configuration("worker count must be at least 1".into()));
        }
        if self.worker_count > MAX_WORKERS {
            return Err(StreamError::Configuration(format!(
                "worker count {} exceeds {MAX_WORKERS}",
                self.worker_count
            )));
        }
        if self.inflight_chunks > MAX_INFLIGHT_CHUNKS {
            return Err(StreamError::Configuration(format!(
                "inflight window {} exceeds {MAX_INFLIGHT_CHUNKS}",
                self.inflight_chunks
            )));
        }
        if self.inflight_chunks < self.worker_count {
            return Err(StreamError::Configuration(format!(
                "inflight window {} smaller than worker count {}",
                self.inflight_chunks, self.worker_count
            )));
        }
        Ok(())
    }
}

impl Default for ParallelismProfile {
    fn default() -> Self {
        Self::dynamic()
    }
}
