//! stream/cancel.rs
//! Cooperative cancellation signal shared by the reader, workers, writer and pipe.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::types::StreamError;

/// Clonable cancellation flag. Clones observe the same signal.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// `Err(Cancelled)` once cancellation was requested.
    #[inline]
    pub fn check(&self) -> Result<(), StreamError> {
        if self.is_cancelled() {
            return Err(StreamError::Cancelled);
        }
        Ok(())
    }
}

/// How often blocked channel operations wake up to observe cancellation.
pub const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(25);
