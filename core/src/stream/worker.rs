//! stream/worker.rs
//! Chunk jobs and the worker loop.
//!
//! Workers are stateless between chunks: each one borrows the shared
//! read-only `ChunkCodec`, processes whatever job it receives, and reports
//! `(index, result)` back to the ordered writer.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crossbeam::channel::{Receiver, Sender};
use tracing::trace;

use crate::crypto::{ChunkCodec, SealedChunk};
use crate::types::StreamError;
use crate::stream::cancel::CancelToken;

/// Completed job as seen by the ordered writer.
pub type ChunkResult<T> = (i64, Result<T, StreamError>);

/// A unit of chunk crypto that any worker can run.
pub trait ChunkJob: Send {
    type Output: Send;

    fn index(&self) -> i64;

    fn process(self, codec: &ChunkCodec) -> Result<Self::Output, StreamError>;
}

/// Plaintext chunk read from the input.
#[derive(Debug)]
pub struct EncryptJob {
    pub index: i64,
    pub plaintext: Vec<u8>,
}

impl ChunkJob for EncryptJob {
    type Output = SealedChunk;

    #[inline]
    fn index(&self) -> i64 {
        self.index
    }

    fn process(self, codec: &ChunkCodec) -> Result<SealedChunk, StreamError> {
        Ok(codec.encrypt_chunk(self.index, self.plaintext)?)
    }
}

/// Ciphertext chunk read from the input, with its header fields.
#[derive(Debug)]
pub struct DecryptJob {
    pub index: i64,
    pub tag: Vec<u8>,
    pub declared_len: i64,
    pub ciphertext: Vec<u8>,
}

impl ChunkJob for DecryptJob {
    type Output = Vec<u8>;

    #[inline]
    fn index(&self) -> i64 {
        self.index
    }

    fn process(self, codec: &ChunkCodec) -> Result<Vec<u8>, StreamError> {
        Ok(codec.decrypt_chunk(self.index, self.ciphertext, &self.tag, self.declared_len)?)
    }
}

/// Run one job, turning a panic inside it into `Pipeline` so the ordered
/// writer still receives a result for its index.
pub fn run_job<J: ChunkJob>(job: J, codec: &ChunkCodec) -> Result<J::Output, StreamError> {
    catch_unwind(AssertUnwindSafe(|| job.process(codec)))
        .unwrap_or(Err(StreamError::Pipeline("chunk job panicked")))
}

pub struct ChunkWorker<'a> {
    id: usize,
    codec: &'a ChunkCodec,
    cancel: &'a CancelToken,
}

impl<'a> ChunkWorker<'a> {
    pub fn new(id: usize, codec: &'a ChunkCodec, cancel: &'a CancelToken) -> Self {
        Self { id, codec, cancel }
    }

    /// Run until the job channel closes or the writer goes away.
    ///
    /// A job already received is always finished; after cancellation its
    /// result is dropped instead of reported.
    pub fn run<J: ChunkJob>(self, rx: Receiver<J>, tx: Sender<ChunkResult<J::Output>>) {
        trace!(worker = self.id, "worker started");
        while let Ok(job) = rx.recv() {
            let index = job.index();
            let result = run_job(job, self.codec);
            if self.cancel.is_cancelled() {
                trace!(worker = self.id, index, "cancelled, result discarded");
                continue;
            }
            if tx.send((index, result)).is_err() {
                break;
            }
        }
        trace!(worker = self.id, "worker exiting");
    }
}
