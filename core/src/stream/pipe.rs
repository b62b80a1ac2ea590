//! stream/pipe.rs
//! Bounded single-producer/single-consumer byte pipe behind the
//! stream-returning API.
//!
//! The producer (a pipeline running on its own thread) writes into a
//! [`PipeWriter`]; the caller reads from the returned [`PipeReader`]. The
//! channel holds at most `capacity` writes, so a stalled consumer suspends the
//! producer instead of growing memory.

use std::cmp::min;
use std::io::{self, Read, Write};
use std::thread::{self, JoinHandle};

use bytes::{Buf, Bytes};
use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use tracing::debug;

use crate::stream::cancel::{CancelToken, CANCEL_POLL_INTERVAL};
use crate::types::StreamError;

type PipeItem = Result<Bytes, StreamError>;

/// Producer half. Each `write` becomes one message on the channel.
pub struct PipeWriter {
    tx: Sender<PipeItem>,
    cancel: CancelToken,
}

impl PipeWriter {
    /// Blocking put that wakes up periodically to observe cancellation.
    fn push(&self, mut item: PipeItem) -> io::Result<()> {
        loop {
            match self.tx.send_timeout(item, CANCEL_POLL_INTERVAL) {
                Ok(()) => return Ok(()),
                Err(SendTimeoutError::Timeout(back)) => {
                    if self.cancel.is_cancelled() {
                        return Err(StreamError::Cancelled.into_io());
                    }
                    item = back;
                }
                Err(SendTimeoutError::Disconnected(_)) => {
                    return Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe reader dropped"));
                }
            }
        }
    }

    /// Hand a producer failure to the consumer's next `read`.
    pub fn fail(&self, err: StreamError) {
        // Nobody left to tell if the consumer is gone or cancelled.
        let _ = self.push(Err(err));
    }
}

impl Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.cancel.is_cancelled() {
            return Err(StreamError::Cancelled.into_io());
        }
        self.push(Ok(Bytes::copy_from_slice(buf)))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipeState {
    Open,
    Finished,
    Failed,
}

/// Consumer half, returned by the stream-returning API.
///
/// - Reads block until the producer writes, finishes or fails.
/// - A producer failure is returned once as an `io::Error` wrapping the
///   `StreamError` (`StreamError::from` recovers it); later reads keep failing.
/// - Dropping the reader aborts the producer on its next write.
#[derive(Debug)]
pub struct PipeReader {
    rx: Receiver<PipeItem>,
    current: Bytes,
    cancel: CancelToken,
    state: PipeState,
    producer: Option<JoinHandle<()>>,
}

impl PipeReader {
    /// Start `produce` on a named thread writing into a pipe of `capacity` slots.
    pub fn spawn<F>(
        name: &str,
        capacity: usize,
        cancel: CancelToken,
        produce: F,
    ) -> Result<Self, StreamError>
    where
        F: FnOnce(&mut PipeWriter) -> Result<(), StreamError> + Send + 'static,
    {
        let (tx, rx) = bounded::<PipeItem>(capacity.max(1));
        let mut writer = PipeWriter { tx, cancel: cancel.clone() };

        let thread_name = name.to_string();
        let handle = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                debug!(pipe = %thread_name, "pipe producer started");
                if let Err(e) = produce(&mut writer) {
                    writer.fail(e);
                }
                debug!(pipe = %thread_name, "pipe producer finished");
            })?;

        Ok(Self {
            rx,
            current: Bytes::new(),
            cancel,
            state: PipeState::Open,
            producer: Some(handle),
        })
    }

    /// True once the producer thread has exited.
    pub fn producer_finished(&self) -> bool {
        self.producer.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Producer ended without sending an error; surface a panic if there was one.
    fn finish(&mut self) -> io::Result<usize> {
        let panicked = self.producer.take().is_some_and(|h| h.join().is_err());
        if panicked {
            self.state = PipeState::Failed;
            return Err(StreamError::Pipeline("pipe producer panicked").into_io());
        }
        self.state = PipeState::Finished;
        Ok(0)
    }
}

impl Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            if self.current.has_remaining() {
                let n = min(buf.len(), self.current.remaining());
                buf[..n].copy_from_slice(&self.current[..n]);
                self.current.advance(n);
                return Ok(n);
            }

            match self.state {
                PipeState::Finished => return Ok(0),
                PipeState::Failed => {
                    return Err(io::Error::new(io::ErrorKind::Other, "pipe producer already failed"));
                }
                PipeState::Open => {}
            }

            if self.cancel.is_cancelled() {
                self.state = PipeState::Failed;
                return Err(StreamError::Cancelled.into_io());
            }

            match self.rx.recv_timeout(CANCEL_POLL_INTERVAL) {
                Ok(Ok(bytes)) => self.current = bytes,
                Ok(Err(e)) => {
                    self.state = PipeState::Failed;
                    return Err(e.into_io());
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return self.finish(),
            }
        }
    }
}
