//! stream/pipeline.rs
//! Encrypt and decrypt state machines over a shared ordered pipeline.
//!
//! ```text
//! reader thread ──jobs──▶ worker pool ──(index, result)──▶ ordered writer (caller thread)
//!       ▲                                                        │
//!       └──────────────────────── credits ◀──────────────────────┘
//! ```
//! - The reader takes one credit per chunk and the writer returns it once that
//!   chunk is written, so at most `inflight_chunks` chunks are alive at once.
//! - The writer releases results strictly in index order through a
//!   `ReorderRing` of the same capacity.
//! - With one worker everything runs on the calling thread.

use std::io::{Read, Write};
use std::thread;

use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender};
use tracing::{debug, trace};

use crate::constants::{CHUNK_HEADER_LEN, MAX_CHUNK_SIZE, MIN_CHUNK_SIZE};
use crate::crypto::{nonce_prefix_from, unwrap_data_key, wrap_data_key, ChunkCodec, MasterKey, NonceError, SealedChunk};
use crate::headers::{decode_header, HeaderLayout};
use crate::stream::cancel::{CancelToken, CANCEL_POLL_INTERVAL};
use crate::stream::io::{read_chunk_frame, read_exact_or_eof, write_chunk_frame};
use crate::stream::parallelism::ParallelismProfile;
use crate::stream::reorder::ReorderRing;
use crate::stream::worker::{run_job, ChunkJob, ChunkResult, ChunkWorker, DecryptJob, EncryptJob};
use crate::telemetry::{TelemetryCounters, TelemetrySnapshot, TelemetryTimer};
use crate::types::StreamError;

/// Reject chunk sizes outside `[MIN_CHUNK_SIZE, MAX_CHUNK_SIZE]`.
pub fn validate_chunk_size(chunk_size: usize) -> Result<(), StreamError> {
    if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&chunk_size) {
        return Err(StreamError::Configuration(format!(
            "chunk size {chunk_size} outside [{MIN_CHUNK_SIZE}, {MAX_CHUNK_SIZE}]"
        )));
    }
    Ok(())
}

// ============================================================
// Encrypt pipeline
// ============================================================

/// Write a stream header, then one `(chunk header, ciphertext)` pair per
/// `chunk_size` slice of `reader`, until EOF.
///
/// `declared_len` is written into the header (0 when `None`). When it is
/// known, reading a different number of bytes fails with `Format`.
pub fn run_encrypt_pipeline<R, W>(
    mut reader: R,
    mut writer: W,
    master: &MasterKey,
    chunk_size: usize,
    declared_len: Option<u64>,
    profile: &ParallelismProfile,
    cancel: &CancelToken,
) -> Result<TelemetrySnapshot, StreamError>
where
    R: Read + Send,
    W: Write,
{
    validate_chunk_size(chunk_size)?;
    profile.validate()?;
    let declared = match declared_len {
        Some(n) => i64::try_from(n)
            .map_err(|_| StreamError::Configuration(format!("declared length {n} exceeds i64")))?,
        None => 0,
    };
    cancel.check()?;

    let timer = TelemetryTimer::new();
    let mut counters = TelemetryCounters::default();
    let key_id = master.key_id();
    debug!(key_id, chunk_size, workers = profile.worker_count, declared, "encrypt pipeline start");

    let (data_key, wrapped) = wrap_data_key(master)?;
    let codec = ChunkCodec::new(&data_key, key_id, nonce_prefix_from(&wrapped.nonce));
    drop(data_key);

    let header = wrapped.to_header(key_id, declared).encode();
    writer.write_all(&header)?;
    counters.add_header(header.len());
    trace!(len = header.len(), "stream header written");

    let mut bytes_read: u64 = 0;
    let produce = |index: i64| -> Result<Option<EncryptJob>, StreamError> {
        let plaintext = read_exact_or_eof(&mut reader, chunk_size)?;
        if plaintext.is_empty() {
            return Ok(None);
        }
        bytes_read += plaintext.len() as u64;
        if let Some(expected) = declared_len {
            if bytes_read > expected {
                return Err(StreamError::Format(format!(
                    "input grew past its declared length {expected}"
                )));
            }
        }
        Ok(Some(EncryptJob { index, plaintext }))
    };

    let sink = |sealed: SealedChunk| -> Result<(), StreamError> {
        let len = sealed.ciphertext.len();
        let written = write_chunk_frame(&mut writer, key_id, &sealed.tag, &sealed.ciphertext)?;
        counters.add_chunk(len, len, written - len);
        trace!(index = sealed.index, len, "chunk written");
        Ok(())
    };

    let chunks = run_ordered(profile, &codec, cancel, produce, sink)?;

    if let Some(expected) = declared_len {
        if bytes_read != expected {
            return Err(StreamError::Format(format!(
                "input ended after {bytes_read} of {expected} declared bytes"
            )));
        }
    }
    writer.flush()?;

    debug!(chunks, bytes = bytes_read, "encrypt pipeline done");
    Ok(TelemetrySnapshot::from(&counters, &timer, profile.worker_count, Some(chunk_size)))
}

// ============================================================
// Decrypt pipeline
// ============================================================

/// Read and unwrap the stream header, then decrypt chunk pairs until EOF.
///
/// Plaintext is written in chunk order as soon as each chunk verifies.
pub fn run_decrypt_pipeline<R, W>(
    mut reader: R,
    mut writer: W,
    master: &MasterKey,
    profile: &ParallelismProfile,
    cancel: &CancelToken,
) -> Result<TelemetrySnapshot, StreamError>
where
    R: Read + Send,
    W: Write,
{
    profile.validate()?;
    cancel.check()?;

    let timer = TelemetryTimer::new();
    let mut counters = TelemetryCounters::default();

    let header = decode_header(&mut reader, HeaderLayout::STREAM)?;
    counters.add_header(header.encoded_len());
    trace!(header = %header.summary(), "stream header read");

    let data_key = unwrap_data_key(master, &header)?;
    if header.data_length < 0 {
        return Err(StreamError::Format(format!("negative declared length {}", header.data_length)));
    }
    let codec = ChunkCodec::new(&data_key, header.key_id, nonce_prefix_from(&header.nonce));
    drop(data_key);

    let key_id = header.key_id;
    let declared = header.data_length as u64;
    debug!(key_id, workers = profile.worker_count, declared, "decrypt pipeline start");

    let produce = |index: i64| -> Result<Option<DecryptJob>, StreamError> {
        let Some((chunk, ciphertext)) = read_chunk_frame(&mut reader, key_id)? else {
            return Ok(None);
        };
        Ok(Some(DecryptJob { index, tag: chunk.tag, declared_len: chunk.data_length, ciphertext }))
    };

    let mut bytes_written: u64 = 0;
    let sink = |plaintext: Vec<u8>| -> Result<(), StreamError> {
        let len = plaintext.len();
        bytes_written += len as u64;
        if declared > 0 && bytes_written > declared {
            return Err(StreamError::Format(format!(
                "stream holds more than its declared {declared} bytes"
            )));
        }
        writer.write_all(&plaintext)?;
        counters.add_chunk(len, len, CHUNK_HEADER_LEN);
        Ok(())
    };

    let chunks = run_ordered(profile, &codec, cancel, produce, sink)?;

    if declared > 0 && bytes_written < declared {
        return Err(StreamError::Truncation(format!(
            "stream ended after {bytes_written} of {declared} declared bytes"
        )));
    }
    writer.flush()?;

    debug!(chunks, bytes = bytes_written, "decrypt pipeline done");
    Ok(TelemetrySnapshot::from(&counters, &timer, profile.worker_count, None))
}

// ============================================================
// Ordered execution
// ============================================================

/// Pull jobs from `produce`, run them on the pool, hand outputs to `sink` in
/// index order. Returns the number of chunks written.
fn run_ordered<J, P, S>(
    profile: &ParallelismProfile,
    codec: &ChunkCodec,
    cancel: &CancelToken,
    produce: P,
    mut sink: S,
) -> Result<i64, StreamError>
where
    J: ChunkJob,
    P: FnMut(i64) -> Result<Option<J>, StreamError> + Send,
    S: FnMut(J::Output) -> Result<(), StreamError>,
{
    if !profile.is_parallel() {
        return run_sequential(codec, cancel, produce, sink);
    }

    let window = profile.inflight_chunks.max(profile.worker_count);
    let stop = CancelToken::new();

    let (job_tx, job_rx) = bounded::<J>(profile.worker_count);
    let (res_tx, res_rx) = bounded::<ChunkResult<J::Output>>(profile.worker_count);
    let (credit_tx, credit_rx) = bounded::<()>(window);
    for _ in 0..window {
        credit_tx
            .send(())
            .map_err(|_| StreamError::Pipeline("credit channel closed"))?;
    }

    let (written, dispatched, workers) = thread::scope(|scope| {
        let reader = {
            let stop = &stop;
            scope.spawn(move || read_jobs(produce, job_tx, credit_rx, cancel, stop))
        };

        let handles: Vec<_> = (0..profile.worker_count)
            .map(|id| {
                let rx = job_rx.clone();
                let tx = res_tx.clone();
                scope.spawn(move || ChunkWorker::new(id, codec, cancel).run(rx, tx))
            })
            .collect();
        drop(job_rx);
        drop(res_tx);

        let written = write_in_order(res_rx, window, cancel, &credit_tx, &mut sink);
        if written.is_err() {
            stop.cancel();
        }
        drop(credit_tx);

        let dispatched = reader
            .join()
            .unwrap_or(Err(StreamError::Pipeline("reader thread panicked")));

        let mut workers = Ok(());
        for handle in handles {
            if handle.join().is_err() {
                workers = Err(StreamError::Pipeline("worker thread panicked"));
            }
        }
        (written, dispatched, workers)
    });

    workers?;
    match (written, dispatched) {
        (Ok(n), Ok(d)) if n == d => Ok(n),
        (Ok(_), Ok(_)) if cancel.is_cancelled() => Err(StreamError::Cancelled),
        (Ok(_), Ok(_)) => Err(StreamError::Pipeline("chunks lost between reader and writer")),
        (Err(_), _) | (Ok(_), Err(_)) if cancel.is_cancelled() => Err(StreamError::Cancelled),
        (Err(e), _) | (Ok(_), Err(e)) => Err(e),
    }
}

fn run_sequential<J, P, S>(
    codec: &ChunkCodec,
    cancel: &CancelToken,
    mut produce: P,
    mut sink: S,
) -> Result<i64, StreamError>
where
    J: ChunkJob,
    P: FnMut(i64) -> Result<Option<J>, StreamError>,
    S: FnMut(J::Output) -> Result<(), StreamError>,
{
    let mut index = 0i64;
    loop {
        cancel.check()?;
        let Some(job) = produce(index)? else { break };
        let out = run_job(job, codec)?;
        cancel.check()?;
        sink(out)?;
        index = next_index(index)?;
    }
    Ok(index)
}

/// Reader loop: sole owner of the input. Returns the number of jobs dispatched.
fn read_jobs<J, P>(
    mut produce: P,
    job_tx: Sender<J>,
    credit_rx: Receiver<()>,
    cancel: &CancelToken,
    stop: &CancelToken,
) -> Result<i64, StreamError>
where
    J: ChunkJob,
    P: FnMut(i64) -> Result<Option<J>, StreamError>,
{
    let mut index = 0i64;
    loop {
        // Wait for a free slot in the in-flight window.
        loop {
            cancel.check()?;
            if stop.is_cancelled() {
                return Ok(index);
            }
            match credit_rx.recv_timeout(CANCEL_POLL_INTERVAL) {
                Ok(()) => break,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => return Ok(index),
            }
        }

        let Some(job) = produce(index)? else { break };
        trace!(index, "chunk dispatched");
        if job_tx.send(job).is_err() {
            break;
        }
        index = next_index(index)?;
    }
    Ok(index)
}

/// Writer loop: sole owner of the output.
fn write_in_order<T, S>(
    res_rx: Receiver<ChunkResult<T>>,
    window: usize,
    cancel: &CancelToken,
    credit_tx: &Sender<()>,
    sink: &mut S,
) -> Result<i64, StreamError>
where
    S: FnMut(T) -> Result<(), StreamError>,
{
    let mut ring = ReorderRing::with_capacity(window);
    for (index, result) in res_rx.iter() {
        cancel.check()?;
        ring.insert(index, result)?;
        while let Some(ready) = ring.pop_ready() {
            sink(ready?)?;
            // The reader may already be gone; a missing receiver is not an error here.
            let _ = credit_tx.try_send(());
        }
    }
    if !ring.is_empty() {
        return Err(StreamError::Pipeline("reassembly ended with missing chunks"));
    }
    Ok(ring.next_index())
}

#[inline]
fn next_index(index: i64) -> Result<i64, StreamError> {
    index
        .checked_add(1)
        .ok_or_else(|| NonceError::CounterExhausted { counter: i64::MIN }.into())
}
