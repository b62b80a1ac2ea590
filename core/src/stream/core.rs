//! stream/core.rs
//! Stable public API: `StreamCipher` and its configuration.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CHUNK_SIZE, DEFAULT_PIPE_CAPACITY, MAX_PIPE_CAPACITY};
use crate::crypto::MasterKey;
use crate::stream::cancel::CancelToken;
use crate::stream::io::{open_input, InputSource};
use crate::stream::parallelism::ParallelismProfile;
use crate::stream::pipe::PipeReader;
use crate::stream::pipeline::{run_decrypt_pipeline, run_encrypt_pipeline, validate_chunk_size};
use crate::telemetry::TelemetrySnapshot;
use crate::types::StreamError;

/// Engine tuning. Every field is optional; `None` falls back to the default.
///
/// ```json
/// { "workers": 4, "inflight_chunks": 16, "pipe_capacity": 8, "chunk_size": 1048576 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CipherConfig {
    /// Chunk crypto workers. Default: available cores.
    pub workers: Option<usize>,
    /// Reassembly window. Default: `workers * 4`.
    pub inflight_chunks: Option<usize>,
    /// Slots in the stream-returning pipe. Default: 8.
    pub pipe_capacity: Option<usize>,
    /// Encryption chunk size. Default: 1 MiB.
    pub chunk_size: Option<usize>,
}

impl CipherConfig {
    pub fn from_json(json: &str) -> Result<Self, StreamError> {
        let config: CipherConfig = serde_json::from_str(json)
            .map_err(|e| StreamError::Configuration(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), StreamError> {
        self.profile().validate()?;
        let capacity = self.pipe_capacity();
        if capacity == 0 || capacity > MAX_PIPE_CAPACITY {
            return Err(StreamError::Configuration(format!(
                "pipe capacity {capacity} outside [1, {MAX_PIPE_CAPACITY}]"
            )));
        }
        validate_chunk_size(self.chunk_size())
    }

    pub fn profile(&self) -> ParallelismProfile {
        let base = match self.workers {
            Some(n) => ParallelismProfile::new(n),
            None => ParallelismProfile::dynamic(),
        };
        match self.inflight_chunks {
            Some(window) => base.with_inflight(window),
            None => base,
        }
    }

    pub fn pipe_capacity(&self) -> usize {
        self.pipe_capacity.unwrap_or(DEFAULT_PIPE_CAPACITY)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE)
    }
}

/// Chunked AES-256-GCM stream cipher bound to one master key and key id.
///
/// Each encryption draws a fresh data key, wraps it under the master key and
/// writes it into the stream header; decryption reverses that. Chunk crypto
/// runs on `profile.worker_count` threads with output kept in input order.
#[derive(Debug, Clone)]
pub struct StreamCipher {
    master: MasterKey,
    profile: ParallelismProfile,
    pipe_capacity: usize,
    chunk_size: usize,
}

impl StreamCipher {
    /// Fails with `Configuration` unless the key is 32 bytes and `key_id > 0`.
    pub fn new(master_key: &[u8], key_id: i32) -> Result<Self, StreamError> {
        Ok(Self::from_master_key(MasterKey::new(key_id, master_key)?))
    }

    pub fn from_master_key(master: MasterKey) -> Self {
        Self {
            master,
            profile: ParallelismProfile::dynamic(),
            pipe_capacity: DEFAULT_PIPE_CAPACITY,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_config(mut self, config: &CipherConfig) -> Result<Self, StreamError> {
        config.validate()?;
        self.profile = config.profile();
        self.pipe_capacity = config.pipe_capacity();
        self.chunk_size = config.chunk_size();
        Ok(self)
    }

    pub fn with_profile(mut self, profile: ParallelismProfile) -> Result<Self, StreamError> {
        profile.validate()?;
        self.profile = profile;
        Ok(self)
    }

    pub fn key_id(&self) -> i32 {
        self.master.key_id()
    }

    pub fn profile(&self) -> &ParallelismProfile {
        &self.profile
    }

    /// Chunk size from the config, used when a caller passes `None`.
    pub fn default_chunk_size(&self) -> usize {
        self.chunk_size
    }

    // ---------------- stream-to-stream ----------------

    /// Encrypt `input` into `output`. Returns once the last chunk is written.
    pub fn encrypt<W: Write>(
        &self,
        input: impl Into<InputSource>,
        output: W,
        chunk_size: Option<usize>,
        cancel: &CancelToken,
    ) -> Result<TelemetrySnapshot, StreamError> {
        let chunk_size = chunk_size.unwrap_or(self.chunk_size);
        validate_chunk_size(chunk_size)?;
        let (reader, declared) = open_input(input.into())?;
        run_encrypt_pipeline(reader, output, &self.master, chunk_size, declared, &self.profile, cancel)
    }

    /// Decrypt a stream produced by [`encrypt`](Self::encrypt) into `output`.
    ///
    /// Plaintext is written chunk by chunk as each one verifies, so on error
    /// `output` may hold a verified prefix.
    pub fn decrypt<W: Write>(
        &self,
        input: impl Into<InputSource>,
        output: W,
        cancel: &CancelToken,
    ) -> Result<TelemetrySnapshot, StreamError> {
        let (reader, _) = open_input(input.into())?;
        run_decrypt_pipeline(reader, output, &self.master, &self.profile, cancel)
    }

    // ---------------- stream-returning ----------------

    /// Start encryption on a background producer and return the ciphertext as a reader.
    ///
    /// Configuration errors are returned here; everything later arrives through `read`.
    pub fn encrypt_to_reader(
        &self,
        input: impl Into<InputSource>,
        chunk_size: Option<usize>,
        cancel: &CancelToken,
    ) -> Result<PipeReader, StreamError> {
        let chunk_size = chunk_size.unwrap_or(self.chunk_size);
        validate_chunk_size(chunk_size)?;
        cancel.check()?;
        let (reader, declared) = open_input(input.into())?;

        let master = self.master.clone();
        let profile = self.profile.clone();
        let token = cancel.clone();
        PipeReader::spawn("gcmstream-encrypt", self.pipe_capacity, cancel.clone(), move |pipe| {
            run_encrypt_pipeline(reader, pipe, &master, chunk_size, declared, &profile, &token)
                .map(|_| ())
        })
    }

    /// Start decryption on a background producer and return the plaintext as a reader.
    pub fn decrypt_to_reader(
        &self,
        input: impl Into<InputSource>,
        cancel: &CancelToken,
    ) -> Result<PipeReader, StreamError> {
        cancel.check()?;
        let (reader, _) = open_input(input.into())?;

        let master = self.master.clone();
        let profile = self.profile.clone();
        let token = cancel.clone();
        PipeReader::spawn("gcmstream-decrypt", self.pipe_capacity, cancel.clone(), move |pipe| {
            run_decrypt_pipeline(reader, pipe, &master, &profile, &token).map(|_| ())
        })
    }
}
