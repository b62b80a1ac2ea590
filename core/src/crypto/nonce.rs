//! crypto/nonce.rs
//! Deterministic per-chunk nonce.
//!
//! Layout (12 bytes): `prefix` as u32 LE in 0..4, `counter` as u64 LE in 4..12.
//! The prefix is random per stream; the counter is the chunk index. Workers
//! derive nonces independently from `(prefix, index)`.

use crate::constants::NONCE_LEN;
use crate::crypto::types::NonceError;

/// Write the nonce for `counter` under `prefix` into `buf`.
///
/// A negative counter is the exhaustion sentinel and is rejected instead of
/// wrapping into a nonce that was already used.
#[inline]
pub fn compose_nonce(buf: &mut [u8; NONCE_LEN], prefix: u32, counter: i64) -> Result<(), NonceError> {
    if counter < 0 {
        return Err(NonceError::CounterExhausted { counter });
    }
    buf[0..4].copy_from_slice(&prefix.to_le_bytes());
    buf[4..12].copy_from_slice(&(counter as u64).to_le_bytes());
    Ok(())
}

/// Recover `(prefix, counter)` from a composed nonce.
#[inline]
pub fn split_nonce(nonce: &[u8; NONCE_LEN]) -> (u32, u64) {
    let mut p = [0u8; 4];
    let mut c = [0u8; 8];
    p.copy_from_slice(&nonce[0..4]);
    c.copy_from_slice(&nonce[4..12]);
    (u32::from_le_bytes(p), u64::from_le_bytes(c))
}

/// Nonce prefix for a stream: the first four bytes (LE) of the key-wrap nonce.
#[inline]
pub fn nonce_prefix_from(wrap_nonce: &[u8]) -> u32 {
    let mut p = [0u8; 4];
    let n = wrap_nonce.len().min(4);
    p[..n].copy_from_slice(&wrap_nonce[..n]);
    u32::from_le_bytes(p)
}
