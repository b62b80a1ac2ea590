//! crypto/mod.rs
//! Two-level key hierarchy and per-chunk AES-256-GCM.
//!
//! - `MasterKey` (caller supplied, bound to a key id) only wraps/unwraps.
//! - `DataKey` (random per stream) encrypts content.
//! - Nonce = stream prefix || chunk index; AAD binds version, key id, index, length.

pub mod types;
pub mod nonce;
pub mod aad;
pub mod keywrap;
pub mod aead;

pub use types::*;
pub use nonce::*;
pub use aad::*;
pub use keywrap::*;
pub use aead::*;
