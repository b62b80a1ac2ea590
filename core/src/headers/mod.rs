//! headers/mod.rs
//! Self-describing binary header used in two modes.
//!
//! - Stream header (written once per stream): carries the declared plaintext
//!   length, key id, key-wrap nonce and tag, and the wrapped data key.
//! - Compact chunk header (one per chunk): carries the chunk length, key id and
//!   GCM tag. The nonce is omitted and rebuilt from the stream prefix and index.
//!
//! Both modes share one struct and one codec; the mode is selected by the
//! expected field sizes in [`HeaderLayout`].

pub mod types;
pub mod encode;
pub mod decode;

pub use types::*;
pub use encode::*;
pub use decode::*;
