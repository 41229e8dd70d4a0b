//! Snapshots of completed torrent downloads.
//!
//! A `Download` is read fresh from the torrent client on every cycle and is
//! never mutated by the mapping or cleanup code.

mod types;

pub use types::*;
