//! Torrent client abstraction.
//!
//! This module provides a `TorrentClient` trait for reading finished
//! downloads and forgetting them once processed. The Transmission backend
//! speaks its JSON-RPC protocol.

mod transmission;
mod types;

pub use transmission::TransmissionClient;
pub use types::*;
