//! Removal of local download data after transfer.
//!
//! Files listed by a download are deleted first, then every directory they
//! lived in is removed deepest first. A directory that still holds anything
//! (for example a file placed there by hand) is left alone, and so are its
//! parents.

mod engine;
mod error;

pub use engine::{list_unique_directories_depth_first, CleanupReport, DirectoryCleanupEngine};
pub use error::CleanupError;
