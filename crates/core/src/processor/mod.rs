//! Post-processing of completed downloads.
//!
//! [`PostProcessor`] runs the cycle for one flow; [`FlowScheduler`] runs
//! every configured flow periodically and on demand.
//!
//! # Example
//!
//! ```ignore
//! use plexpost_core::processor::{FlowScheduler, PostProcessor};
//!
//! let lock = Arc::new(Mutex::new(()));
//! let processor = PostProcessor::new(flow, torrent_client, transfer, wake)
//!     .with_cycle_lock(lock.clone());
//!
//! let scheduler = FlowScheduler::new(vec![processor], Duration::from_secs(60));
//! scheduler.start().await;
//! ```

mod cycle;
mod error;
mod scheduler;
mod types;

pub use cycle::PostProcessor;
pub use error::ProcessorError;
pub use scheduler::FlowScheduler;
pub use types::{CycleOutcome, CycleReport, DownloadOutcome, FlowStatus};
