//! Classification and destination mapping of download files.
//!
//! - [`classify`]: extension based video/subtitle detection
//! - [`subtitle`]: language/SDH ranking of subtitle files
//! - [`sidecar`]: main video selection and subtitle sidecar placement
//!
//! Everything in this module is pure: no filesystem or network access.

pub mod classify;
pub mod sidecar;
pub mod subtitle;
mod types;

pub use classify::{classify, extension, file_name, is_subtitle, is_video, parent_dir, FileKind};
pub use sidecar::{map_single_video_with_subtitles, select_main_video};
pub use subtitle::{best_subtitle, rank, rank_candidates, RankedSubtitle, SubtitleCandidate};
pub use types::MappingRule;
