//! Flow plugins decide which downloads they own and where their files go.
//!
//! Three flows exist, each configured with a single download directory tag:
//! - **default**: uncategorised downloads, forwarded untouched to `downloads/`
//! - **movies**: one feature video plus subtitles below `movies/`
//! - **tv**: one episode plus subtitles below `tv/<show>/<season>/`

mod config;
mod plugins;

pub use config::FlowConfig;
pub use plugins::{DefaultFlow, FlowKind, FlowPlugin, MovieFlow, ShowFlow};
