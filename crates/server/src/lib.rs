//! HTTP status API for the plexpost daemon.

pub mod api;
pub mod metrics;
pub mod state;
