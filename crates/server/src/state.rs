use std::sync::Arc;
use plexpost_core::{Config, FlowScheduler, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    scheduler: Arc<FlowScheduler>,
}

impl AppState {
    pub fn new(config: Config, scheduler: Arc<FlowScheduler>) -> Self {
        Self { config, scheduler }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn scheduler(&self) -> &FlowScheduler {
        self.scheduler.as_ref()
    }
}
