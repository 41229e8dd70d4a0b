//! Waking the media server before a transfer.
//!
//! The media server may be powered down between cycles. When a cycle selects
//! at least one download, the processor fires a [`WakeSignal`] and then relies
//! on the transfer's connection retry to wait for the machine to come up.

mod error;
mod home_assistant;

pub use error::WakeError;
pub use home_assistant::{HomeAssistantConfig, HomeAssistantSwitch};

use async_trait::async_trait;

/// Something that can power on the media server.
#[async_trait]
pub trait WakeSignal: Send + Sync {
    /// Returns the name of this wake implementation.
    fn name(&self) -> &str;

    /// Asks for the media server to be turned on. Does not wait for it.
    async fn wake(&self) -> Result<(), WakeError>;
}

/// Wake signal for media servers that are always on.
#[derive(Debug, Clone, Default)]
pub struct NoopWake;

#[async_trait]
impl WakeSignal for NoopWake {
    fn name(&self) -> &str {
        "noop"
    }

    async fn wake(&self) -> Result<(), WakeError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_wake() {
        let wake = NoopWake;
        assert_eq!(wake.name(), "noop");
        assert!(wake.wake().await.is_ok());
    }
}
