//! Home Assistant switch wake signal.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{WakeError, WakeSignal};

/// Home Assistant connection and the switch that powers the media server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeAssistantConfig {
    /// Base URL, e.g. `http://homeassistant.local:8123`.
    pub url: String,
    /// Long-lived access token.
    pub token: String,
    /// Switch entity id without the `switch.` domain.
    pub htpc_switch: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u32,
}

fn default_timeout_secs() -> u32 {
    10
}

/// Turns on a Home Assistant switch entity.
pub struct HomeAssistantSwitch {
    client: Client,
    config: HomeAssistantConfig,
}

impl HomeAssistantSwitch {
    pub fn new(config: HomeAssistantConfig) -> Result<Self, WakeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| WakeError::ClientBuild(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn turn_on_url(&self) -> String {
        format!(
            "{}/api/services/switch/turn_on",
            self.config.url.trim_end_matches('/')
        )
    }

    fn entity_id(&self) -> String {
        format!("switch.{}", self.config.htpc_switch)
    }
}

#[async_trait]
impl WakeSignal for HomeAssistantSwitch {
    fn name(&self) -> &str {
        "home_assistant"
    }

    async fn wake(&self) -> Result<(), WakeError> {
        let entity_id = self.entity_id();
        debug!(%entity_id, "turning on media server switch");

        let response = self
            .client
            .post(self.turn_on_url())
            .bearer_auth(&self.config.token)
            .json(&serde_json::json!({ "entity_id": entity_id }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    WakeError::Timeout
                } else {
                    WakeError::RequestFailed(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(WakeError::Rejected {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        Ok(())
    }
}
