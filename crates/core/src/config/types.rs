use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::flow::{FlowConfig, FlowKind};
use crate::transfer::{SftpConfig, TransferConfig};
use crate::wake::HomeAssistantConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub transmission: TransmissionConfig,
    /// Transfer onto a mounted share. Exactly one of `transfer` and `sftp`
    /// must be set.
    #[serde(default)]
    pub transfer: Option<TransferConfig>,
    /// Transfer over SFTP.
    #[serde(default)]
    pub sftp: Option<SftpConfig>,
    /// Wake switch for the media server; no wake signal is sent when absent.
    #[serde(default)]
    pub home_assistant: Option<HomeAssistantConfig>,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub flows: FlowsConfig,
}

/// Transmission RPC configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TransmissionConfig {
    /// RPC endpoint (e.g., "http://localhost:9091/transmission/rpc")
    #[serde(default = "default_transmission_url")]
    pub url: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for TransmissionConfig {
    fn default() -> Self {
        Self {
            url: default_transmission_url(),
            username: None,
            password: None,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_transmission_url() -> String {
    "http://localhost:9091/transmission/rpc".to_string()
}

fn default_timeout() -> u32 {
    30
}

/// Periodic run configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerConfig {
    /// Seconds between two cycles of the same flow
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
        }
    }
}

fn default_interval() -> u64 {
    60
}

/// Status API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_host() -> IpAddr {
    IpAddr::from([127, 0, 0, 1])
}

fn default_port() -> u16 {
    8085
}

/// Flows to run. Each one is optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FlowsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<FlowConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movies: Option<FlowConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tv: Option<FlowConfig>,
}

impl FlowsConfig {
    pub fn get(&self, kind: FlowKind) -> Option<&FlowConfig> {
        match kind {
            FlowKind::Default => self.default.as_ref(),
            FlowKind::Movies => self.movies.as_ref(),
            FlowKind::Tv => self.tv.as_ref(),
        }
    }

    /// Configured flows in `default`, `movies`, `tv` order.
    pub fn configured(&self) -> Vec<(FlowKind, FlowConfig)> {
        FlowKind::ALL
            .into_iter()
            .filter_map(|kind| self.get(kind).map(|c| (kind, c.clone())))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.default.is_none() && self.movies.is_none() && self.tv.is_none()
    }
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub transmission: SanitizedTransmissionConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer: Option<TransferConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sftp: Option<SftpConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_assistant: Option<SanitizedHomeAssistantConfig>,
    pub scheduler: SchedulerConfig,
    pub server: ServerConfig,
    pub flows: FlowsConfig,
}

/// Sanitized Transmission config (password hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTransmissionConfig {
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub password_configured: bool,
    pub timeout_secs: u32,
}

/// Sanitized Home Assistant config (token hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedHomeAssistantConfig {
    pub url: String,
    pub htpc_switch: String,
    pub token_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            transmission: SanitizedTransmissionConfig {
                url: config.transmission.url.clone(),
                username: config.transmission.username.clone(),
                password_configured: config
                    .transmission
                    .password
                    .as_ref()
                    .is_some_and(|p| !p.is_empty()),
                timeout_secs: config.transmission.timeout_secs,
            },
            transfer: config.transfer.clone(),
            sftp: config.sftp.clone(),
            home_assistant: config
                .home_assistant
                .as_ref()
                .map(|ha| SanitizedHomeAssistantConfig {
                    url: ha.url.clone(),
                    htpc_switch: ha.htpc_switch.clone(),
                    token_configured: !ha.token.is_empty(),
                }),
            scheduler: config.scheduler.clone(),
            server: config.server.clone(),
            flows: config.flows.clone(),
        }
    }
}
