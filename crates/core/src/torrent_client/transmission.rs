//! Transmission torrent client implementation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::TransmissionConfig;
use crate::download::{Download, DownloadFile};

use super::{TorrentClient, TorrentClientError};

/// Header carrying Transmission's CSRF token.
const SESSION_ID_HEADER: &str = "X-Transmission-Session-Id";

/// Fields requested from `torrent-get`.
const TORRENT_FIELDS: [&str; 5] = ["id", "name", "downloadDir", "percentDone", "files"];

/// Transmission client implementation.
pub struct TransmissionClient {
    client: Client,
    config: TransmissionConfig,
    /// Session id handed out by the daemon (refreshed on HTTP 409).
    session_id: Arc<RwLock<Option<String>>>,
}

impl TransmissionClient {
    /// Create a new Transmission client.
    pub fn new(config: TransmissionConfig) -> Result<Self, TorrentClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .map_err(|e| TorrentClientError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            config,
            session_id: Arc::new(RwLock::new(None)),
        })
    }

    async fn send(&self, body: &Value) -> Result<Response, TorrentClientError> {
        let mut request = self.client.post(&self.config.url).json(body);
        if let Some(username) = &self.config.username {
            request = request.basic_auth(username, self.config.password.as_deref());
        }
        if let Some(session_id) = self.session_id.read().await.as_deref() {
            request = request.header(SESSION_ID_HEADER, session_id);
        }

        request.send().await.map_err(|e| {
            if e.is_timeout() {
                TorrentClientError::Timeout
            } else if e.is_connect() {
                TorrentClientError::ConnectionFailed(e.to_string())
            } else {
                TorrentClientError::ApiError(e.to_string())
            }
        })
    }

    /// Call an RPC method and return its `arguments` object.
    async fn rpc(&self, method: &str, arguments: Value) -> Result<Value, TorrentClientError> {
        let body = json!({ "method": method, "arguments": arguments });

        let mut response = self.send(&body).await?;
        if response.status() == StatusCode::CONFLICT {
            let session_id = response
                .headers()
                .get(SESSION_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
                .ok_or_else(|| {
                    TorrentClientError::InvalidResponse(
                        "409 response without session id".to_string(),
                    )
                })?;
            debug!("Transmission session id refreshed");
            *self.session_id.write().await = Some(session_id);

            // Retry the request
            response = self.send(&body).await?;
        }

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(TorrentClientError::AuthenticationFailed(
                "Invalid credentials".to_string(),
            ));
        }
        if !status.is_success() {
            return Err(TorrentClientError::ApiError(format!("HTTP {}", status)));
        }

        let text = response
            .text()
            .await
            .map_err(|e| TorrentClientError::ApiError(e.to_string()))?;
        parse_rpc_response(&text)
    }
}

/// `torrent-get` entry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcTorrent {
    id: i64,
    name: String,
    download_dir: String,
    percent_done: f64,
    #[serde(default)]
    files: Vec<RpcFile>,
}

#[derive(Debug, Deserialize)]
struct RpcFile {
    name: String,
    length: u64,
}

impl RpcTorrent {
    fn into_download(self) -> Download {
        Download {
            id: self.id,
            name: self.name,
            source_directory: self.download_dir.trim_end_matches('/').to_string(),
            progress_percent: self.percent_done * 100.0,
            files: self
                .files
                .into_iter()
                .map(|f| DownloadFile::new(f.name, f.length))
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct TorrentGetArguments {
    torrents: Vec<RpcTorrent>,
}

/// Checks the `result` field and extracts `arguments`.
fn parse_rpc_response(text: &str) -> Result<Value, TorrentClientError> {
    let response: RpcResponse = serde_json::from_str(text)
        .map_err(|e| TorrentClientError::InvalidResponse(e.to_string()))?;

    if response.result != "success" {
        return Err(TorrentClientError::ApiError(response.result));
    }
    Ok(response.arguments)
}

fn parse_torrent_get(arguments: Value) -> Result<Vec<Download>, TorrentClientError> {
    let arguments: TorrentGetArguments = serde_json::from_value(arguments)
        .map_err(|e| TorrentClientError::InvalidResponse(e.to_string()))?;

    Ok(arguments
        .torrents
        .into_iter()
        .map(RpcTorrent::into_download)
        .collect())
}

#[async_trait]
impl TorrentClient for TransmissionClient {
    fn name(&self) -> &str {
        "transmission"
    }

    async fn list_downloads(&self) -> Result<Vec<Download>, TorrentClientError> {
        let arguments = self
            .rpc("torrent-get", json!({ "fields": TORRENT_FIELDS }))
            .await?;
        let downloads = parse_torrent_get(arguments)?;
        debug!(count = downloads.len(), "listed downloads");
        Ok(downloads)
    }

    async fn remove_download(&self, id: i64) -> Result<(), TorrentClientError> {
        self.rpc(
            "torrent-remove",
            json!({ "ids": [id], "delete-local-data": false }),
        )
        .await
        .inspect_err(|e| warn!(download_id = id, error = %e, "failed to remove download"))?;
        Ok(())
    }
}
