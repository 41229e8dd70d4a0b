//! Types for the processor module.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::cleanup::CleanupReport;
use crate::flow::FlowKind;

/// How a cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleOutcome {
    /// No completed download belonged to the flow.
    Idle,
    /// Every selected download was transferred and cleaned up.
    Success,
    /// At least one selected download failed to transfer.
    Partial,
}

impl CycleOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CycleOutcome::Idle => "idle",
            CycleOutcome::Success => "success",
            CycleOutcome::Partial => "partial",
        }
    }
}

/// What happened to one selected download during a cycle.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadOutcome {
    pub id: i64,
    pub name: String,
    /// Number of mapping rules produced for the download.
    pub rules: usize,
    /// Rules that reached the destination.
    pub transferred: usize,
    /// First transfer error, if any. Failed downloads are retried next cycle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Whether the torrent client was told to forget the download.
    pub forgotten: bool,
}

impl DownloadOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary of a post-processing cycle.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub run_id: Uuid,
    pub flow: FlowKind,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: CycleOutcome,
    /// Whether the media server wake signal was sent successfully.
    pub woke_media_server: bool,
    pub bytes_transferred: u64,
    pub downloads: Vec<DownloadOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cleanup: Option<CleanupReport>,
}

impl CycleReport {
    pub fn selected_count(&self) -> usize {
        self.downloads.len()
    }

    pub fn failed_count(&self) -> usize {
        self.downloads.iter().filter(|d| !d.succeeded()).count()
    }

    pub fn files_transferred(&self) -> usize {
        self.downloads.iter().map(|d| d.transferred).sum()
    }
}

/// Status of a scheduled flow, as reported by the API.
#[derive(Debug, Clone, Serialize)]
pub struct FlowStatus {
    pub flow: FlowKind,
    /// Content label, e.g. "movie".
    pub category: String,
    pub download_dir_tag: String,
    /// Whether a cycle of this flow is in progress.
    pub running: bool,
    pub cycles_run: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_report: Option<CycleReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}
