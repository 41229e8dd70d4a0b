//! Post-processing cycle.
//!
//! One cycle runs to completion: list completed downloads, keep those the
//! flow owns, map their files, wake the media server, transfer every rule
//! over a single session, clean up fully transferred downloads, then tell
//! the torrent client to forget them.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::cleanup::{CleanupReport, DirectoryCleanupEngine};
use crate::download::Download;
use crate::flow::FlowPlugin;
use crate::mapping::MappingRule;
use crate::metrics;
use crate::torrent_client::TorrentClient;
use crate::transfer::{TransferSession, TransferSink};
use crate::wake::WakeSignal;

use super::error::ProcessorError;
use super::types::{CycleOutcome, CycleReport, DownloadOutcome};

/// Runs post-processing cycles for one flow.
pub struct PostProcessor {
    flow: FlowPlugin,
    torrent_client: Arc<dyn TorrentClient>,
    transfer: Arc<dyn TransferSink>,
    wake: Arc<dyn WakeSignal>,
    cleanup: DirectoryCleanupEngine,
    /// Held for the whole cycle; shared between flows.
    cycle_lock: Arc<Mutex<()>>,
    /// Downloads already cleaned up whose removal from the client failed.
    pending_forget: Mutex<HashSet<i64>>,
}

impl PostProcessor {
    pub fn new(
        flow: FlowPlugin,
        torrent_client: Arc<dyn TorrentClient>,
        transfer: Arc<dyn TransferSink>,
        wake: Arc<dyn WakeSignal>,
    ) -> Self {
        Self {
            flow,
            torrent_client,
            transfer,
            wake,
            cleanup: DirectoryCleanupEngine::new(),
            cycle_lock: Arc::new(Mutex::new(())),
            pending_forget: Mutex::new(HashSet::new()),
        }
    }

    /// Share a cycle lock with other processors so their cycles never overlap.
    pub fn with_cycle_lock(mut self, cycle_lock: Arc<Mutex<()>>) -> Self {
        self.cycle_lock = cycle_lock;
        self
    }

    pub fn flow(&self) -> &FlowPlugin {
        &self.flow
    }

    /// Run one cycle and record its metrics.
    pub async fn run_cycle(&self) -> Result<CycleReport, ProcessorError> {
        let flow = self.flow.kind().as_str();
        let timer = Instant::now();

        let result = self.run_cycle_locked().await;

        metrics::CYCLE_DURATION
            .with_label_values(&[flow])
            .observe(timer.elapsed().as_secs_f64());
        let label = match &result {
            Ok(report) => report.outcome.as_str(),
            Err(_) => "failed",
        };
        metrics::CYCLES_TOTAL.with_label_values(&[flow, label]).inc();

        result
    }

    async fn run_cycle_locked(&self) -> Result<CycleReport, ProcessorError> {
        let _guard = self.cycle_lock.lock().await;

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let flow = self.flow.kind();

        let selected: Vec<Download> = self
            .torrent_client
            .completed_downloads()
            .await?
            .into_iter()
            .filter(|d| self.flow.filter(d))
            .collect();

        info!(
            flow = flow.as_str(),
            %run_id,
            "Found {} {}(s)",
            selected.len(),
            self.flow.category()
        );

        let mut report = CycleReport {
            run_id,
            flow,
            started_at,
            finished_at: started_at,
            outcome: CycleOutcome::Idle,
            woke_media_server: false,
            bytes_transferred: 0,
            downloads: Vec::new(),
            cleanup: None,
        };

        if selected.is_empty() {
            report.finished_at = Utc::now();
            return Ok(report);
        }

        let (already_cleaned, to_process) = self.split_pending_forget(selected).await;

        let planned: Vec<(Download, Vec<MappingRule>)> = to_process
            .into_iter()
            .map(|download| {
                let rules = self.flow.map_files(&download);
                info!(
                    download_id = download.id,
                    name = %download.name,
                    rules = rules.len(),
                    "selected download"
                );
                (download, rules)
            })
            .collect();

        // Pending forgets alone have nothing left to send
        if !planned.is_empty() {
            report.woke_media_server = self.wake_media_server().await;
        }

        let total_rules: usize = planned.iter().map(|(_, rules)| rules.len()).sum();
        let mut session = if total_rules > 0 {
            Some(self.transfer.connect().await?)
        } else {
            None
        };

        let mut outcomes = Vec::with_capacity(planned.len());
        for (download, rules) in &planned {
            let (outcome, bytes) = transfer_download(&mut session, download, rules).await;
            report.bytes_transferred += bytes;
            outcomes.push(outcome);
        }
        drop(session);

        for outcome in outcomes.iter().filter(|o| !o.succeeded()) {
            metrics::DOWNLOADS_FAILED
                .with_label_values(&[flow.as_str()])
                .inc();
            warn!(
                download_id = outcome.id,
                name = %outcome.name,
                error = outcome.error.as_deref().unwrap_or_default(),
                "download not fully transferred, keeping it for the next cycle"
            );
        }

        for ((download, _), outcome) in planned.iter().zip(outcomes.iter_mut()) {
            if !outcome.succeeded() {
                continue;
            }
            self.clean_up(download, &mut report).await?;
            outcome.forgotten = self.forget(download.id).await;
        }
        for download in already_cleaned {
            debug!(download_id = download.id, "retrying removal of cleaned up download");
            let forgotten = self.forget(download.id).await;
            outcomes.push(DownloadOutcome {
                id: download.id,
                name: download.name,
                rules: 0,
                transferred: 0,
                error: None,
                forgotten,
            });
        }

        report.outcome = if outcomes.iter().all(DownloadOutcome::succeeded) {
            CycleOutcome::Success
        } else {
            CycleOutcome::Partial
        };
        report.downloads = outcomes;
        report.finished_at = Utc::now();

        info!(
            flow = flow.as_str(),
            %run_id,
            outcome = report.outcome.as_str(),
            downloads = report.selected_count(),
            failed = report.failed_count(),
            files = report.files_transferred(),
            bytes = report.bytes_transferred,
            "cycle complete"
        );

        Ok(report)
    }

    /// Separate downloads whose data is already gone from those to process.
    async fn split_pending_forget(&self, selected: Vec<Download>) -> (Vec<Download>, Vec<Download>) {
        let pending = self.pending_forget.lock().await;
        if pending.is_empty() {
            return (Vec::new(), selected);
        }
        selected.into_iter().partition(|d| pending.contains(&d.id))
    }

    /// Delete the local data of a fully transferred download.
    ///
    /// A failure still forgets the download: some of its files may already be
    /// gone, so it could never be transferred again.
    async fn clean_up(
        &self,
        download: &Download,
        report: &mut CycleReport,
    ) -> Result<(), ProcessorError> {
        match self.cleanup.cleanup(std::slice::from_ref(download)).await {
            Ok(cleaned) => {
                report
                    .cleanup
                    .get_or_insert_with(CleanupReport::default)
                    .absorb(&cleaned);
                Ok(())
            }
            Err(e) => {
                warn!(
                    download_id = download.id,
                    error = %e,
                    "cleanup failed, removing download from torrent client anyway"
                );
                self.forget(download.id).await;
                Err(e.into())
            }
        }
    }

    async fn wake_media_server(&self) -> bool {
        match self.wake.wake().await {
            Ok(()) => {
                info!(wake = self.wake.name(), "Waking media server");
                true
            }
            Err(e) => {
                warn!(wake = self.wake.name(), error = %e, "failed to wake media server");
                false
            }
        }
    }

    /// Remove a cleaned up download from the torrent client.
    async fn forget(&self, id: i64) -> bool {
        let flow = self.flow.kind().as_str();
        match self.torrent_client.remove_download(id).await {
            Ok(()) => {
                self.pending_forget.lock().await.remove(&id);
                metrics::DOWNLOADS_PROCESSED.with_label_values(&[flow]).inc();
                info!(download_id = id, "removed download from torrent client");
                true
            }
            Err(e) => {
                self.pending_forget.lock().await.insert(id);
                warn!(download_id = id, error = %e, "failed to remove download from torrent client");
                false
            }
        }
    }
}

/// Transfer every rule of one download, stopping at the first failure.
async fn transfer_download(
    session: &mut Option<Box<dyn TransferSession>>,
    download: &Download,
    rules: &[MappingRule],
) -> (DownloadOutcome, u64) {
    let mut outcome = DownloadOutcome {
        id: download.id,
        name: download.name.clone(),
        rules: rules.len(),
        transferred: 0,
        error: None,
        forgotten: false,
    };
    let mut bytes = 0;

    let Some(session) = session.as_mut() else {
        return (outcome, bytes);
    };

    for rule in rules {
        info!(
            download_id = download.id,
            file = %rule.relative_path,
            destination = %rule.destination_path,
            "Transferring file to remote"
        );
        match session.transfer(rule).await {
            Ok(file) => {
                outcome.transferred += 1;
                bytes += file.size_bytes;
            }
            Err(e) => {
                outcome.error = Some(e.to_string());
                break;
            }
        }
    }

    (outcome, bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{FlowConfig, FlowKind};
    use crate::testing::{fixtures, MockTorrentClient, MockTransfer, MockWake};
    use crate::torrent_client::TorrentClientError;
    use crate::transfer::TransferError;

    struct Harness {
        client: Arc<MockTorrentClient>,
        transfer: MockTransfer,
        wake: Arc<MockWake>,
        processor: PostProcessor,
    }

    fn harness(kind: FlowKind, tag: &str, downloads: Vec<Download>) -> Harness {
        let client = Arc::new(MockTorrentClient::with_downloads(downloads));
        let transfer = MockTransfer::new();
        let wake = Arc::new(MockWake::new());
        let processor = PostProcessor::new(
            FlowPlugin::new(kind, FlowConfig::new(tag)),
            client.clone(),
            Arc::new(transfer.clone()),
            wake.clone(),
        );
        Harness {
            client,
            transfer,
            wake,
            processor,
        }
    }

    #[tokio::test]
    async fn test_idle_cycle_does_not_wake() {
        let h = harness(
            FlowKind::Movies,
            "/nonexistent/movies",
            vec![fixtures::download(1, "/nonexistent/tv/Show/1", &[("e.mkv", 1)])],
        );

        let report = h.processor.run_cycle().await.unwrap();

        assert_eq!(report.outcome, CycleOutcome::Idle);
        assert_eq!(report.selected_count(), 0);
        assert_eq!(h.wake.wake_count(), 0);
        assert_eq!(h.transfer.connection_count().await, 0);
        assert!(h.client.removed_ids().await.is_empty());
    }

    #[tokio::test]
    async fn test_incomplete_downloads_are_ignored() {
        let h = harness(
            FlowKind::Default,
            "/nonexistent",
            vec![fixtures::partial_download(1, "/nonexistent", &[("a.mkv", 1)])],
        );

        let report = h.processor.run_cycle().await.unwrap();

        assert_eq!(report.outcome, CycleOutcome::Idle);
        assert_eq!(h.wake.wake_count(), 0);
    }

    #[tokio::test]
    async fn test_cycle_transfers_and_forgets() {
        // Files do not exist locally, so cleanup has nothing to delete.
        let h = harness(
            FlowKind::Movies,
            "/nonexistent/movies",
            vec![fixtures::movie_release(7, "/nonexistent/movies")],
        );

        let report = h.processor.run_cycle().await.unwrap();

        assert_eq!(report.outcome, CycleOutcome::Success);
        assert!(report.woke_media_server);
        assert_eq!(h.wake.wake_count(), 1);
        assert_eq!(h.transfer.connection_count().await, 1);
        assert_eq!(
            h.transfer.destinations().await,
            vec![
                "movies/Movie.2019.1080p/Movie.2019.1080p.mkv",
                "movies/Movie.2019.1080p/Subs/English (SDH).srt",
                "movies/Movie.2019.1080p/Subs/English.srt",
                "movies/Movie.2019.1080p/English.srt",
            ]
        );
        assert_eq!(h.client.removed_ids().await, vec![7]);
        assert!(report.downloads[0].forgotten);
        assert_eq!(report.cleanup.as_ref().unwrap().files_removed, 0);
    }

    #[tokio::test]
    async fn test_failed_transfer_keeps_download() {
        let h = harness(
            FlowKind::Default,
            "/nonexistent",
            vec![
                fixtures::download(1, "/nonexistent", &[("a/one.mkv", 1), ("a/two.mkv", 1)]),
                fixtures::download(2, "/nonexistent", &[("b/three.mkv", 1)]),
            ],
        );
        h.transfer.fail_source("/nonexistent/a/one.mkv").await;

        let report = h.processor.run_cycle().await.unwrap();

        assert_eq!(report.outcome, CycleOutcome::Partial);
        assert_eq!(report.failed_count(), 1);
        assert!(!report.downloads[0].succeeded());
        assert_eq!(report.downloads[0].transferred, 0);
        assert!(!report.downloads[0].forgotten);
        assert!(report.downloads[1].forgotten);
        assert_eq!(h.client.removed_ids().await, vec![2]);
        assert_eq!(h.transfer.destinations().await, vec!["downloads/b/three.mkv"]);
    }

    #[tokio::test]
    async fn test_unreachable_destination_fails_cycle() {
        let h = harness(
            FlowKind::Default,
            "/nonexistent",
            vec![fixtures::download(1, "/nonexistent", &[("a.mkv", 1)])],
        );
        h.transfer.set_unreachable(true).await;

        let result = h.processor.run_cycle().await;

        assert!(matches!(
            result,
            Err(ProcessorError::Transfer(TransferError::ConnectionExhausted { .. }))
        ));
        assert_eq!(h.wake.wake_count(), 1);
        assert!(h.client.removed_ids().await.is_empty());
    }

    #[tokio::test]
    async fn test_wake_failure_does_not_abort() {
        let h = harness(
            FlowKind::Default,
            "/nonexistent",
            vec![fixtures::download(1, "/nonexistent", &[("a.mkv", 1)])],
        );
        h.wake.set_failing(true);

        let report = h.processor.run_cycle().await.unwrap();

        assert!(!report.woke_media_server);
        assert_eq!(report.outcome, CycleOutcome::Success);
        assert_eq!(h.client.removed_ids().await, vec![1]);
    }

    #[tokio::test]
    async fn test_download_without_rules_skips_connect() {
        let h = harness(
            FlowKind::Movies,
            "/nonexistent/movies",
            vec![fixtures::download(1, "/nonexistent/movies", &[("release.nfo", 1)])],
        );

        let report = h.processor.run_cycle().await.unwrap();

        assert_eq!(report.outcome, CycleOutcome::Success);
        assert_eq!(h.wake.wake_count(), 1);
        assert_eq!(h.transfer.connection_count().await, 0);
        assert_eq!(h.client.removed_ids().await, vec![1]);
    }

    #[tokio::test]
    async fn test_list_error_fails_cycle() {
        let h = harness(FlowKind::Default, "/nonexistent", vec![]);
        h.client
            .set_next_list_error(TorrentClientError::Timeout)
            .await;

        let result = h.processor.run_cycle().await;
        assert!(matches!(result, Err(ProcessorError::TorrentClient(_))));
    }

    #[tokio::test]
    async fn test_failed_forget_is_retried_without_transfer() {
        let h = harness(
            FlowKind::Default,
            "/nonexistent",
            vec![fixtures::download(3, "/nonexistent", &[("a.mkv", 1)])],
        );
        h.client.set_fail_removals(true).await;

        let first = h.processor.run_cycle().await.unwrap();
        assert!(!first.downloads[0].forgotten);
        assert_eq!(h.transfer.transferred().await.len(), 1);
        assert_eq!(h.wake.wake_count(), 1);

        h.client.set_fail_removals(false).await;
        let second = h.processor.run_cycle().await.unwrap();

        assert!(second.downloads[0].forgotten);
        // nothing to transfer, so the media server is left asleep
        assert!(!second.woke_media_server);
        assert_eq!(h.wake.wake_count(), 1);
        assert_eq!(h.transfer.connection_count().await, 1);
        assert_eq!(h.transfer.transferred().await.len(), 1);
        assert_eq!(h.client.removed_ids().await, vec![3, 3]);
        assert_eq!(h.client.download_count().await, 0);
    }

    #[tokio::test]
    async fn test_shared_cycle_lock_serializes_flows() {
        let lock = Arc::new(Mutex::new(()));
        let h = harness(FlowKind::Default, "/nonexistent", vec![]);
        let processor = h.processor.with_cycle_lock(lock.clone());

        let guard = lock.lock().await;
        let cycle = tokio::spawn(async move { processor.run_cycle().await.map(|r| r.outcome) });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert!(!cycle.is_finished());

        drop(guard);
        let outcome = cycle.await.unwrap();
        tokio_test::assert_ok!(&outcome);
    }
}
