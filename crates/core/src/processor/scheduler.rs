//! Periodic scheduling of post-processing cycles.
//!
//! Each configured flow gets its own loop task. Loops stop on the shutdown
//! broadcast; a cycle already in progress is allowed to finish.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::flow::FlowKind;

use super::cycle::PostProcessor;
use super::error::ProcessorError;
use super::types::{CycleReport, FlowStatus};

/// Runs every flow's cycle on a fixed interval.
pub struct FlowScheduler {
    processors: Vec<Arc<PostProcessor>>,
    interval: Duration,
    statuses: Arc<RwLock<HashMap<FlowKind, FlowStatus>>>,
    running: Arc<AtomicBool>,
    shutdown_tx: broadcast::Sender<()>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl FlowScheduler {
    /// Create a scheduler. The processors should share one cycle lock.
    pub fn new(processors: Vec<PostProcessor>, interval: Duration) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        let statuses = processors
            .iter()
            .map(|p| {
                let flow = p.flow();
                (
                    flow.kind(),
                    FlowStatus {
                        flow: flow.kind(),
                        category: flow.category().to_string(),
                        download_dir_tag: flow.download_dir_tag().to_string(),
                        running: false,
                        cycles_run: 0,
                        last_run_at: None,
                        last_report: None,
                        last_error: None,
                    },
                )
            })
            .collect();

        Self {
            processors: processors.into_iter().map(Arc::new).collect(),
            interval,
            statuses: Arc::new(RwLock::new(statuses)),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Flows handled by this scheduler.
    pub fn flows(&self) -> Vec<FlowKind> {
        self.processors.iter().map(|p| p.flow().kind()).collect()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Start one loop task per flow.
    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            warn!("Scheduler already running");
            return;
        }

        let mut handles = self.handles.lock().await;
        for processor in &self.processors {
            handles.push(self.spawn_flow_loop(Arc::clone(processor)));
        }

        info!(
            flows = self.processors.len(),
            interval_secs = self.interval.as_secs(),
            "Scheduler started"
        );
    }

    /// Stop every loop and wait for in-flight cycles to finish.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            warn!("Scheduler not running");
            return;
        }

        info!("Stopping scheduler");
        let _ = self.shutdown_tx.send(());

        let handles: Vec<_> = self.handles.lock().await.drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                error!("Flow loop task failed: {}", e);
            }
        }

        info!("Scheduler stopped");
    }

    /// Run one cycle of a flow now, outside of its schedule.
    pub async fn run_now(&self, kind: FlowKind) -> Result<CycleReport, ProcessorError> {
        let processor = self
            .processors
            .iter()
            .find(|p| p.flow().kind() == kind)
            .ok_or_else(|| ProcessorError::FlowNotConfigured(kind.as_str().to_string()))?;

        Self::run_and_record(processor, &self.statuses).await
    }

    /// Status of every flow, in configuration order.
    pub async fn status(&self) -> Vec<FlowStatus> {
        let statuses = self.statuses.read().await;
        self.flows()
            .into_iter()
            .filter_map(|kind| statuses.get(&kind).cloned())
            .collect()
    }

    fn spawn_flow_loop(&self, processor: Arc<PostProcessor>) -> JoinHandle<()> {
        let statuses = Arc::clone(&self.statuses);
        let running = Arc::clone(&self.running);
        let interval = self.interval;
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let flow = processor.flow().kind().as_str();

        tokio::spawn(async move {
            info!(flow, "Flow loop started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!(flow, "Flow loop received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        if !running.load(Ordering::Relaxed) {
                            break;
                        }
                        // Errors are recorded in the flow status
                        let _ = Self::run_and_record(&processor, &statuses).await;
                    }
                }
            }
            info!(flow, "Flow loop stopped");
        })
    }

    async fn run_and_record(
        processor: &PostProcessor,
        statuses: &RwLock<HashMap<FlowKind, FlowStatus>>,
    ) -> Result<CycleReport, ProcessorError> {
        let kind = processor.flow().kind();
        if let Some(status) = statuses.write().await.get_mut(&kind) {
            status.running = true;
        }

        let result = processor.run_cycle().await;

        if let Err(e) = &result {
            error!(flow = kind.as_str(), error = %e, "Cycle failed");
        }

        if let Some(status) = statuses.write().await.get_mut(&kind) {
            status.running = false;
            status.cycles_run += 1;
            status.last_run_at = Some(Utc::now());
            match &result {
                Ok(report) => {
                    status.last_report = Some(report.clone());
                    status.last_error = None;
                }
                Err(e) => status.last_error = Some(e.to_string()),
            }
        }

        result
    }
}
