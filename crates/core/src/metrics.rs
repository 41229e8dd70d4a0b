//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Post-processing cycles (duration, downloads processed/failed)
//! - Transfers (files, bytes, failures, connection attempts)
//! - Cleanup (directories removed)
//!
//! Metrics are registered with a registry by the binary via [`register_core_metrics`].

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};

// =============================================================================
// Cycle Metrics
// =============================================================================

/// Post-processing cycles run, by flow and result.
pub static CYCLES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("plexpost_cycles_total", "Total post-processing cycles"),
        &["flow", "result"], // "success", "partial", "failed"
    )
    .unwrap()
});

/// Cycle duration in seconds.
pub static CYCLE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "plexpost_cycle_duration_seconds",
            "Duration of a post-processing cycle",
        )
        .buckets(vec![0.1, 0.5, 1.0, 5.0, 30.0, 60.0, 300.0, 900.0, 3600.0]),
        &["flow"],
    )
    .unwrap()
});

/// Downloads fully transferred and cleaned up, by flow.
pub static DOWNLOADS_PROCESSED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "plexpost_downloads_processed_total",
            "Downloads transferred, cleaned up and removed from the client",
        ),
        &["flow"],
    )
    .unwrap()
});

/// Downloads left in place because a transfer failed, by flow.
pub static DOWNLOADS_FAILED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "plexpost_downloads_failed_total",
            "Downloads skipped because at least one file failed to transfer",
        ),
        &["flow"],
    )
    .unwrap()
});

// =============================================================================
// Transfer Metrics
// =============================================================================

/// Files transferred total.
pub static FILES_TRANSFERRED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("plexpost_files_transferred_total", "Total files transferred").unwrap()
});

/// Bytes transferred total.
pub static BYTES_TRANSFERRED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("plexpost_bytes_transferred_total", "Total bytes transferred").unwrap()
});

/// Failed file transfers total.
pub static TRANSFER_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "plexpost_transfer_failures_total",
        "Total file transfers that failed",
    )
    .unwrap()
});

/// Connection attempts to the transfer destination, by result.
pub static CONNECTION_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "plexpost_transfer_connection_attempts_total",
            "Attempts to reach the transfer destination",
        ),
        &["result"], // "connected", "unavailable"
    )
    .unwrap()
});

// =============================================================================
// Cleanup Metrics
// =============================================================================

/// Directories removed by cleanup.
pub static DIRECTORIES_REMOVED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "plexpost_directories_removed_total",
        "Empty download directories removed",
    )
    .unwrap()
});

/// Register all core metrics with the given registry.
pub fn register_core_metrics(registry: &Registry) {
    registry.register(Box::new(CYCLES_TOTAL.clone())).ok();
    registry.register(Box::new(CYCLE_DURATION.clone())).ok();
    registry.register(Box::new(DOWNLOADS_PROCESSED.clone())).ok();
    registry.register(Box::new(DOWNLOADS_FAILED.clone())).ok();
    registry.register(Box::new(FILES_TRANSFERRED.clone())).ok();
    registry.register(Box::new(BYTES_TRANSFERRED.clone())).ok();
    registry.register(Box::new(TRANSFER_FAILURES.clone())).ok();
    registry.register(Box::new(CONNECTION_ATTEMPTS.clone())).ok();
    registry.register(Box::new(DIRECTORIES_REMOVED.clone())).ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_core_metrics() {
        let registry = Registry::new();
        register_core_metrics(&registry);

        CYCLES_TOTAL.with_label_values(&["movies", "success"]).inc();
        FILES_TRANSFERRED.inc();

        let names: Vec<String> = registry
            .gather()
            .iter()
            .map(|mf| mf.get_name().to_string())
            .collect();
        assert!(names.contains(&"plexpost_cycles_total".to_string()));
        assert!(names.contains(&"plexpost_files_transferred_total".to_string()));
    }
}
