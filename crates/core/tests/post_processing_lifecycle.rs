//! Post-processing lifecycle integration tests.
//!
//! These tests run full cycles against a real file system transfer into a
//! temporary "remote" directory, with mock torrent client and wake signal:
//! - Files land at their mapped destinations, sidecars included
//! - Local data is removed and emptied directories pruned
//! - Downloads are forgotten only after a complete transfer

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::Mutex;

use plexpost_core::{
    testing::{fixtures, MockTorrentClient, MockWake},
    CycleOutcome, FlowConfig, FlowKind, FlowPlugin, FlowScheduler, FsTransfer, PostProcessor,
    ProcessorError, TransferConfig, TransferError,
};

/// Test helper wiring a processor to temp directories.
struct TestHarness {
    downloads_dir: TempDir,
    remote_dir: TempDir,
    client: Arc<MockTorrentClient>,
    wake: Arc<MockWake>,
}

impl TestHarness {
    fn new() -> Self {
        Self {
            downloads_dir: TempDir::new().expect("Failed to create downloads dir"),
            remote_dir: TempDir::new().expect("Failed to create remote dir"),
            client: Arc::new(MockTorrentClient::new()),
            wake: Arc::new(MockWake::new()),
        }
    }

    /// Download directory for a flow, e.g. `<tmp>/movies`.
    fn tag(&self, name: &str) -> String {
        let dir = self.downloads_dir.path().join(name);
        std::fs::create_dir_all(&dir).expect("Failed to create tag dir");
        dir.to_string_lossy().to_string()
    }

    fn processor(&self, kind: FlowKind, tag: &str) -> PostProcessor {
        let transfer = FsTransfer::new(
            TransferConfig::new(self.remote_dir.path())
                .with_connect_attempts(2)
                .with_connect_delay_ms(1)
                .with_verify_checksums(true),
        );
        PostProcessor::new(
            FlowPlugin::new(kind, FlowConfig::new(tag)),
            self.client.clone(),
            Arc::new(transfer),
            self.wake.clone(),
        )
    }

    fn write_files(&self, source_directory: &str, files: &[(&str, u64)]) {
        for (relative, size) in files {
            let path = Path::new(source_directory).join(relative);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, vec![b'x'; *size as usize]).unwrap();
        }
    }

    fn remote(&self, relative: &str) -> std::path::PathBuf {
        self.remote_dir.path().join(relative)
    }
}

const MOVIE_FILES: &[(&str, u64)] = &[
    ("Movie.2019.1080p/Movie.2019.1080p.mkv", 400),
    ("Movie.2019.1080p/Sample/sample.mkv", 40),
    ("Movie.2019.1080p/Subs/English (SDH).srt", 6),
    ("Movie.2019.1080p/Subs/English.srt", 5),
    ("Movie.2019.1080p/Movie.2019.1080p.nfo", 2),
];

#[tokio::test]
async fn test_movie_cycle_end_to_end() {
    let h = TestHarness::new();
    let tag = h.tag("movies");
    h.write_files(&tag, MOVIE_FILES);
    h.client
        .add_download(fixtures::download(1, &tag, MOVIE_FILES))
        .await;

    let report = h.processor(FlowKind::Movies, &tag).run_cycle().await.unwrap();

    assert_eq!(report.outcome, CycleOutcome::Success);
    assert_eq!(h.wake.wake_count(), 1);
    assert_eq!(report.files_transferred(), 4);
    assert_eq!(report.bytes_transferred, 400 + 6 + 5 + 5);

    assert!(h.remote("movies/Movie.2019.1080p/Movie.2019.1080p.mkv").is_file());
    assert!(h.remote("movies/Movie.2019.1080p/Subs/English.srt").is_file());
    assert!(h.remote("movies/Movie.2019.1080p/Subs/English (SDH).srt").is_file());
    assert!(h.remote("movies/Movie.2019.1080p/English.srt").is_file());
    assert!(!h.remote("movies/Movie.2019.1080p/English (SDH).srt").exists());
    assert!(!h.remote("movies/Movie.2019.1080p/Sample").exists());
    assert!(!h.remote("movies/Movie.2019.1080p/Movie.2019.1080p.nfo").exists());

    // Every local file is gone, including the ones not transferred
    assert!(!Path::new(&tag).join("Movie.2019.1080p").exists());
    assert!(Path::new(&tag).is_dir());
    let cleanup = report.cleanup.unwrap();
    assert_eq!(cleanup.files_removed, 5);
    assert_eq!(cleanup.directories_removed, 3);

    assert_eq!(h.client.removed_ids().await, vec![1]);
}

#[tokio::test]
async fn test_show_cycle_places_below_show_and_season() {
    let h = TestHarness::new();
    let tv = h.tag("tv");
    let season_dir = format!("{}/The Simpsons/1", tv);
    let files: &[(&str, u64)] = &[
        ("The.Simpsons.S01E01/episode.mkv", 100),
        ("The.Simpsons.S01E01/episode.en.srt", 3),
    ];
    h.write_files(&season_dir, files);
    h.client
        .add_download(fixtures::download(2, &season_dir, files))
        .await;

    let report = h.processor(FlowKind::Tv, &tv).run_cycle().await.unwrap();

    assert_eq!(report.outcome, CycleOutcome::Success);
    assert!(h.remote("tv/The Simpsons/1/The.Simpsons.S01E01/episode.mkv").is_file());
    assert!(h.remote("tv/The Simpsons/1/The.Simpsons.S01E01/episode.en.srt").is_file());
    // the subtitle already sits next to the video: no extra copy
    assert_eq!(report.files_transferred(), 2);
    assert!(!Path::new(&season_dir).join("The.Simpsons.S01E01").exists());
}

#[tokio::test]
async fn test_missing_source_keeps_download_for_next_cycle() {
    let h = TestHarness::new();
    let tag = h.tag("downloads");
    h.write_files(&tag, &[("a/present.mkv", 10)]);
    h.client
        .add_download(fixtures::download(
            3,
            &tag,
            &[("a/present.mkv", 10), ("a/missing.mkv", 10)],
        ))
        .await;

    let report = h.processor(FlowKind::Default, &tag).run_cycle().await.unwrap();

    assert_eq!(report.outcome, CycleOutcome::Partial);
    assert!(report.cleanup.is_none());
    assert!(Path::new(&tag).join("a/present.mkv").is_file());
    assert!(h.client.removed_ids().await.is_empty());
    assert_eq!(h.client.download_count().await, 1);
}

#[tokio::test]
async fn test_external_file_protects_directory() {
    let h = TestHarness::new();
    let tag = h.tag("downloads");
    h.write_files(&tag, &[("dir1/dir2/file.mkv", 10), ("dir1/notes.txt", 1)]);
    h.client
        .add_download(fixtures::download(4, &tag, &[("dir1/dir2/file.mkv", 10)]))
        .await;

    h.processor(FlowKind::Default, &tag).run_cycle().await.unwrap();

    assert!(h.remote("downloads/dir1/dir2/file.mkv").is_file());
    assert!(!Path::new(&tag).join("dir1/dir2").exists());
    assert!(Path::new(&tag).join("dir1/notes.txt").is_file());
}

#[tokio::test]
async fn test_unreachable_remote_leaves_everything_in_place() {
    let h = TestHarness::new();
    let tag = h.tag("downloads");
    h.write_files(&tag, &[("a.mkv", 10)]);
    h.client
        .add_download(fixtures::download(5, &tag, &[("a.mkv", 10)]))
        .await;

    let transfer = FsTransfer::new(
        TransferConfig::new(h.remote_dir.path().join("not-mounted"))
            .with_connect_attempts(2)
            .with_connect_delay_ms(1),
    );
    let processor = PostProcessor::new(
        FlowPlugin::new(FlowKind::Default, FlowConfig::new(tag.as_str())),
        h.client.clone(),
        Arc::new(transfer),
        h.wake.clone(),
    );

    let result = processor.run_cycle().await;

    assert!(matches!(
        result,
        Err(ProcessorError::Transfer(TransferError::ConnectionExhausted { attempts: 2, .. }))
    ));
    assert_eq!(h.wake.wake_count(), 1);
    assert!(Path::new(&tag).join("a.mkv").is_file());
    assert!(h.client.removed_ids().await.is_empty());
}

#[tokio::test]
async fn test_flows_share_downloads_without_racing() {
    let h = TestHarness::new();
    let tag = h.tag("downloads");
    h.write_files(&tag, &[("a.mkv", 10)]);
    h.client
        .add_download(fixtures::download(6, &tag, &[("a.mkv", 10)]))
        .await;

    // Two flows owning the same directory, run concurrently
    let lock = Arc::new(Mutex::new(()));
    let scheduler = FlowScheduler::new(
        vec![
            h.processor(FlowKind::Default, &tag).with_cycle_lock(lock.clone()),
            h.processor(FlowKind::Movies, &tag).with_cycle_lock(lock.clone()),
        ],
        Duration::from_secs(60),
    );

    let (first, second) = tokio::join!(
        scheduler.run_now(FlowKind::Default),
        scheduler.run_now(FlowKind::Movies)
    );

    let outcomes = [first.unwrap().outcome, second.unwrap().outcome];
    assert!(outcomes.contains(&CycleOutcome::Success));
    assert!(outcomes.contains(&CycleOutcome::Idle));
    assert_eq!(h.client.removed_ids().await, vec![6]);
}

#[cfg(unix)]
#[tokio::test]
async fn test_cleanup_failure_does_not_strand_transferred_downloads() {
    let h = TestHarness::new();
    let tag = h.tag("downloads");
    let elsewhere = h.tag("elsewhere");
    h.write_files(&tag, &[("one/a.mkv", 10)]);
    h.write_files(&elsewhere, &[("b.mkv", 20)]);
    // `link` cannot be removed with remove_dir
    std::os::unix::fs::symlink(&elsewhere, Path::new(&tag).join("link")).unwrap();
    h.client
        .add_download(fixtures::download(1, &tag, &[("one/a.mkv", 10)]))
        .await;
    h.client
        .add_download(fixtures::download(2, &tag, &[("link/b.mkv", 20)]))
        .await;
    let processor = h.processor(FlowKind::Default, &tag);

    let result = processor.run_cycle().await;

    assert!(matches!(result, Err(ProcessorError::Cleanup(_))));
    assert!(h.remote("downloads/one/a.mkv").is_file());
    assert!(h.remote("downloads/link/b.mkv").is_file());
    assert!(!Path::new(&tag).join("one").exists());
    // both were transferred, so neither may be offered again
    assert_eq!(h.client.removed_ids().await, vec![1, 2]);
    assert_eq!(h.client.download_count().await, 0);

    let next = processor.run_cycle().await.unwrap();
    assert_eq!(next.outcome, CycleOutcome::Idle);
}
