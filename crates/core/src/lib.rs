pub mod cleanup;
pub mod config;
pub mod download;
pub mod flow;
pub mod mapping;
pub mod metrics;
pub mod processor;
pub mod testing;
pub mod torrent_client;
pub mod transfer;
pub mod wake;

pub use cleanup::{CleanupError, CleanupReport, DirectoryCleanupEngine};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use download::{Download, DownloadFile};
pub use flow::{FlowConfig, FlowKind, FlowPlugin};
pub use mapping::{FileKind, MappingRule};
pub use processor::{
    CycleOutcome, CycleReport, DownloadOutcome, FlowScheduler, FlowStatus, PostProcessor,
    ProcessorError,
};
pub use torrent_client::{TorrentClient, TorrentClientError, TransmissionClient};
pub use transfer::{
    FsTransfer, SftpConfig, SftpTransfer, TransferConfig, TransferError, TransferSink,
};
pub use wake::{HomeAssistantSwitch, NoopWake, WakeError, WakeSignal};
