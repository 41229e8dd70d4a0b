//! Common test utilities for API testing with mocks.
//!
//! Builds the router in process, backed by a scheduler whose flows run
//! against a mock torrent client, transfer and wake signal.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tokio::sync::Mutex;
use tower::ServiceExt;

use plexpost_core::{
    load_config_from_str,
    testing::{MockTorrentClient, MockTransfer, MockWake},
    FlowPlugin, FlowScheduler, PostProcessor,
};
use plexpost_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use plexpost_core::testing::fixtures;

/// Movies and tv flows configured; no default flow.
pub const TEST_CONFIG: &str = r#"
[transmission]
url = "http://localhost:9091/transmission/rpc"
username = "admin"
password = "secret"

[transfer]
remote_root = "/mnt/media"

[home_assistant]
url = "http://homeassistant.local:8123"
token = "long-lived-token"
htpc_switch = "htpc"

[flows.movies]
download_dir_tag = "/downloads/movies"

[flows.tv]
download_dir_tag = "/downloads/tv"
"#;

/// In-process API with controllable mocks.
pub struct TestFixture {
    pub router: Router,
    pub torrent_client: Arc<MockTorrentClient>,
    pub transfer: MockTransfer,
    pub wake: Arc<MockWake>,
    pub scheduler: Arc<FlowScheduler>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    pub fn new() -> Self {
        let config = load_config_from_str(TEST_CONFIG).expect("Failed to parse test config");

        let torrent_client = Arc::new(MockTorrentClient::new());
        let transfer = MockTransfer::new();
        let wake = Arc::new(MockWake::new());

        let cycle_lock = Arc::new(Mutex::new(()));
        let processors = config
            .flows
            .configured()
            .into_iter()
            .map(|(kind, flow_config)| {
                PostProcessor::new(
                    FlowPlugin::new(kind, flow_config),
                    torrent_client.clone(),
                    Arc::new(transfer.clone()),
                    wake.clone(),
                )
                .with_cycle_lock(Arc::clone(&cycle_lock))
            })
            .collect();

        let scheduler = Arc::new(FlowScheduler::new(processors, Duration::from_secs(3600)));
        let state = Arc::new(AppState::new(config, Arc::clone(&scheduler)));

        Self {
            router: create_router(state),
            torrent_client,
            transfer,
            wake,
            scheduler,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn post(&self, uri: &str) -> TestResponse {
        self.request(Request::post(uri).body(Body::empty()).unwrap())
            .await
    }

    /// Raw body of a GET, for non-JSON endpoints.
    pub async fn get_text(&self, uri: &str) -> (StatusCode, String) {
        let response = self
            .router
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .expect("Request failed");
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}
