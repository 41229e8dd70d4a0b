//! API tests against an in-process router with mock collaborators.

mod common;

use axum::http::StatusCode;
use plexpost_core::TorrentClientError;

use common::{fixtures, TestFixture};

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/v1/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["scheduler_running"], false);
}

#[tokio::test]
async fn test_config_hides_secrets() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/v1/config").await;

    assert_eq!(response.status, StatusCode::OK);
    let body = &response.body;
    assert_eq!(body["transmission"]["username"], "admin");
    assert_eq!(body["transmission"]["password_configured"], true);
    assert!(body["transmission"].get("password").is_none());
    assert_eq!(body["home_assistant"]["token_configured"], true);
    assert!(body["home_assistant"].get("token").is_none());
    assert!(!body.to_string().contains("secret"));
    assert!(!body.to_string().contains("long-lived-token"));
    assert_eq!(body["flows"]["movies"]["download_dir_tag"], "/downloads/movies");
}

#[tokio::test]
async fn test_list_flows() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/v1/flows").await;

    assert_eq!(response.status, StatusCode::OK);
    let flows = response.body["flows"].as_array().unwrap();
    assert_eq!(flows.len(), 2);
    assert_eq!(flows[0]["flow"], "movies");
    assert_eq!(flows[0]["category"], "movie");
    assert_eq!(flows[1]["flow"], "tv");
    assert_eq!(flows[1]["download_dir_tag"], "/downloads/tv");
    assert_eq!(flows[1]["cycles_run"], 0);
}

#[tokio::test]
async fn test_get_unconfigured_flow_is_not_found() {
    let fixture = TestFixture::new();

    assert_eq!(
        fixture.get("/api/v1/flows/default").await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        fixture.get("/api/v1/flows/music").await.status,
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        fixture.post("/api/v1/flows/default/run").await.status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_run_flow_with_nothing_to_do() {
    let fixture = TestFixture::new();

    let response = fixture.post("/api/v1/flows/movies/run").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["outcome"], "idle");
    assert_eq!(fixture.wake.wake_count(), 0);
}

#[tokio::test]
async fn test_run_movie_flow_transfers_and_records_status() {
    let fixture = TestFixture::new();
    fixture
        .torrent_client
        .add_download(fixtures::download(
            7,
            "/downloads/movies",
            &[("Film (2020)/Film.2020.mkv", 1_000), ("Film (2020)/Film.2020.nfo", 1)],
        ))
        .await;

    let response = fixture.post("/api/v1/flows/movies/run").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["outcome"], "success");
    assert_eq!(response.body["woke_media_server"], true);
    assert_eq!(
        fixture.transfer.destinations().await,
        vec!["movies/Film (2020)/Film.2020.mkv".to_string()]
    );
    assert_eq!(fixture.torrent_client.removed_ids().await, vec![7]);

    let status = fixture.get("/api/v1/flows/movies").await;
    assert_eq!(status.status, StatusCode::OK);
    assert_eq!(status.body["cycles_run"], 1);
    assert_eq!(status.body["last_report"]["outcome"], "success");
}

#[tokio::test]
async fn test_run_flow_client_failure_is_unavailable() {
    let fixture = TestFixture::new();
    fixture
        .torrent_client
        .set_next_list_error(TorrentClientError::ConnectionFailed(
            "connection refused".to_string(),
        ))
        .await;

    let response = fixture.post("/api/v1/flows/tv/run").await;

    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("connection refused"));

    let status = fixture.get("/api/v1/flows/tv").await;
    assert!(status.body["last_error"].is_string());
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let fixture = TestFixture::new();
    fixture.get("/api/v1/health").await;
    fixture.get("/api/v1/flows/tv").await;

    let (status, body) = fixture.get_text("/metrics").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("plexpost_http_requests_total"));
    assert!(body.contains("plexpost_files_transferred_total"));
    // labelled by route template, not by the requested flow name
    assert!(body.contains("/flows/{name}"));
    assert!(!body.contains("/flows/tv"));
}

#[tokio::test]
async fn test_scheduler_reported_running() {
    let fixture = TestFixture::new();
    fixture.scheduler.start().await;

    let response = fixture.get("/api/v1/flows").await;
    assert_eq!(response.body["scheduler_running"], true);

    fixture.scheduler.stop().await;
    let response = fixture.get("/api/v1/health").await;
    assert_eq!(response.body["scheduler_running"], false);
}
