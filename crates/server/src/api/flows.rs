//! Flow status and manual run handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use plexpost_core::{CycleReport, FlowKind, FlowStatus, ProcessorError};
use serde::Serialize;
use tracing::{info, warn};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct FlowListResponse {
    pub scheduler_running: bool,
    pub flows: Vec<FlowStatus>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn not_found(name: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: format!("Flow not configured: {}", name),
        }),
    )
}

/// Resolve a flow name from the path, rejecting unknown names.
fn parse_flow(name: &str) -> Result<FlowKind, ApiError> {
    FlowKind::parse(name).ok_or_else(|| not_found(name))
}

pub async fn list_flows(State(state): State<Arc<AppState>>) -> Json<FlowListResponse> {
    let scheduler = state.scheduler();
    Json(FlowListResponse {
        scheduler_running: scheduler.is_running(),
        flows: scheduler.status().await,
    })
}

pub async fn get_flow(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<FlowStatus>, ApiError> {
    let kind = parse_flow(&name)?;
    state
        .scheduler()
        .status()
        .await
        .into_iter()
        .find(|s| s.flow == kind)
        .map(Json)
        .ok_or_else(|| not_found(&name))
}

/// Run one cycle of a flow immediately and return its report.
pub async fn run_flow(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<CycleReport>, ApiError> {
    let kind = parse_flow(&name)?;
    info!(flow = %name, "Manual cycle requested");

    match state.scheduler().run_now(kind).await {
        Ok(report) => Ok(Json(report)),
        Err(ProcessorError::FlowNotConfigured(_)) => Err(not_found(&name)),
        Err(e) => {
            warn!(flow = %name, error = %e, "Manual cycle failed");
            let status = match e {
                ProcessorError::TorrentClient(_) | ProcessorError::Transfer(_) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            Err((
                status,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}
