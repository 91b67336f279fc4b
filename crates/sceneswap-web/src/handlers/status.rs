//! 상태 조회 핸들러.

use axum::extract::State;
use axum::Json;

use super::SnapshotResponse;
use crate::AppState;

/// GET /api/status
pub async fn get_status(State(state): State<AppState>) -> SnapshotResponse {
    Json(state.reconciler.snapshot())
}
