//! 자동 전환/미리보기 토글 핸들러.

use axum::extract::State;
use axum::Json;

use super::SnapshotResponse;
use crate::AppState;

/// POST /api/auto-switch/toggle
pub async fn toggle_auto_switch(State(state): State<AppState>) -> SnapshotResponse {
    state.reconciler.toggle_auto_switch();
    Json(state.reconciler.snapshot())
}

/// POST /api/preview/toggle
pub async fn toggle_preview(State(state): State<AppState>) -> SnapshotResponse {
    state.reconciler.toggle_preview().await;
    Json(state.reconciler.snapshot())
}
