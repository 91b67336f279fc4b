//! 씬 카탈로그/전환 핸들러.

use axum::extract::State;
use axum::Json;
use sceneswap_core::models::toolchange::SceneRole;
use serde::Deserialize;

use super::SnapshotResponse;
use crate::error::ApiError;
use crate::AppState;

/// 빠른 전환 요청
#[derive(Debug, Deserialize)]
pub struct SwitchRequest {
    pub role: SceneRole,
}

/// 역할별 씬 선택 요청
#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub role: SceneRole,
    /// 빈 문자열이면 선택 해제
    #[serde(default)]
    pub name: String,
}

/// POST /api/scenes/refresh — OBS 미연결이면 409
pub async fn refresh_scenes(
    State(state): State<AppState>,
) -> Result<SnapshotResponse, ApiError> {
    state.reconciler.refresh_scenes().await?;
    Ok(Json(state.reconciler.snapshot()))
}

/// POST /api/scenes/switch — OBS 미연결이면 409
pub async fn switch_scene(
    State(state): State<AppState>,
    Json(request): Json<SwitchRequest>,
) -> Result<SnapshotResponse, ApiError> {
    state.reconciler.switch_to_role(request.role).await?;
    Ok(Json(state.reconciler.snapshot()))
}

/// PUT /api/scenes/selection
pub async fn select_scene(
    State(state): State<AppState>,
    Json(request): Json<SelectRequest>,
) -> Result<SnapshotResponse, ApiError> {
    state.reconciler.select_scene(request.role, &request.name)?;
    Ok(Json(state.reconciler.snapshot()))
}
