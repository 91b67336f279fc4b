//! 패널 설정 핸들러.

use axum::extract::State;
use axum::Json;
use sceneswap_core::models::panel::PanelConfig;
use serde::Deserialize;

use crate::error::ApiError;
use crate::AppState;

/// PUT /api/config 본문
///
/// `studioPassword`가 없거나 null이면 저장된 비밀번호를 유지한다.
/// 문자열이 오면 그대로 저장한다 (빈 문자열은 인증 해제).
#[derive(Debug, Deserialize)]
pub struct ConfigUpdate {
    #[serde(rename = "studioPassword", default)]
    pub studio_password: Option<String>,
    #[serde(flatten)]
    pub config: PanelConfig,
}

/// GET /api/config — 비밀번호는 가려서 반환
pub async fn get_config(State(state): State<AppState>) -> Json<PanelConfig> {
    Json(state.reconciler.panel().masked())
}

/// PUT /api/config
///
/// 레코드 전체를 교체하고 즉시 저장한다. 빠진 선택 필드는 기본값으로 채워진다.
/// 씬 목록을 받아온 뒤에는 목록에 없는 씬 이름이 400으로 거부된다.
pub async fn update_config(
    State(state): State<AppState>,
    Json(update): Json<ConfigUpdate>,
) -> Result<Json<PanelConfig>, ApiError> {
    state
        .reconciler
        .update_panel(update.config, update.studio_password)?;
    Ok(Json(state.reconciler.panel().masked()))
}

/// POST /api/config/reset
pub async fn reset_config(State(state): State<AppState>) -> Json<PanelConfig> {
    state.reconciler.reset_config();
    Json(state.reconciler.panel().masked())
}
