//! 링크 연결 토글 핸들러.

use axum::extract::State;
use axum::Json;

use super::SnapshotResponse;
use crate::AppState;

/// POST /api/printer/toggle
///
/// 연결 유지 의도가 있으면 해제하고, 없으면 마지막 설정으로 연결을 시작한다.
/// 연결 결과는 로그 패널과 이후 상태 조회로 확인한다.
pub async fn toggle_printer(State(state): State<AppState>) -> SnapshotResponse {
    state.reconciler.toggle_printer().await;
    Json(state.reconciler.snapshot())
}

/// POST /api/studio/toggle
///
/// 연결 시 씬 목록 갱신, 가상 카메라 시작, 미리보기 자동 시작까지 마친 뒤 응답한다.
pub async fn toggle_studio(State(state): State<AppState>) -> SnapshotResponse {
    state.reconciler.toggle_studio().await;
    Json(state.reconciler.snapshot())
}
