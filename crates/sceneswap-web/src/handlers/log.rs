//! 로그 이력 핸들러.

use axum::extract::{Query, State};
use axum::Json;
use sceneswap_core::models::log::LogEntry;
use serde::Deserialize;

use crate::AppState;

/// 로그 조회 쿼리
#[derive(Debug, Deserialize)]
pub struct LogQuery {
    /// 이 순번보다 나중 항목만 (없으면 전체)
    pub since: Option<u64>,
}

/// GET /api/log
pub async fn get_log(
    State(state): State<AppState>,
    Query(query): Query<LogQuery>,
) -> Json<Vec<LogEntry>> {
    let log = state.reconciler.log();
    Json(match query.since {
        Some(seq) => log.since(seq),
        None => log.history(),
    })
}
