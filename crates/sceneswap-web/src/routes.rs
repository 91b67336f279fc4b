//! API 라우트 정의.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers;
use crate::AppState;

/// API 라우트 생성
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // 상태
        .route("/status", get(handlers::status::get_status))
        // 링크 연결
        .route("/printer/toggle", post(handlers::connection::toggle_printer))
        .route("/studio/toggle", post(handlers::connection::toggle_studio))
        // 씬
        .route("/scenes/refresh", post(handlers::scenes::refresh_scenes))
        .route("/scenes/switch", post(handlers::scenes::switch_scene))
        .route("/scenes/selection", put(handlers::scenes::select_scene))
        // 설정
        .route(
            "/config",
            get(handlers::config::get_config).put(handlers::config::update_config),
        )
        .route("/config/reset", post(handlers::config::reset_config))
        // 토글
        .route(
            "/auto-switch/toggle",
            post(handlers::preview::toggle_auto_switch),
        )
        .route("/preview/toggle", post(handlers::preview::toggle_preview))
        // 로그
        .route("/log", get(handlers::log::get_log))
        // 실시간 로그 스트림 (SSE)
        .route("/log/stream", get(handlers::stream::log_stream))
}
