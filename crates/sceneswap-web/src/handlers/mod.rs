//! API 핸들러 모듈.
//!
//! 상태를 바꾸는 엔드포인트는 모두 변경 후의 [`PanelSnapshot`]을 돌려준다.
//! 사용자에게 보이는 결과(성공/실패 사유)는 로그 패널에 기록된다.

pub mod config;
pub mod connection;
pub mod log;
pub mod preview;
pub mod scenes;
pub mod status;
pub mod stream;

use axum::Json;
use sceneswap_control::reconciler::PanelSnapshot;

/// 스냅샷 응답
pub type SnapshotResponse = Json<PanelSnapshot>;
