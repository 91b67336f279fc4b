//! 캡처 장치 포트.
//!
//! 구현: `sceneswap-capture` crate (V4L2 백엔드, 미리보기 링크)

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::CoreError;
use crate::models::capture::{CaptureConstraints, CaptureDeviceInfo, StreamInfo};

/// 열린 캡처 스트림
pub trait MediaStream: Send + Sync {
    /// 스트림 식별자
    fn id(&self) -> &str;

    /// 사용 중인 장치
    fn device(&self) -> &CaptureDeviceInfo;

    /// 요청한 제약
    fn constraints(&self) -> CaptureConstraints;

    /// 아직 해제되지 않은 트랙 수
    fn live_tracks(&self) -> usize;

    /// 모든 트랙 해제
    fn stop_tracks(&self);

    fn info(&self) -> StreamInfo {
        StreamInfo {
            stream_id: self.id().to_string(),
            device: self.device().clone(),
            constraints: self.constraints(),
            live_tracks: self.live_tracks(),
        }
    }
}

/// 플랫폼 캡처 API
#[async_trait]
pub trait CaptureBackend: Send + Sync {
    /// 비디오 스트림 요청
    async fn open(&self, constraints: &CaptureConstraints)
        -> Result<Arc<dyn MediaStream>, CoreError>;

    /// 사용 가능한 비디오 입력 장치 열거
    async fn enumerate_devices(&self) -> Result<Vec<CaptureDeviceInfo>, CoreError>;
}

/// 로컬 미리보기 제어 — 활성 스트림은 최대 하나
#[async_trait]
pub trait PreviewControl: Send + Sync {
    /// 미리보기 시작. 이미 시작됐으면 기존 핸들을 그대로 반환한다.
    async fn start(&self) -> Result<Arc<dyn MediaStream>, CoreError>;

    /// 미리보기 중지. 시작되지 않았으면 아무것도 하지 않는다.
    async fn stop(&self);

    fn is_active(&self) -> bool;

    /// 진단용 장치 열거 — 실패해도 빈 목록
    async fn enumerate_devices(&self) -> Vec<CaptureDeviceInfo>;
}
