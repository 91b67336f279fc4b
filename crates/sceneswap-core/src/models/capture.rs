//! 캡처 장치/스트림 모델.

use serde::{Deserialize, Serialize};

/// 캡처 요청 제약 — 비디오 전용, 선호 해상도는 플랫폼이 대체할 수 있다
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConstraints {
    /// 선호 너비
    pub ideal_width: u32,
    /// 선호 높이
    pub ideal_height: u32,
    /// 오디오 포함 여부 (미리보기는 항상 false)
    pub audio: bool,
}

impl Default for CaptureConstraints {
    fn default() -> Self {
        Self {
            ideal_width: 1920,
            ideal_height: 1080,
            audio: false,
        }
    }
}

/// 캡처 장치 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    VideoInput,
}

/// 열거된 캡처 장치
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureDeviceInfo {
    /// 장치 식별자 (예: `/dev/video2`)
    pub device_id: String,
    /// 사람이 읽는 이름 (예: `OBS Virtual Camera`)
    pub label: String,
    pub kind: DeviceKind,
}

impl CaptureDeviceInfo {
    /// OBS 가상 카메라로 보이는 장치인지
    pub fn looks_virtual(&self) -> bool {
        let label = self.label.to_lowercase();
        label.contains("obs") || label.contains("virtual")
    }
}

/// 활성 미리보기 스트림 요약 (제어 표면 노출용)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamInfo {
    /// 스트림 식별자
    pub stream_id: String,
    /// 사용 중인 장치
    pub device: CaptureDeviceInfo,
    /// 요청한 제약
    pub constraints: CaptureConstraints,
    /// 살아있는 트랙 수
    pub live_tracks: usize,
}
