//! 프로세스 설정 구조체.
//!
//! 제어 표면 포트, 재연결 지연, 핸드셰이크 타임아웃, 미리보기 해상도, 저장소 경로 등
//! 사용자가 패널에서 편집하지 않는 런타임 설정을 정의한다.
//! 패널에서 편집하는 값은 [`crate::models::panel::PanelConfig`]에 있다.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::models::capture::CaptureConstraints;

/// 최상위 프로세스 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// 제어 표면(로컬 HTTP) 설정
    #[serde(default)]
    pub web: WebConfig,
    /// 프린터 링크 설정
    #[serde(default)]
    pub printer: PrinterConfig,
    /// 스튜디오 링크 설정
    #[serde(default)]
    pub studio: StudioConfig,
    /// 미리보기 설정
    #[serde(default)]
    pub preview: PreviewConfig,
    /// 패널 저장소 설정
    #[serde(default)]
    pub storage: StorageConfig,
    /// 로그 패널 설정
    #[serde(default)]
    pub log: LogConfig,
}

/// 제어 표면 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    /// 서버 포트
    pub port: u16,
    /// 외부 접근 허용 (false면 127.0.0.1에만 바인드)
    #[serde(default)]
    pub allow_external: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: 9190,
            allow_external: false,
        }
    }
}

/// 프린터 링크 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrinterConfig {
    /// 연결이 끊긴 뒤 재연결까지 고정 지연 (밀리초)
    pub reconnect_delay_ms: u64,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: 5_000,
        }
    }
}

/// 스튜디오 링크 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudioConfig {
    /// Hello → Identified 핸드셰이크 타임아웃 (밀리초)
    pub handshake_timeout_ms: u64,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            handshake_timeout_ms: 10_000,
        }
    }
}

/// 미리보기 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// 선호 너비
    pub ideal_width: u32,
    /// 선호 높이
    pub ideal_height: u32,
    /// 가상 카메라 감지 후 미리보기 자동 시작까지 지연 (밀리초)
    pub autostart_delay_ms: u64,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            ideal_width: 1920,
            ideal_height: 1080,
            autostart_delay_ms: 500,
        }
    }
}

/// 패널 저장소 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// 저장 디렉토리 (None이면 플랫폼 기본 데이터 디렉토리)
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// 장기 보관 미러 레코드 기록 여부
    pub mirror_enabled: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            mirror_enabled: true,
        }
    }
}

/// 로그 패널 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 보관할 최대 항목 수
    pub capacity: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { capacity: 500 }
    }
}

impl AppConfig {
    /// 기본 설정 생성
    pub fn default_config() -> Self {
        Self::default()
    }

    /// 재연결 지연
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.printer.reconnect_delay_ms)
    }

    /// 핸드셰이크 타임아웃
    pub fn handshake_timeout(&self) -> Duration {
        Duration::from_millis(self.studio.handshake_timeout_ms)
    }

    /// 미리보기 자동 시작 지연
    pub fn preview_autostart_delay(&self) -> Duration {
        Duration::from_millis(self.preview.autostart_delay_ms)
    }

    /// 미리보기 캡처 제약
    pub fn capture_constraints(&self) -> CaptureConstraints {
        CaptureConstraints {
            ideal_width: self.preview.ideal_width,
            ideal_height: self.preview.ideal_height,
            audio: false,
        }
    }
}
