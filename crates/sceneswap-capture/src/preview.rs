//! 로컬 미리보기 링크.
//!
//! 활성 스트림은 최대 하나다. 시작/중지는 비동기 뮤텍스로 직렬화되므로
//! 동시에 시작을 요청해도 장치는 한 번만 열린다.

use async_trait::async_trait;
use sceneswap_core::error::CoreError;
use sceneswap_core::models::capture::{CaptureConstraints, CaptureDeviceInfo, StreamInfo};
use sceneswap_core::ports::capture::{CaptureBackend, MediaStream, PreviewControl};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// [`PreviewControl`] 구현
pub struct PreviewLink {
    backend: Arc<dyn CaptureBackend>,
    constraints: CaptureConstraints,
    active: Mutex<Option<Arc<dyn MediaStream>>>,
    /// `active`를 잠그지 않고 읽기 위한 사본
    is_active: AtomicBool,
}

impl PreviewLink {
    pub fn new(backend: Arc<dyn CaptureBackend>, constraints: CaptureConstraints) -> Self {
        Self {
            backend,
            constraints,
            active: Mutex::new(None),
            is_active: AtomicBool::new(false),
        }
    }

    /// 활성 스트림 요약
    pub async fn current(&self) -> Option<StreamInfo> {
        self.active.lock().await.as_ref().map(|stream| stream.info())
    }
}

#[async_trait]
impl PreviewControl for PreviewLink {
    async fn start(&self) -> Result<Arc<dyn MediaStream>, CoreError> {
        let mut active = self.active.lock().await;
        if let Some(stream) = active.as_ref() {
            return Ok(stream.clone());
        }

        let stream = self.backend.open(&self.constraints).await?;
        info!(
            "미리보기 시작: {} ({})",
            stream.device().label,
            stream.id()
        );
        *active = Some(stream.clone());
        self.is_active.store(true, Ordering::SeqCst);
        Ok(stream)
    }

    async fn stop(&self) {
        let mut active = self.active.lock().await;
        if let Some(stream) = active.take() {
            stream.stop_tracks();
            self.is_active.store(false, Ordering::SeqCst);
            info!("미리보기 중지: {}", stream.id());
        }
    }

    fn is_active(&self) -> bool {
        self.is_active.load(Ordering::SeqCst)
    }

    async fn enumerate_devices(&self) -> Vec<CaptureDeviceInfo> {
        self.backend.enumerate_devices().await.unwrap_or_else(|e| {
            warn!("장치 열거 실패: {e}");
            Vec::new()
        })
    }
}
