//! V4L2 캡처 백엔드.
//!
//! `/sys/class/video4linux/videoN/name`으로 장치를 열거하고 `/dev/videoN` 노드를 연다.
//! 가상 카메라로 보이는 장치를 우선 선택한다. Linux 외 플랫폼에서는 열기가 항상 실패한다.

use async_trait::async_trait;
use parking_lot::Mutex;
use sceneswap_core::error::CoreError;
use sceneswap_core::models::capture::{CaptureConstraints, CaptureDeviceInfo, DeviceKind};
use sceneswap_core::ports::capture::{CaptureBackend, MediaStream};
use std::fs::{self, File};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

const SYSFS_ROOT: &str = "/sys/class/video4linux";
const DEV_ROOT: &str = "/dev";

/// V4L2 장치 노드 기반 [`CaptureBackend`]
#[derive(Debug, Clone)]
pub struct V4lCaptureBackend {
    sysfs_root: PathBuf,
    dev_root: PathBuf,
}

impl V4lCaptureBackend {
    pub fn new() -> Self {
        Self::with_roots(SYSFS_ROOT, DEV_ROOT)
    }

    /// 열거/열기 기준 디렉토리 지정
    pub fn with_roots(sysfs_root: impl Into<PathBuf>, dev_root: impl Into<PathBuf>) -> Self {
        Self {
            sysfs_root: sysfs_root.into(),
            dev_root: dev_root.into(),
        }
    }

    fn scan(&self) -> Result<Vec<CaptureDeviceInfo>, CoreError> {
        let entries = match fs::read_dir(&self.sysfs_root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(CoreError::Capture(format!("장치 열거 실패: {e}"))),
        };

        let mut devices: Vec<CaptureDeviceInfo> = entries
            .filter_map(Result::ok)
            .filter_map(|entry| {
                let node = entry.file_name().to_string_lossy().into_owned();
                if !node.starts_with("video") {
                    return None;
                }
                let label = fs::read_to_string(entry.path().join("name"))
                    .map(|name| name.trim().to_string())
                    .unwrap_or_else(|_| node.clone());
                Some(CaptureDeviceInfo {
                    device_id: self.dev_root.join(&node).display().to_string(),
                    label,
                    kind: DeviceKind::VideoInput,
                })
            })
            .collect();
        devices.sort_by(|a, b| a.device_id.cmp(&b.device_id));
        Ok(devices)
    }

    fn open_node(device: &CaptureDeviceInfo) -> Result<File, CoreError> {
        File::open(&device.device_id).map_err(|e| match e.kind() {
            ErrorKind::PermissionDenied => CoreError::PermissionDenied(device.device_id.clone()),
            ErrorKind::NotFound => CoreError::DeviceUnavailable(device.device_id.clone()),
            _ => CoreError::Capture(format!("{}: {e}", device.device_id)),
        })
    }
}

impl Default for V4lCaptureBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CaptureBackend for V4lCaptureBackend {
    async fn open(
        &self,
        constraints: &CaptureConstraints,
    ) -> Result<Arc<dyn MediaStream>, CoreError> {
        if !cfg!(target_os = "linux") {
            return Err(CoreError::Capture(
                "이 플랫폼에서는 비디오 캡처를 지원하지 않음".to_string(),
            ));
        }

        let devices = self.scan()?;
        let device = devices
            .iter()
            .find(|d| d.looks_virtual())
            .or_else(|| devices.first())
            .cloned()
            .ok_or_else(|| CoreError::DeviceUnavailable("비디오 입력 장치 없음".to_string()))?;

        let file = Self::open_node(&device)?;
        info!(
            "캡처 장치 열림: {} ({}), 선호 {}x{}",
            device.label, device.device_id, constraints.ideal_width, constraints.ideal_height
        );

        Ok(Arc::new(V4lStream {
            id: Uuid::new_v4().to_string(),
            device,
            constraints: *constraints,
            node: Mutex::new(Some(file)),
        }))
    }

    async fn enumerate_devices(&self) -> Result<Vec<CaptureDeviceInfo>, CoreError> {
        let devices = self.scan()?;
        debug!("비디오 장치 {}개 열거", devices.len());
        Ok(devices)
    }
}

/// 열린 장치 노드 하나를 비디오 트랙 하나로 본다
struct V4lStream {
    id: String,
    device: CaptureDeviceInfo,
    constraints: CaptureConstraints,
    node: Mutex<Option<File>>,
}

impl MediaStream for V4lStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn device(&self) -> &CaptureDeviceInfo {
        &self.device
    }

    fn constraints(&self) -> CaptureConstraints {
        self.constraints
    }

    fn live_tracks(&self) -> usize {
        usize::from(self.node.lock().is_some())
    }

    fn stop_tracks(&self) {
        if self.node.lock().take().is_some() {
            debug!("캡처 장치 해제: {}", self.device.device_id);
        }
    }
}
