//! 인메모리 패널 설정 저장소.
//!
//! 프로세스 수명 동안만 유지된다. 테스트와 `--ephemeral` 실행에서 사용.

use parking_lot::Mutex;
use sceneswap_core::error::CoreError;
use sceneswap_core::models::panel::PanelConfig;
use sceneswap_core::ports::config_store::ConfigStore;

/// 인메모리 `ConfigStore` 구현
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    record: Mutex<Option<PanelConfig>>,
    saves: Mutex<usize>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 레코드가 이미 저장된 상태로 생성
    pub fn with_record(config: PanelConfig) -> Self {
        Self {
            record: Mutex::new(Some(config)),
            saves: Mutex::new(0),
        }
    }

    /// 지금까지 `save` 호출 횟수
    pub fn save_count(&self) -> usize {
        *self.saves.lock()
    }

    /// 현재 저장된 레코드 (복제본)
    pub fn snapshot(&self) -> Option<PanelConfig> {
        self.record.lock().clone()
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> Result<Option<PanelConfig>, CoreError> {
        Ok(self.record.lock().clone())
    }

    fn save(&self, config: &PanelConfig) -> Result<(), CoreError> {
        *self.record.lock() = Some(config.clone());
        *self.saves.lock() += 1;
        Ok(())
    }

    fn clear(&self) -> Result<(), CoreError> {
        *self.record.lock() = None;
        Ok(())
    }
}
