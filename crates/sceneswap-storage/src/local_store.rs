//! 파일 기반 패널 설정 저장소.
//!
//! 디렉토리 하나를 키-값 저장소로 사용한다 (`<dir>/<key>.json`).
//! 패널 레코드는 고정 키 [`CONFIG_KEY`] 아래 JSON 문자열로 저장되고,
//! 미러가 켜져 있으면 만료 시각이 붙은 장기 보관 레코드를 함께 기록한다.
//! 기본 레코드가 없을 때만 만료되지 않은 미러를 읽는다.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use sceneswap_core::error::CoreError;
use sceneswap_core::models::panel::PanelConfig;
use sceneswap_core::ports::config_store::ConfigStore;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 패널 레코드 저장 키
pub const CONFIG_KEY: &str = "sceneswap-config";

/// 미러 레코드 저장 키
const MIRROR_KEY: &str = "sceneswap-mirror";

/// 미러 보존 기간 (일)
const MIRROR_MAX_AGE_DAYS: i64 = 365;

/// 디렉토리 기반 키-값 저장소
#[derive(Debug, Clone)]
pub struct LocalStorage {
    dir: PathBuf,
}

impl LocalStorage {
    /// 저장 디렉토리를 열고 없으면 생성
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let dir = dir.into();
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
            info!("로컬 저장소 디렉토리 생성: {}", dir.display());
        }
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn item_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// 값 읽기. 키가 없으면 `Ok(None)`.
    pub fn get_item(&self, key: &str) -> Result<Option<String>, CoreError> {
        match fs::read_to_string(self.item_path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 값 쓰기 — 임시 파일에 쓴 뒤 rename으로 교체한다
    pub fn set_item(&self, key: &str, value: &str) -> Result<(), CoreError> {
        let path = self.item_path(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    /// 값 삭제. 없는 키는 무시.
    pub fn remove_item(&self, key: &str) -> Result<(), CoreError> {
        match fs::remove_file(self.item_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// 장기 보관 미러 레코드
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MirrorRecord {
    value: String,
    expires_at: DateTime<Utc>,
}

/// 파일 기반 `ConfigStore` 구현
pub struct PanelStore {
    storage: LocalStorage,
    mirror_enabled: bool,
    write_lock: Mutex<()>,
}

impl PanelStore {
    pub fn new(storage: LocalStorage, mirror_enabled: bool) -> Self {
        Self {
            storage,
            mirror_enabled,
            write_lock: Mutex::new(()),
        }
    }

    /// 디렉토리를 열어 바로 저장소 생성
    pub fn open(dir: impl Into<PathBuf>, mirror_enabled: bool) -> Result<Self, CoreError> {
        Ok(Self::new(LocalStorage::open(dir)?, mirror_enabled))
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    fn parse(raw: &str) -> Result<PanelConfig, CoreError> {
        let config: PanelConfig = serde_json::from_str(raw)?;
        Ok(config.normalized())
    }

    fn load_mirror(&self) -> Option<PanelConfig> {
        let raw = match self.storage.get_item(MIRROR_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("미러 레코드 읽기 실패: {e}");
                return None;
            }
        };
        let mirror: MirrorRecord = match serde_json::from_str(&raw) {
            Ok(mirror) => mirror,
            Err(e) => {
                warn!("미러 레코드 파싱 실패: {e}");
                return None;
            }
        };
        if mirror.expires_at <= Utc::now() {
            debug!("미러 레코드 만료: {}", mirror.expires_at);
            return None;
        }
        Self::parse(&mirror.value).ok()
    }
}

impl ConfigStore for PanelStore {
    fn load(&self) -> Result<Option<PanelConfig>, CoreError> {
        match self.storage.get_item(CONFIG_KEY)? {
            Some(raw) => Self::parse(&raw).map(Some),
            None => {
                let mirrored = self.load_mirror();
                if mirrored.is_some() {
                    info!("기본 레코드 없음 — 미러 레코드에서 설정 복원");
                }
                Ok(mirrored)
            }
        }
    }

    fn save(&self, config: &PanelConfig) -> Result<(), CoreError> {
        let _guard = self.write_lock.lock();
        let raw = serde_json::to_string(config)?;
        self.storage.set_item(CONFIG_KEY, &raw)?;

        if self.mirror_enabled {
            let mirror = MirrorRecord {
                value: raw,
                expires_at: Utc::now() + Duration::days(MIRROR_MAX_AGE_DAYS),
            };
            self.storage
                .set_item(MIRROR_KEY, &serde_json::to_string(&mirror)?)?;
        }
        debug!("패널 설정 저장: {}", self.storage.dir().display());
        Ok(())
    }

    fn clear(&self) -> Result<(), CoreError> {
        let _guard = self.write_lock.lock();
        self.storage.remove_item(CONFIG_KEY)?;
        self.storage.remove_item(MIRROR_KEY)?;
        info!("저장된 패널 설정 삭제");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> PanelConfig {
        PanelConfig {
            printer_host: "voron.lan".into(),
            printer_port: "7125".into(),
            studio_host: "10.0.0.5".into(),
            studio_port: "4455".into(),
            studio_password: "hunter2".into(),
            scene_tool_changing: "CamA".into(),
            scene_printing: "CamB".into(),
            trigger_tool_changing: "Swap".into(),
            trigger_printing: "Swapped".into(),
        }
    }

    #[test]
    fn first_run_has_no_record() {
        let dir = TempDir::new().unwrap();
        let store = PanelStore::open(dir.path(), true).unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn roundtrip_reproduces_every_field() {
        let dir = TempDir::new().unwrap();
        let store = PanelStore::open(dir.path(), false).unwrap();
        store.save(&sample()).unwrap();

        let reopened = PanelStore::open(dir.path(), false).unwrap();
        assert_eq!(reopened.load().unwrap(), Some(sample()));
    }

    #[test]
    fn absent_optional_fields_read_back_as_defaults() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::open(dir.path()).unwrap();
        storage
            .set_item(
                CONFIG_KEY,
                r#"{"printerHost":"p","printerPort":"1","studioHost":"s","studioPort":"2","sceneToolChanging":"A","scenePrinting":"B"}"#,
            )
            .unwrap();

        let config = PanelStore::new(storage, false).load().unwrap().unwrap();
        assert_eq!(config.studio_password, "");
        assert_eq!(config.trigger_tool_changing, "Toolchange Starting");
        assert_eq!(config.trigger_printing, "Toolchange Completed");
        assert_eq!(config.scene_printing, "B");
    }

    #[test]
    fn record_is_stored_under_fixed_key() {
        let dir = TempDir::new().unwrap();
        let store = PanelStore::open(dir.path(), false).unwrap();
        store.save(&sample()).unwrap();

        let raw = store.storage().get_item(CONFIG_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["sceneToolChanging"], "CamA");
        assert!(store.storage().get_item(MIRROR_KEY).unwrap().is_none());
    }

    #[test]
    fn mirror_restores_when_primary_missing() {
        let dir = TempDir::new().unwrap();
        let store = PanelStore::open(dir.path(), true).unwrap();
        store.save(&sample()).unwrap();
        store.storage().remove_item(CONFIG_KEY).unwrap();

        assert_eq!(store.load().unwrap(), Some(sample()));
    }

    #[test]
    fn expired_mirror_is_ignored() {
        let dir = TempDir::new().unwrap();
        let store = PanelStore::open(dir.path(), true).unwrap();
        let mirror = MirrorRecord {
            value: serde_json::to_string(&sample()).unwrap(),
            expires_at: Utc::now() - Duration::days(1),
        };
        store
            .storage()
            .set_item(MIRROR_KEY, &serde_json::to_string(&mirror).unwrap())
            .unwrap();

        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn clear_removes_record_and_mirror() {
        let dir = TempDir::new().unwrap();
        let store = PanelStore::open(dir.path(), true).unwrap();
        store.save(&sample()).unwrap();
        store.clear().unwrap();

        assert!(store.load().unwrap().is_none());
        // 두 번 지워도 에러가 아니다
        store.clear().unwrap();
    }

    #[test]
    fn corrupt_record_is_serialization_error() {
        let dir = TempDir::new().unwrap();
        let store = PanelStore::open(dir.path(), false).unwrap();
        store.storage().set_item(CONFIG_KEY, "{oops").unwrap();

        assert!(matches!(store.load(), Err(CoreError::Serialization(_))));
    }
}
