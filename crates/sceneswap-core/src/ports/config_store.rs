//! 패널 설정 저장소 포트.
//!
//! 구현: `sceneswap-storage` crate (로컬 파일, 인메모리)

use crate::error::CoreError;
use crate::models::panel::PanelConfig;

/// 패널 설정 레코드 하나를 읽고 쓰는 영속 저장소
pub trait ConfigStore: Send + Sync {
    /// 저장된 레코드 로드. 최초 실행이면 `Ok(None)`.
    fn load(&self) -> Result<Option<PanelConfig>, CoreError>;

    /// 레코드 전체 덮어쓰기
    fn save(&self, config: &PanelConfig) -> Result<(), CoreError>;

    /// 저장된 레코드 삭제 (미러 포함)
    fn clear(&self) -> Result<(), CoreError>;
}
