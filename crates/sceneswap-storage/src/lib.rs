//! # sceneswap-storage
//!
//! 패널 설정 저장소 어댑터.
//! 설정 레코드 하나를 고정 키 아래 로컬 파일로 저장하고,
//! 선택적으로 1년짜리 장기 보관 미러를 함께 기록한다.
//!
//! ## 모듈
//! - `local_store`: 파일 기반 키-값 저장소 + `ConfigStore` 구현
//! - `memory`: 인메모리 `ConfigStore` (테스트, 임시 실행)

pub mod local_store;
pub mod memory;

pub use local_store::{LocalStorage, PanelStore, CONFIG_KEY};
pub use memory::MemoryConfigStore;
