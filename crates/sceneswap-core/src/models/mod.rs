//! SceneSwap 도메인 모델.
//!
//! 링크, 리컨실러, 제어 표면이 공유하는 데이터 구조체를 정의한다.
//! 영속/전송되는 모델은 `serde` Serialize/Deserialize를 구현한다.

pub mod capture;
pub mod connection;
pub mod log;
pub mod panel;
pub mod scene;
pub mod toolchange;
