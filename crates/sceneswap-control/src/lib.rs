//! # sceneswap-control
//!
//! 조정자(Reconciler) 크레이트.
//! 프린터 링크 이벤트를 받아 자동 전환 플래그에 따라 스튜디오 씬을 바꾸고,
//! 패널 설정을 저장소와 동기화하며, 사용자에게 보이는 로그 패널을 관리한다.

pub mod log_panel;
pub mod reconciler;
