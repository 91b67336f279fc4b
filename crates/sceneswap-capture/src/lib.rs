//! # sceneswap-capture
//!
//! 로컬 미리보기 크레이트.
//! 플랫폼 캡처 API([`v4l`])로 비디오 입력 장치를 열거하고 열며,
//! [`preview::PreviewLink`]가 활성 스트림을 최대 하나로 유지한다.

pub mod preview;
pub mod v4l;
