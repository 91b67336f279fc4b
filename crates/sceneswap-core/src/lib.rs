//! # sceneswap-core
//!
//! SceneSwap 도메인 모델, 포트(trait) 정의, 에러 타입, 트리거 매처.
//! 모든 크레이트가 공유하는 핵심 타입과 인터페이스를 제공한다.
//!
//! ## 구조
//!
//! - [`models`] — 도메인 데이터 구조체 (serde Serialize/Deserialize)
//! - [`ports`] — Hexagonal Architecture 포트 인터페이스 (async_trait)
//! - [`error`] — 핵심 에러 타입 (thiserror)
//! - [`trigger`] — 프린터 로그 → 툴체인지 경계 분류
//! - [`config`] — 프로세스 설정 구조체
//! - [`config_manager`] — 프로세스 설정 파일 관리 (로드/저장)

pub mod config;
pub mod config_manager;
pub mod error;
pub mod models;
pub mod ports;
pub mod trigger;

#[cfg(test)]
mod tests {
    use crate::models::panel::PanelConfig;
    use crate::models::toolchange::ToolchangeKind;
    use crate::trigger::TriggerPhrases;

    #[test]
    fn panel_serde_roundtrip() {
        let config = PanelConfig {
            printer_host: "voron.lan".to_string(),
            studio_password: "secret".to_string(),
            scene_tool_changing: "CamA".to_string(),
            scene_printing: "CamB".to_string(),
            trigger_tool_changing: "Swap".to_string(),
            ..PanelConfig::default()
        };

        let json = serde_json::to_string(&config).unwrap();
        let deserialized: PanelConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, config);
    }

    #[test]
    fn triggers_follow_panel_record() {
        let config = PanelConfig {
            trigger_tool_changing: "Swap".to_string(),
            ..PanelConfig::default()
        };
        let triggers = TriggerPhrases::from_config(&config);
        assert_eq!(triggers.classify("echo: Swap"), Some(ToolchangeKind::Start));
        assert_eq!(
            triggers.classify("echo: Toolchange Completed"),
            Some(ToolchangeKind::Complete)
        );
    }
}
