//! 패널 설정 레코드.
//!
//! 사용자가 편집하는 호스트/포트/자격증명/씬/트리거 문구를 하나의 레코드로 묶는다.
//! 레코드는 항상 통째로 저장되며 부분 패치되지 않는다.
//! 필드가 없으면 읽을 때 기본값으로 채운다 — null로 기록되는 일은 없다.

use serde::{Deserialize, Serialize};

use super::toolchange::SceneRole;

/// 기본 프린터 호스트
pub const DEFAULT_PRINTER_HOST: &str = "voron.local";
/// 기본 Moonraker 포트
pub const DEFAULT_PRINTER_PORT: &str = "7125";
/// 기본 OBS 호스트
pub const DEFAULT_STUDIO_HOST: &str = "localhost";
/// 기본 obs-websocket 포트
pub const DEFAULT_STUDIO_PORT: &str = "4455";
/// 툴체인지 시작 기본 트리거 문구
pub const DEFAULT_TRIGGER_TOOL_CHANGING: &str = "Toolchange Starting";
/// 툴체인지 완료 기본 트리거 문구
pub const DEFAULT_TRIGGER_PRINTING: &str = "Toolchange Completed";
/// 제어 표면에 노출되는 비밀번호 자리표시자
pub const PASSWORD_MASK: &str = "********";

/// 패널 설정 레코드
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelConfig {
    /// 프린터(Moonraker) 호스트
    #[serde(default = "default_printer_host")]
    pub printer_host: String,
    /// 프린터(Moonraker) 포트
    #[serde(default = "default_printer_port")]
    pub printer_port: String,
    /// OBS 호스트
    #[serde(default = "default_studio_host")]
    pub studio_host: String,
    /// OBS 포트
    #[serde(default = "default_studio_port")]
    pub studio_port: String,
    /// OBS 비밀번호 (빈 문자열이면 인증 없이 연결)
    #[serde(default)]
    pub studio_password: String,
    /// 툴체인지 중 씬 이름
    #[serde(default)]
    pub scene_tool_changing: String,
    /// 출력 중 씬 이름
    #[serde(default)]
    pub scene_printing: String,
    /// 툴체인지 시작 트리거 문구
    #[serde(default = "default_trigger_tool_changing")]
    pub trigger_tool_changing: String,
    /// 툴체인지 완료 트리거 문구
    #[serde(default = "default_trigger_printing")]
    pub trigger_printing: String,
}

fn default_printer_host() -> String {
    DEFAULT_PRINTER_HOST.to_string()
}

fn default_printer_port() -> String {
    DEFAULT_PRINTER_PORT.to_string()
}

fn default_studio_host() -> String {
    DEFAULT_STUDIO_HOST.to_string()
}

fn default_studio_port() -> String {
    DEFAULT_STUDIO_PORT.to_string()
}

fn default_trigger_tool_changing() -> String {
    DEFAULT_TRIGGER_TOOL_CHANGING.to_string()
}

fn default_trigger_printing() -> String {
    DEFAULT_TRIGGER_PRINTING.to_string()
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            printer_host: default_printer_host(),
            printer_port: default_printer_port(),
            studio_host: default_studio_host(),
            studio_port: default_studio_port(),
            studio_password: String::new(),
            scene_tool_changing: String::new(),
            scene_printing: String::new(),
            trigger_tool_changing: default_trigger_tool_changing(),
            trigger_printing: default_trigger_printing(),
        }
    }
}

impl PanelConfig {
    /// 빈 호스트/포트를 기본값으로 되돌린다 (저장된 레코드를 읽은 직후 적용)
    pub fn normalized(mut self) -> Self {
        fn fill(value: &mut String, default: &str) {
            if value.is_empty() {
                *value = default.to_string();
            }
        }
        fill(&mut self.printer_host, DEFAULT_PRINTER_HOST);
        fill(&mut self.printer_port, DEFAULT_PRINTER_PORT);
        fill(&mut self.studio_host, DEFAULT_STUDIO_HOST);
        fill(&mut self.studio_port, DEFAULT_STUDIO_PORT);
        self
    }

    /// 역할에 설정된 씬 이름 (미설정이면 빈 문자열)
    pub fn scene_for(&self, role: SceneRole) -> &str {
        match role {
            SceneRole::ToolChanging => &self.scene_tool_changing,
            SceneRole::Printing => &self.scene_printing,
        }
    }

    pub fn set_scene(&mut self, role: SceneRole, name: impl Into<String>) {
        let name = name.into();
        match role {
            SceneRole::ToolChanging => self.scene_tool_changing = name,
            SceneRole::Printing => self.scene_printing = name,
        }
    }

    /// 비밀번호 (빈 문자열이면 None)
    pub fn password(&self) -> Option<&str> {
        if self.studio_password.is_empty() {
            None
        } else {
            Some(&self.studio_password)
        }
    }

    /// 제어 표면 노출용 복제본 — 비밀번호를 가린다
    pub fn masked(&self) -> Self {
        let mut copy = self.clone();
        if !copy.studio_password.is_empty() {
            copy.studio_password = PASSWORD_MASK.to_string();
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_fall_back_to_defaults() {
        let config: PanelConfig = serde_json::from_str(
            r#"{"printerHost":"printer.lan","sceneToolChanging":"CamA"}"#,
        )
        .unwrap();

        assert_eq!(config.printer_host, "printer.lan");
        assert_eq!(config.printer_port, "7125");
        assert_eq!(config.studio_host, "localhost");
        assert_eq!(config.studio_port, "4455");
        assert_eq!(config.studio_password, "");
        assert_eq!(config.scene_tool_changing, "CamA");
        assert_eq!(config.scene_printing, "");
        assert_eq!(config.trigger_tool_changing, "Toolchange Starting");
        assert_eq!(config.trigger_printing, "Toolchange Completed");
    }

    #[test]
    fn serializes_camel_case_without_nulls() {
        let json = serde_json::to_value(PanelConfig::default()).unwrap();
        let obj = json.as_object().unwrap();

        assert_eq!(obj.len(), 9);
        assert!(obj.contains_key("printerHost"));
        assert!(obj.contains_key("triggerToolChanging"));
        assert!(obj.values().all(|v| v.is_string()));
    }

    #[test]
    fn normalized_fills_blank_endpoints_only() {
        let config = PanelConfig {
            printer_host: String::new(),
            studio_port: String::new(),
            trigger_printing: String::new(),
            ..PanelConfig::default()
        }
        .normalized();

        assert_eq!(config.printer_host, DEFAULT_PRINTER_HOST);
        assert_eq!(config.studio_port, DEFAULT_STUDIO_PORT);
        // 트리거 공백은 분류 시점에 기본값으로 처리
        assert_eq!(config.trigger_printing, "");
    }

    #[test]
    fn scene_accessors_by_role() {
        let mut config = PanelConfig::default();
        config.set_scene(SceneRole::Printing, "CamB");
        assert_eq!(config.scene_for(SceneRole::Printing), "CamB");
        assert_eq!(config.scene_for(SceneRole::ToolChanging), "");
    }

    #[test]
    fn masked_hides_password() {
        let config = PanelConfig {
            studio_password: "hunter2".to_string(),
            ..PanelConfig::default()
        };
        assert_eq!(config.password(), Some("hunter2"));
        assert_ne!(config.masked().studio_password, "hunter2");
        assert_eq!(PanelConfig::default().masked().studio_password, "");
    }
}
