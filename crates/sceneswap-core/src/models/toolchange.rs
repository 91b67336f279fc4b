//! 툴체인지 이벤트와 씬 역할.

use serde::{Deserialize, Serialize};

/// 툴체인지 경계 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolchangeKind {
    /// 툴체인지 시작
    Start,
    /// 툴체인지 완료
    Complete,
}

impl ToolchangeKind {
    /// 이 경계에서 활성화할 씬 역할
    pub fn target_role(self) -> SceneRole {
        match self {
            ToolchangeKind::Start => SceneRole::ToolChanging,
            ToolchangeKind::Complete => SceneRole::Printing,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ToolchangeKind::Start => "Starting",
            ToolchangeKind::Complete => "Completed",
        }
    }
}

/// 씬 선택 역할 (설정 레코드의 두 씬 필드에 대응)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneRole {
    /// 툴체인지 중 송출할 씬
    ToolChanging,
    /// 출력 중 송출할 씬
    Printing,
}

impl SceneRole {
    /// 로그 패널 표시 이름
    pub fn display_name(self) -> &'static str {
        match self {
            SceneRole::ToolChanging => "Tool Changing",
            SceneRole::Printing => "Printing",
        }
    }
}

impl std::fmt::Display for SceneRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
