//! 툴체인지 트리거 매처.
//!
//! 프린터 G-code 응답 로그 한 줄이 툴체인지 시작/완료 경계인지 판정한다.
//! 역할별 허용 문자열은 `{문구, "echo: " + 문구}` 두 가지이며,
//! 대소문자를 구분하는 접두사 비교로 매칭한다. 시작 문구를 먼저 검사한다.

use serde_json::Value;

use crate::models::panel::{PanelConfig, DEFAULT_TRIGGER_PRINTING, DEFAULT_TRIGGER_TOOL_CHANGING};
use crate::models::toolchange::ToolchangeKind;

/// Klipper `RESPOND`/`M118` 출력에 붙는 접두사
pub const ECHO_PREFIX: &str = "echo: ";

/// 현재 설정된 트리거 문구 쌍
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerPhrases {
    start: String,
    complete: String,
}

impl TriggerPhrases {
    /// 빈 문구는 기본 문구로 대체된다
    pub fn new(start: &str, complete: &str) -> Self {
        fn or_default(phrase: &str, default: &str) -> String {
            if phrase.is_empty() {
                default.to_string()
            } else {
                phrase.to_string()
            }
        }
        Self {
            start: or_default(start, DEFAULT_TRIGGER_TOOL_CHANGING),
            complete: or_default(complete, DEFAULT_TRIGGER_PRINTING),
        }
    }

    pub fn from_config(config: &PanelConfig) -> Self {
        Self::new(&config.trigger_tool_changing, &config.trigger_printing)
    }

    pub fn phrase(&self, kind: ToolchangeKind) -> &str {
        match kind {
            ToolchangeKind::Start => &self.start,
            ToolchangeKind::Complete => &self.complete,
        }
    }

    /// 역할별 허용 문자열 집합 (저장하지 않고 매번 계산)
    pub fn variants(&self, kind: ToolchangeKind) -> [String; 2] {
        let phrase = self.phrase(kind);
        [phrase.to_string(), format!("{ECHO_PREFIX}{phrase}")]
    }

    /// 로그 한 줄 분류. 매칭되지 않으면 `None`.
    pub fn classify(&self, line: &str) -> Option<ToolchangeKind> {
        [ToolchangeKind::Start, ToolchangeKind::Complete]
            .into_iter()
            .find(|kind| {
                self.variants(*kind)
                    .iter()
                    .any(|variant| line.starts_with(variant.as_str()))
            })
    }

    /// JSON 파라미터 항목 분류 — 문자열이 아니면 빈 문자열로 취급한다
    pub fn classify_value(&self, entry: &Value) -> Option<ToolchangeKind> {
        self.classify(entry.as_str().unwrap_or(""))
    }
}

impl Default for TriggerPhrases {
    fn default() -> Self {
        Self::new("", "")
    }
}
