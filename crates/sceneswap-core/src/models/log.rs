//! 로그 패널 항목.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 로그 항목 수준 — 패널 표시 색상에 대응
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Success,
    Warn,
    Error,
}

/// 로그 패널의 한 줄
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// 누적 순번 (1부터)
    pub seq: u64,
    /// 기록 시각
    pub timestamp: DateTime<Utc>,
    /// 수준
    pub level: LogLevel,
    /// 메시지
    pub message: String,
}
