//! 로그 패널.
//!
//! 사용자에게 보이는 실행 로그. 최근 항목을 제한된 개수만큼 보관하고
//! `tokio::broadcast`로 새 항목을 실시간 구독자에게 보낸다.
//! 모든 항목은 같은 수준으로 `tracing`에도 기록된다.

use chrono::Utc;
use parking_lot::Mutex;
use sceneswap_core::models::log::{LogEntry, LogLevel};
use std::collections::VecDeque;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

/// 기본 보관 개수
pub const DEFAULT_CAPACITY: usize = 500;

/// 구독 채널 용량
const STREAM_CAPACITY: usize = 128;

struct History {
    entries: VecDeque<LogEntry>,
    next_seq: u64,
}

/// 제한된 크기의 로그 패널
pub struct LogPanel {
    capacity: usize,
    history: Mutex<History>,
    tx: broadcast::Sender<LogEntry>,
}

impl LogPanel {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _) = broadcast::channel(STREAM_CAPACITY);
        Self {
            capacity,
            history: Mutex::new(History {
                entries: VecDeque::with_capacity(capacity),
                next_seq: 1,
            }),
            tx,
        }
    }

    /// 항목 추가. 용량을 넘으면 가장 오래된 항목부터 버린다.
    pub fn push(&self, level: LogLevel, message: impl Into<String>) -> LogEntry {
        let message = message.into();
        match level {
            LogLevel::Info | LogLevel::Success => info!(target: "sceneswap::panel", "{message}"),
            LogLevel::Warn => warn!(target: "sceneswap::panel", "{message}"),
            LogLevel::Error => error!(target: "sceneswap::panel", "{message}"),
        }

        let entry = {
            let mut history = self.history.lock();
            let entry = LogEntry {
                seq: history.next_seq,
                timestamp: Utc::now(),
                level,
                message,
            };
            history.next_seq += 1;
            if history.entries.len() == self.capacity {
                history.entries.pop_front();
            }
            history.entries.push_back(entry.clone());
            entry
        };

        let _ = self.tx.send(entry.clone());
        entry
    }

    pub fn info(&self, message: impl Into<String>) -> LogEntry {
        self.push(LogLevel::Info, message)
    }

    pub fn success(&self, message: impl Into<String>) -> LogEntry {
        self.push(LogLevel::Success, message)
    }

    pub fn warn(&self, message: impl Into<String>) -> LogEntry {
        self.push(LogLevel::Warn, message)
    }

    pub fn error(&self, message: impl Into<String>) -> LogEntry {
        self.push(LogLevel::Error, message)
    }

    /// 보관 중인 항목 (오래된 순)
    pub fn history(&self) -> Vec<LogEntry> {
        self.history.lock().entries.iter().cloned().collect()
    }

    /// `seq`보다 나중 항목만
    pub fn since(&self, seq: u64) -> Vec<LogEntry> {
        self.history
            .lock()
            .entries
            .iter()
            .filter(|entry| entry.seq > seq)
            .cloned()
            .collect()
    }

    /// 보관 중인 메시지 텍스트 (테스트/진단용)
    pub fn messages(&self) -> Vec<String> {
        self.history
            .lock()
            .entries
            .iter()
            .map(|entry| entry.message.clone())
            .collect()
    }

    /// 새 항목 구독
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.tx.subscribe()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for LogPanel {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_most_recent_entries() {
        let panel = LogPanel::new(3);
        for i in 0..5 {
            panel.info(format!("line {i}"));
        }
        assert_eq!(panel.messages(), vec!["line 2", "line 3", "line 4"]);
        assert_eq!(panel.history()[0].seq, 3);
    }

    #[test]
    fn since_filters_by_sequence() {
        let panel = LogPanel::default();
        let first = panel.info("a");
        panel.warn("b");
        panel.error("c");

        let later: Vec<_> = panel.since(first.seq).into_iter().map(|e| e.level).collect();
        assert_eq!(later, vec![LogLevel::Warn, LogLevel::Error]);
    }

    #[tokio::test]
    async fn subscribers_receive_new_entries() {
        let panel = LogPanel::default();
        let mut rx1 = panel.subscribe();
        let mut rx2 = panel.subscribe();

        panel.success("Connected to Moonraker");

        assert_eq!(rx1.recv().await.unwrap().message, "Connected to Moonraker");
        assert_eq!(rx2.recv().await.unwrap().level, LogLevel::Success);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let panel = LogPanel::new(0);
        panel.info("only");
        panel.info("latest");
        assert_eq!(panel.capacity(), 1);
        assert_eq!(panel.messages(), vec!["latest"]);
    }
}
