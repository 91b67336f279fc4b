//! SSE 로그 스트림 핸들러.

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use sceneswap_core::models::log::{LogEntry, LogLevel};
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::AppState;

/// SSE 스트림 엔드포인트
///
/// GET /api/log/stream
///
/// 새 로그 항목을 Server-Sent Events로 전송한다. 이벤트 이름은 로그 수준이다.
/// 클라이언트는 EventSource API로 수신.
pub async fn log_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.reconciler.log().subscribe();
    let stream = BroadcastStream::new(rx);

    let sse_stream = stream.filter_map(|result| match result {
        Ok(entry) => to_event(&entry).map(Ok),
        Err(_) => None, // 채널 지연 시 스킵
    });

    Sse::new(sse_stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn to_event(entry: &LogEntry) -> Option<Event> {
    let json = serde_json::to_string(entry).ok()?;
    Some(
        Event::default()
            .event(level_name(entry.level))
            .id(entry.seq.to_string())
            .data(json),
    )
}

/// 이벤트 이름
fn level_name(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Info => "info",
        LogLevel::Success => "success",
        LogLevel::Warn => "warn",
        LogLevel::Error => "error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn serialize_log_entry() {
        let entry = LogEntry {
            seq: 7,
            timestamp: Utc::now(),
            level: LogLevel::Warn,
            message: "No scenes found in OBS".to_string(),
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"level\":\"warn\""));
        assert!(json.contains("\"seq\":7"));
        assert_eq!(level_name(entry.level), "warn");
        assert!(to_event(&entry).is_some());
    }
}
