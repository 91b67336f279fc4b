//! Moonraker 프린터 링크.
//!
//! `ws://{host}:{port}/websocket`에 JSON-RPC 알림 스트림으로 연결하고,
//! `notify_gcode_response` 알림의 로그 줄을 트리거 문구와 비교해 툴체인지 이벤트를 발행한다.
//! 연결이 끊기면 연결 유지 의도가 남아 있는 동안 고정 지연 후 마지막 주소로 다시 연결한다.

use async_trait::async_trait;
use parking_lot::Mutex;
use sceneswap_core::models::connection::ConnectionState;
use sceneswap_core::models::toolchange::ToolchangeKind;
use sceneswap_core::ports::printer::{PrinterEvent, PrinterLink};
use sceneswap_core::trigger::TriggerPhrases;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::ws_client::{FrameSink, FrameTransport, WsMessage};

/// 처리 대상 알림 메서드
pub const GCODE_RESPONSE_METHOD: &str = "notify_gcode_response";

/// 이벤트 채널 용량
const EVENT_CAPACITY: usize = 256;

/// 프린터 WebSocket 주소
pub fn printer_url(host: &str, port: &str) -> String {
    format!("ws://{host}:{port}/websocket")
}

/// 수신 프레임에서 툴체인지 경계를 순서대로 추출한다.
///
/// 다른 메서드의 알림이나 배열이 아닌 `params`는 빈 결과다.
pub fn parse_toolchanges(
    text: &str,
    triggers: &TriggerPhrases,
) -> Result<Vec<ToolchangeKind>, serde_json::Error> {
    let frame: Value = serde_json::from_str(text)?;
    if frame.get("method").and_then(Value::as_str) != Some(GCODE_RESPONSE_METHOD) {
        return Ok(Vec::new());
    }
    let Some(params) = frame.get("params").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };
    Ok(params
        .iter()
        .filter_map(|entry| triggers.classify_value(entry))
        .collect())
}

#[derive(Default)]
struct Session {
    /// 연결/해제마다 증가. 이전 세대 태스크는 아무것도 발행하지 못한다.
    generation: u64,
    sink: Option<Arc<dyn FrameSink>>,
    task: Option<JoinHandle<()>>,
}

struct Inner {
    transport: Arc<dyn FrameTransport>,
    triggers: watch::Receiver<TriggerPhrases>,
    reconnect_delay: Duration,
    state: watch::Sender<ConnectionState>,
    events: broadcast::Sender<PrinterEvent>,
    intent: AtomicBool,
    endpoint: Mutex<Option<(String, String)>>,
    session: Mutex<Session>,
}

impl Inner {
    /// 현재 세대일 때만 상태/이벤트를 반영한다
    fn publish(
        &self,
        generation: u64,
        state: Option<ConnectionState>,
        event: Option<PrinterEvent>,
    ) -> bool {
        let session = self.session.lock();
        if session.generation != generation {
            return false;
        }
        if let Some(state) = state {
            self.state.send_replace(state);
        }
        if let Some(event) = event {
            let _ = self.events.send(event);
        }
        true
    }

    fn attach(&self, generation: u64, sink: Arc<dyn FrameSink>) -> bool {
        let mut session = self.session.lock();
        if session.generation != generation {
            return false;
        }
        session.sink = Some(sink);
        self.state.send_replace(ConnectionState::Connected);
        let _ = self.events.send(PrinterEvent::Connected);
        true
    }

    fn detach(&self, generation: u64) {
        let mut session = self.session.lock();
        if session.generation == generation {
            session.sink = None;
        }
    }

    async fn supervise(self: Arc<Self>, generation: u64) {
        loop {
            let endpoint = self.endpoint.lock().clone();
            let Some((host, port)) = endpoint else {
                return;
            };
            let url = printer_url(&host, &port);
            if !self.publish(generation, Some(ConnectionState::Connecting), None) {
                return;
            }

            match self.transport.open(&url).await {
                Ok(conn) => {
                    if !self.attach(generation, conn.sink.clone()) {
                        let _ = conn.sink.close().await;
                        return;
                    }
                    info!("Moonraker 연결 완료: {url}");
                    if !self.pump(generation, conn.incoming).await {
                        return;
                    }
                    self.detach(generation);
                }
                Err(e) => {
                    warn!("Moonraker 연결 실패: {e}");
                    if !self.publish(generation, None, Some(PrinterEvent::Error(e.to_string()))) {
                        return;
                    }
                }
            }

            if !self.publish(
                generation,
                Some(ConnectionState::Disconnected),
                Some(PrinterEvent::Disconnected),
            ) {
                return;
            }
            if !self.intent.load(Ordering::SeqCst) {
                return;
            }

            let delay_ms = u64::try_from(self.reconnect_delay.as_millis()).unwrap_or(u64::MAX);
            if !self.publish(
                generation,
                None,
                Some(PrinterEvent::ReconnectScheduled { delay_ms }),
            ) {
                return;
            }
            debug!("Moonraker 재연결 대기: {delay_ms}ms");
            tokio::time::sleep(self.reconnect_delay).await;

            if !self.intent.load(Ordering::SeqCst) {
                return;
            }
        }
    }

    /// 연결이 닫힐 때까지 수신 처리. 세대가 바뀌면 false.
    async fn pump(&self, generation: u64, mut incoming: mpsc::Receiver<WsMessage>) -> bool {
        while let Some(message) = incoming.recv().await {
            match message {
                WsMessage::Text(text) => {
                    let triggers = self.triggers.borrow().clone();
                    match parse_toolchanges(&text, &triggers) {
                        Ok(kinds) => {
                            for kind in kinds {
                                debug!("툴체인지 경계 감지: {kind:?}");
                                if !self.publish(generation, None, Some(PrinterEvent::Toolchange(kind)))
                                {
                                    return false;
                                }
                            }
                        }
                        Err(e) => warn!("Moonraker 메시지 파싱 실패: {e}"),
                    }
                }
                WsMessage::Binary(data) => debug!("바이너리 프레임 무시: {} bytes", data.len()),
                WsMessage::Error(e) => {
                    if !self.publish(generation, None, Some(PrinterEvent::Error(e))) {
                        return false;
                    }
                }
                WsMessage::Close(info) => {
                    debug!("Moonraker 종료 프레임: {info:?}");
                    break;
                }
            }
        }
        true
    }
}

/// Moonraker WebSocket 기반 [`PrinterLink`] 구현
pub struct MoonrakerLink {
    inner: Arc<Inner>,
}

impl MoonrakerLink {
    /// 트리거 문구는 `triggers` 채널에서 프레임마다 다시 읽는다
    pub fn new(
        transport: Arc<dyn FrameTransport>,
        triggers: watch::Receiver<TriggerPhrases>,
        reconnect_delay: Duration,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                transport,
                triggers,
                reconnect_delay,
                state,
                events,
                intent: AtomicBool::new(false),
                endpoint: Mutex::new(None),
                session: Mutex::new(Session::default()),
            }),
        }
    }

    /// 상태 변경 구독
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// 마지막으로 사용한 주소
    pub fn endpoint(&self) -> Option<(String, String)> {
        self.inner.endpoint.lock().clone()
    }
}

#[async_trait]
impl PrinterLink for MoonrakerLink {
    fn connect(&self, host: &str, port: &str) {
        *self.inner.endpoint.lock() = Some((host.to_string(), port.to_string()));
        self.inner.intent.store(true, Ordering::SeqCst);

        let old_sink = {
            let mut session = self.inner.session.lock();
            session.generation += 1;
            if let Some(task) = session.task.take() {
                task.abort();
            }
            let old_sink = session.sink.take();
            session.task = Some(tokio::spawn(
                self.inner.clone().supervise(session.generation),
            ));
            old_sink
        };

        if let Some(sink) = old_sink {
            tokio::spawn(async move {
                let _ = sink.close().await;
            });
        }
    }

    async fn disconnect(&self) {
        self.inner.intent.store(false, Ordering::SeqCst);
        let (sink, task) = {
            let mut session = self.inner.session.lock();
            session.generation += 1;
            (session.sink.take(), session.task.take())
        };
        if let Some(task) = task {
            task.abort();
        }
        if let Some(sink) = sink {
            if let Err(e) = sink.close().await {
                debug!("Moonraker 종료 프레임 전송 실패: {e}");
            }
        }

        let previous = self.inner.state.send_replace(ConnectionState::Disconnected);
        if previous != ConnectionState::Disconnected {
            info!("Moonraker 연결 해제");
            let _ = self.inner.events.send(PrinterEvent::Disconnected);
        }
    }

    fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    fn wants_connection(&self) -> bool {
        self.inner.intent.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> broadcast::Receiver<PrinterEvent> {
        self.inner.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws_client::WsConnection;
    use sceneswap_core::error::CoreError;
    use serde_json::json;
    use std::collections::VecDeque;
    use tokio::time::Instant;

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<String>>,
        closed: AtomicBool,
    }

    #[async_trait]
    impl FrameSink for RecordingSink {
        async fn send_text(&self, text: &str) -> Result<(), CoreError> {
            self.sent.lock().push(text.to_string());
            Ok(())
        }

        async fn close(&self) -> Result<(), CoreError> {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    /// 준비된 수신 채널이 없으면 연결 거부
    #[derive(Default)]
    struct FakeTransport {
        urls: Mutex<Vec<String>>,
        feeds: Mutex<VecDeque<mpsc::Receiver<WsMessage>>>,
        sinks: Mutex<Vec<Arc<RecordingSink>>>,
    }

    impl FakeTransport {
        fn feed(&self) -> mpsc::Sender<WsMessage> {
            let (tx, rx) = mpsc::channel(16);
            self.feeds.lock().push_back(rx);
            tx
        }

        fn urls(&self) -> Vec<String> {
            self.urls.lock().clone()
        }
    }

    #[async_trait]
    impl FrameTransport for FakeTransport {
        async fn open(&self, url: &str) -> Result<WsConnection, CoreError> {
            self.urls.lock().push(url.to_string());
            let incoming = self
                .feeds
                .lock()
                .pop_front()
                .ok_or_else(|| CoreError::Network("connection refused".to_string()))?;
            let sink = Arc::new(RecordingSink::default());
            self.sinks.lock().push(sink.clone());
            Ok(WsConnection { sink, incoming })
        }
    }

    fn gcode(params: Value) -> WsMessage {
        WsMessage::Text(
            json!({"jsonrpc": "2.0", "method": GCODE_RESPONSE_METHOD, "params": params})
                .to_string(),
        )
    }

    async fn next(events: &mut broadcast::Receiver<PrinterEvent>) -> PrinterEvent {
        tokio::time::timeout(Duration::from_secs(30), events.recv())
            .await
            .expect("event timeout")
            .expect("channel closed")
    }

    fn link_with(
        transport: &Arc<FakeTransport>,
    ) -> (MoonrakerLink, watch::Sender<TriggerPhrases>) {
        let (trigger_tx, trigger_rx) = watch::channel(TriggerPhrases::default());
        let link = MoonrakerLink::new(transport.clone(), trigger_rx, Duration::from_secs(5));
        (link, trigger_tx)
    }

    #[test]
    fn parse_ignores_other_methods_and_shapes() {
        let t = TriggerPhrases::default();
        let status = json!({"method": "notify_status_update", "params": ["Toolchange Starting"]});
        assert!(parse_toolchanges(&status.to_string(), &t).unwrap().is_empty());

        let scalar = json!({"method": GCODE_RESPONSE_METHOD, "params": "Toolchange Starting"});
        assert!(parse_toolchanges(&scalar.to_string(), &t).unwrap().is_empty());

        assert!(parse_toolchanges("{broken", &t).is_err());
    }

    #[tokio::test]
    async fn emits_toolchanges_in_frame_order() {
        let transport = Arc::new(FakeTransport::default());
        let frames = transport.feed();
        let (link, _triggers) = link_with(&transport);
        let mut events = link.subscribe();

        link.connect("voron.local", "7125");
        assert_eq!(next(&mut events).await, PrinterEvent::Connected);
        assert_eq!(link.state(), ConnectionState::Connected);
        assert!(link.wants_connection());

        frames
            .send(gcode(json!([
                "echo: Toolchange Starting",
                "ok",
                "Toolchange Completed"
            ])))
            .await
            .unwrap();
        assert_eq!(
            next(&mut events).await,
            PrinterEvent::Toolchange(ToolchangeKind::Start)
        );
        assert_eq!(
            next(&mut events).await,
            PrinterEvent::Toolchange(ToolchangeKind::Complete)
        );
        assert_eq!(transport.urls(), vec!["ws://voron.local:7125/websocket"]);
    }

    #[tokio::test]
    async fn malformed_and_unrelated_frames_are_skipped() {
        let transport = Arc::new(FakeTransport::default());
        let frames = transport.feed();
        let (link, _triggers) = link_with(&transport);
        let mut events = link.subscribe();

        link.connect("voron.local", "7125");
        assert_eq!(next(&mut events).await, PrinterEvent::Connected);

        frames.send(WsMessage::Text("not json".into())).await.unwrap();
        frames.send(WsMessage::Binary(vec![1, 2, 3])).await.unwrap();
        frames
            .send(WsMessage::Text(
                json!({"method": "notify_proc_stat_update", "params": ["Toolchange Starting"]})
                    .to_string(),
            ))
            .await
            .unwrap();
        frames
            .send(gcode(json!([42, null, {"x": 1}, "Toolchange Completed"])))
            .await
            .unwrap();

        assert_eq!(
            next(&mut events).await,
            PrinterEvent::Toolchange(ToolchangeKind::Complete)
        );
        assert_eq!(link.state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn trigger_changes_apply_to_next_frame() {
        let transport = Arc::new(FakeTransport::default());
        let frames = transport.feed();
        let (link, triggers) = link_with(&transport);
        let mut events = link.subscribe();

        link.connect("voron.local", "7125");
        assert_eq!(next(&mut events).await, PrinterEvent::Connected);

        triggers.send_replace(TriggerPhrases::new("Swap", "Done"));
        frames.send(gcode(json!(["echo: Swap"]))).await.unwrap();
        assert_eq!(
            next(&mut events).await,
            PrinterEvent::Toolchange(ToolchangeKind::Start)
        );

        // 이전 기본 문구는 더 이상 매칭되지 않는다
        frames
            .send(gcode(json!(["Toolchange Starting", "Done"])))
            .await
            .unwrap();
        assert_eq!(
            next(&mut events).await,
            PrinterEvent::Toolchange(ToolchangeKind::Complete)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn reconnects_once_per_close_after_fixed_delay() {
        let transport = Arc::new(FakeTransport::default());
        let frames = transport.feed();
        let (link, _triggers) = link_with(&transport);
        let mut events = link.subscribe();

        link.connect("voron.local", "7125");
        assert_eq!(next(&mut events).await, PrinterEvent::Connected);

        drop(frames);
        assert_eq!(next(&mut events).await, PrinterEvent::Disconnected);
        assert_eq!(
            next(&mut events).await,
            PrinterEvent::ReconnectScheduled { delay_ms: 5_000 }
        );
        let scheduled_at = Instant::now();
        assert_eq!(transport.urls().len(), 1);

        // 준비된 채널이 없으므로 재시도는 거부된다
        assert!(matches!(next(&mut events).await, PrinterEvent::Error(_)));
        assert!(scheduled_at.elapsed() >= Duration::from_secs(5));
        assert_eq!(next(&mut events).await, PrinterEvent::Disconnected);
        assert_eq!(
            next(&mut events).await,
            PrinterEvent::ReconnectScheduled { delay_ms: 5_000 }
        );

        let urls = transport.urls();
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0], urls[1]);
        assert!(link.wants_connection());
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_closes_socket_and_never_retries() {
        let transport = Arc::new(FakeTransport::default());
        let _frames = transport.feed();
        let (link, _triggers) = link_with(&transport);
        let mut events = link.subscribe();

        link.connect("voron.local", "7125");
        assert_eq!(next(&mut events).await, PrinterEvent::Connected);

        link.disconnect().await;
        assert_eq!(next(&mut events).await, PrinterEvent::Disconnected);
        assert_eq!(link.state(), ConnectionState::Disconnected);
        assert!(!link.wants_connection());
        assert!(transport.sinks.lock()[0].closed.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(transport.urls().len(), 1);
        assert!(events.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_during_reconnect_wait_cancels_retry() {
        let transport = Arc::new(FakeTransport::default());
        let (link, _triggers) = link_with(&transport);
        let mut events = link.subscribe();

        link.connect("voron.local", "7125");
        assert!(matches!(next(&mut events).await, PrinterEvent::Error(_)));
        assert_eq!(next(&mut events).await, PrinterEvent::Disconnected);
        assert!(matches!(
            next(&mut events).await,
            PrinterEvent::ReconnectScheduled { .. }
        ));

        link.disconnect().await;
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(transport.urls().len(), 1);
        assert!(events.try_recv().is_err());
    }
}
