//! obs-websocket v5 스튜디오 링크.
//!
//! 핸드셰이크: Hello(op 0) → Identify(op 1, 필요 시 인증 문자열) → Identified(op 2).
//! 이후 요청(op 6)은 `requestId`로 응답(op 7)과 짝지어진다. 세션이 닫히면
//! 대기 중인 요청은 모두 `NotConnected`로 실패한다.

use async_trait::async_trait;
use parking_lot::Mutex;
use sceneswap_core::error::CoreError;
use sceneswap_core::models::connection::ConnectionState;
use sceneswap_core::models::toolchange::SceneRole;
use sceneswap_core::ports::studio::StudioLink;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::obs_protocol::{
    self, request, Identify, Request, RequestResponse, SceneList, ServerMessage,
    VirtualCamStatus, RPC_VERSION,
};
use crate::ws_client::{FrameSink, FrameTransport, WsMessage};

const STUDIO: &str = "OBS";

/// 스튜디오 WebSocket 주소
pub fn studio_url(host: &str, port: &str) -> String {
    format!("ws://{host}:{port}")
}

/// 응답 대기 테이블. `open`이 false면 더 이상 등록할 수 없다.
#[derive(Default)]
struct Pending {
    open: bool,
    waiters: HashMap<String, oneshot::Sender<RequestResponse>>,
}

struct Session {
    id: u64,
    sink: Arc<dyn FrameSink>,
    pending: Arc<Mutex<Pending>>,
    reader: JoinHandle<()>,
}

struct Inner {
    transport: Arc<dyn FrameTransport>,
    handshake_timeout: Duration,
    state: watch::Sender<ConnectionState>,
    session: Mutex<Option<Arc<Session>>>,
    next_session_id: Mutex<u64>,
    /// `disconnect()`마다 증가. 진행 중인 연결은 세션을 채우기 전에 이 값을 비교한다.
    epoch: AtomicU64,
}

impl Inner {
    fn current(&self) -> Option<Arc<Session>> {
        self.session.lock().clone()
    }

    /// 리더 태스크 종료 시 호출 — 같은 세션일 때만 슬롯을 비운다
    fn session_closed(&self, id: u64) {
        let mut slot = self.session.lock();
        if slot.as_ref().is_some_and(|s| s.id == id) {
            *slot = None;
            self.state.send_replace(ConnectionState::Disconnected);
            info!("OBS 세션 종료");
        }
    }
}

/// obs-websocket 기반 [`StudioLink`] 구현
pub struct ObsStudioLink {
    inner: Arc<Inner>,
}

impl ObsStudioLink {
    pub fn new(transport: Arc<dyn FrameTransport>, handshake_timeout: Duration) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(Inner {
                transport,
                handshake_timeout,
                state,
                session: Mutex::new(None),
                next_session_id: Mutex::new(0),
                epoch: AtomicU64::new(0),
            }),
        }
    }

    /// 상태 변경 구독
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// 요청 전송 후 응답 대기. 실패 상태 응답은 `Remote` 에러.
    async fn call(&self, request_type: &str, data: Option<Value>) -> Result<Value, CoreError> {
        let session = self
            .inner
            .current()
            .ok_or_else(|| CoreError::NotConnected(STUDIO.to_string()))?;

        let request_id = Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = session.pending.lock();
            if !pending.open {
                return Err(CoreError::NotConnected(STUDIO.to_string()));
            }
            pending.waiters.insert(request_id.clone(), tx);
        }

        let frame = obs_protocol::encode_request(&Request {
            request_type,
            request_id: &request_id,
            request_data: data,
        })?;
        if let Err(e) = session.sink.send_text(&frame).await {
            session.pending.lock().waiters.remove(&request_id);
            return Err(e);
        }
        debug!("OBS 요청 전송: {request_type} ({request_id})");

        let response = rx
            .await
            .map_err(|_| CoreError::NotConnected(STUDIO.to_string()))?;
        let status = response.request_status;
        if !status.result {
            return Err(CoreError::Remote {
                request: request_type.to_string(),
                code: status.code,
                comment: status.comment.unwrap_or_default(),
            });
        }
        Ok(response.response_data.unwrap_or(Value::Null))
    }

    /// Hello 수신부터 Identified까지
    async fn handshake(
        sink: &dyn FrameSink,
        incoming: &mut mpsc::Receiver<WsMessage>,
        password: Option<&str>,
    ) -> Result<(), CoreError> {
        let hello = match next_message(incoming).await? {
            ServerMessage::Hello(hello) => hello,
            other => {
                return Err(CoreError::Protocol(format!(
                    "Hello 대신 다른 메시지 수신: {other:?}"
                )))
            }
        };
        debug!(
            "OBS Hello 수신: version={:?}, rpc={}",
            hello.obs_web_socket_version, hello.rpc_version
        );
        if hello.rpc_version < RPC_VERSION {
            return Err(CoreError::Protocol(format!(
                "지원하지 않는 RPC 버전: {}",
                hello.rpc_version
            )));
        }

        let authentication = match (&hello.authentication, password) {
            (Some(challenge), Some(password)) if !password.is_empty() => Some(
                obs_protocol::auth_response(password, &challenge.salt, &challenge.challenge),
            ),
            (Some(_), _) => {
                return Err(CoreError::Auth("OBS가 비밀번호를 요구함".to_string()));
            }
            (None, _) => None,
        };

        let identify = obs_protocol::encode_identify(&Identify {
            rpc_version: RPC_VERSION,
            authentication,
            event_subscriptions: 0,
        })?;
        sink.send_text(&identify).await?;

        match next_message(incoming).await? {
            ServerMessage::Identified(identified) => {
                debug!("OBS 식별 완료: rpc={}", identified.negotiated_rpc_version);
                Ok(())
            }
            other => Err(CoreError::Protocol(format!(
                "Identified 대신 다른 메시지 수신: {other:?}"
            ))),
        }
    }

    /// 세션 수신 루프 — 응답을 대기자에게 전달한다
    async fn read_loop(
        inner: Arc<Inner>,
        id: u64,
        pending: Arc<Mutex<Pending>>,
        mut incoming: mpsc::Receiver<WsMessage>,
    ) {
        while let Some(message) = incoming.recv().await {
            match message {
                WsMessage::Text(text) => match obs_protocol::decode(&text) {
                    Ok(ServerMessage::RequestResponse(response)) => {
                        let waiter = pending.lock().waiters.remove(&response.request_id);
                        match waiter {
                            Some(waiter) => {
                                let _ = waiter.send(response);
                            }
                            None => debug!("대기자 없는 응답: {}", response.request_id),
                        }
                    }
                    Ok(ServerMessage::Event(_)) => {}
                    Ok(other) => debug!("처리하지 않는 OBS 메시지: {other:?}"),
                    Err(e) => warn!("OBS 메시지 파싱 실패: {e}"),
                },
                WsMessage::Binary(_) => {}
                WsMessage::Error(e) => {
                    warn!("OBS 전송 에러: {e}");
                    break;
                }
                WsMessage::Close(info) => {
                    debug!("OBS 종료 프레임: {info:?}");
                    break;
                }
            }
        }

        {
            let mut pending = pending.lock();
            pending.open = false;
            pending.waiters.clear();
        }
        inner.session_closed(id);
    }
}

/// 핸드셰이크 단계의 다음 메시지
async fn next_message(incoming: &mut mpsc::Receiver<WsMessage>) -> Result<ServerMessage, CoreError> {
    loop {
        match incoming.recv().await {
            Some(WsMessage::Text(text)) => return obs_protocol::decode(&text),
            Some(WsMessage::Binary(_)) => continue,
            Some(WsMessage::Close(info)) => {
                let (code, reason) = match info {
                    Some(info) => (Some(info.code), info.reason),
                    None => (None, String::new()),
                };
                return Err(obs_protocol::close_error(code, &reason));
            }
            Some(WsMessage::Error(e)) => return Err(CoreError::Network(e)),
            None => {
                return Err(CoreError::Network(
                    "핸드셰이크 중 연결이 닫힘".to_string(),
                ))
            }
        }
    }
}

#[async_trait]
impl StudioLink for ObsStudioLink {
    async fn connect(
        &self,
        host: &str,
        port: &str,
        password: Option<&str>,
    ) -> Result<(), CoreError> {
        if self.inner.current().is_some() {
            self.disconnect().await;
        }
        let epoch = self.inner.epoch.load(Ordering::SeqCst);

        let url = studio_url(host, port);
        self.inner.state.send_replace(ConnectionState::Connecting);
        info!("OBS 연결 시도: {url}");

        let mut conn = match self.inner.transport.open(&url).await {
            Ok(conn) => conn,
            Err(e) => {
                self.inner.state.send_replace(ConnectionState::Disconnected);
                return Err(e);
            }
        };

        let handshake = tokio::time::timeout(
            self.inner.handshake_timeout,
            Self::handshake(conn.sink.as_ref(), &mut conn.incoming, password),
        )
        .await
        .unwrap_or_else(|_| {
            Err(CoreError::Network(format!(
                "OBS 핸드셰이크 타임아웃 ({}ms)",
                self.inner.handshake_timeout.as_millis()
            )))
        });

        if let Err(e) = handshake {
            warn!("OBS 핸드셰이크 실패: {e}");
            let _ = conn.sink.close().await;
            self.inner.state.send_replace(ConnectionState::Disconnected);
            return Err(e);
        }

        let id = {
            let mut next = self.inner.next_session_id.lock();
            *next += 1;
            *next
        };
        let pending = Arc::new(Mutex::new(Pending {
            open: true,
            waiters: HashMap::new(),
        }));

        // 슬롯을 잡은 상태에서 리더를 띄워야 즉시 종료되는 세션도 정리된다
        let cancelled = {
            let mut slot = self.inner.session.lock();
            if self.inner.epoch.load(Ordering::SeqCst) != epoch {
                Some(conn.sink)
            } else {
                let reader = tokio::spawn(Self::read_loop(
                    self.inner.clone(),
                    id,
                    pending.clone(),
                    conn.incoming,
                ));
                *slot = Some(Arc::new(Session {
                    id,
                    sink: conn.sink,
                    pending,
                    reader,
                }));
                self.inner.state.send_replace(ConnectionState::Connected);
                None
            }
        };

        if let Some(sink) = cancelled {
            info!("연결 중 해제 요청, OBS 세션 폐기: {url}");
            let _ = sink.close().await;
            self.inner.state.send_replace(ConnectionState::Disconnected);
            return Err(CoreError::NotConnected(format!("{STUDIO} (연결 취소됨)")));
        }

        info!("OBS 연결 완료: {url}");
        Ok(())
    }

    async fn disconnect(&self) {
        let session = {
            let mut slot = self.inner.session.lock();
            self.inner.epoch.fetch_add(1, Ordering::SeqCst);
            slot.take()
        };
        let Some(session) = session else {
            self.inner.state.send_replace(ConnectionState::Disconnected);
            return;
        };

        {
            let mut pending = session.pending.lock();
            pending.open = false;
            pending.waiters.clear();
        }
        if let Err(e) = session.sink.close().await {
            debug!("OBS 종료 프레임 전송 실패: {e}");
        }
        session.reader.abort();
        self.inner.state.send_replace(ConnectionState::Disconnected);
        info!("OBS 연결 해제");
    }

    fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    async fn list_scenes(&self) -> Result<Vec<String>, CoreError> {
        let data = self.call(request::GET_SCENE_LIST, None).await?;
        let list: SceneList = serde_json::from_value(data)?;
        // OBS는 하단부터 나열하므로 뒤집어 화면 순서로 맞춘다
        Ok(list
            .scenes
            .into_iter()
            .rev()
            .map(|scene| scene.scene_name)
            .collect())
    }

    async fn switch_scene(&self, role: SceneRole, name: &str) -> Result<(), CoreError> {
        debug!("씬 전환 요청: {role} → {name}");
        self.call(
            request::SET_CURRENT_PROGRAM_SCENE,
            Some(json!({ "sceneName": name })),
        )
        .await
        .map(|_| ())
    }

    async fn virtual_cam_active(&self) -> Result<bool, CoreError> {
        let data = self.call(request::GET_VIRTUAL_CAM_STATUS, None).await?;
        let status: VirtualCamStatus = serde_json::from_value(data)?;
        Ok(status.output_active)
    }

    async fn start_virtual_cam(&self) -> Result<(), CoreError> {
        self.call(request::START_VIRTUAL_CAM, None).await.map(|_| ())
    }

    async fn stop_virtual_cam(&self) -> Result<(), CoreError> {
        self.call(request::STOP_VIRTUAL_CAM, None).await.map(|_| ())
    }
}
