//! WebSocket 클라이언트.
//!
//! `tokio-tungstenite` 기반. 링크들은 [`FrameTransport`]/[`FrameSink`] trait만 보므로
//! 실제 소켓 대신 인메모리 전송을 주입할 수 있다.

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use sceneswap_core::error::CoreError;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// 수신 채널 용량
const INCOMING_CAPACITY: usize = 64;

/// 원격이 보낸 종료 프레임 정보
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseInfo {
    /// 종료 코드 (예: 4009 인증 실패)
    pub code: u16,
    /// 종료 사유
    pub reason: String,
}

/// WebSocket으로 수신한 메시지
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsMessage {
    /// 텍스트 메시지 (JSON)
    Text(String),
    /// 바이너리 메시지
    Binary(Vec<u8>),
    /// 전송 에러 (직후 채널이 닫힌다)
    Error(String),
    /// 연결 종료
    Close(Option<CloseInfo>),
}

/// 송신 측 핸들
#[async_trait]
pub trait FrameSink: Send + Sync {
    /// 텍스트 프레임 전송
    async fn send_text(&self, text: &str) -> Result<(), CoreError>;

    /// 종료 프레임 전송
    async fn close(&self) -> Result<(), CoreError>;
}

/// 열린 연결. `incoming` 채널이 끝나면 연결이 닫힌 것이다.
pub struct WsConnection {
    pub sink: Arc<dyn FrameSink>,
    pub incoming: mpsc::Receiver<WsMessage>,
}

/// URL로 연결을 여는 전송 계층
#[async_trait]
pub trait FrameTransport: Send + Sync {
    async fn open(&self, url: &str) -> Result<WsConnection, CoreError>;
}

/// `tokio-tungstenite` 기반 전송
#[derive(Debug, Default, Clone)]
pub struct WsClient;

impl WsClient {
    /// 새 WebSocket 클라이언트 생성
    pub fn new() -> Self {
        Self
    }

    /// WebSocket 연결 수립
    ///
    /// 수신 메시지는 `rx`로, 송신은 반환된 `WsSender`로 처리.
    pub async fn connect(
        &self,
        url: &str,
    ) -> Result<(WsSender, mpsc::Receiver<WsMessage>), CoreError> {
        info!("WebSocket 연결: {url}");

        let (ws_stream, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| CoreError::Network(format!("WebSocket 연결 실패: {url}: {e}")))?;

        let (write, read) = ws_stream.split();
        let (tx, rx) = mpsc::channel(INCOMING_CAPACITY);

        // 수신 태스크
        tokio::spawn(Self::read_loop(read, tx));

        Ok((
            WsSender {
                write: tokio::sync::Mutex::new(write),
            },
            rx,
        ))
    }

    /// 수신 루프
    async fn read_loop(mut read: SplitStream<WsStream>, tx: mpsc::Sender<WsMessage>) {
        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    if tx.send(WsMessage::Text(text.as_str().to_owned())).await.is_err() {
                        break;
                    }
                }
                Ok(Message::Binary(data)) => {
                    if tx.send(WsMessage::Binary(data.to_vec())).await.is_err() {
                        break;
                    }
                }
                Ok(Message::Close(frame)) => {
                    let info = frame.map(|f| CloseInfo {
                        code: u16::from(f.code),
                        reason: f.reason.as_str().to_owned(),
                    });
                    let _ = tx.send(WsMessage::Close(info)).await;
                    break;
                }
                Ok(_) => {} // Ping/Pong은 자동 처리
                Err(e) => {
                    warn!("WebSocket 수신 에러: {e}");
                    let _ = tx.send(WsMessage::Error(e.to_string())).await;
                    break;
                }
            }
        }
        debug!("WebSocket 수신 루프 종료");
    }
}

#[async_trait]
impl FrameTransport for WsClient {
    async fn open(&self, url: &str) -> Result<WsConnection, CoreError> {
        let (sender, incoming) = self.connect(url).await?;
        Ok(WsConnection {
            sink: Arc::new(sender),
            incoming,
        })
    }
}

/// WebSocket 송신기
pub struct WsSender {
    write: tokio::sync::Mutex<SplitSink<WsStream, Message>>,
}

#[async_trait]
impl FrameSink for WsSender {
    async fn send_text(&self, text: &str) -> Result<(), CoreError> {
        let mut write = self.write.lock().await;
        write
            .send(Message::text(text.to_owned()))
            .await
            .map_err(|e| CoreError::Network(format!("WebSocket 전송 실패: {e}")))
    }

    async fn close(&self) -> Result<(), CoreError> {
        let mut write = self.write.lock().await;
        write
            .send(Message::Close(None))
            .await
            .map_err(|e| CoreError::Network(format!("WebSocket 종료 실패: {e}")))
    }
}
