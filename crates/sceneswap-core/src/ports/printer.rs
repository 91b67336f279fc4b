//! 프린터 링크 포트.
//!
//! 구현: `sceneswap-network::printer_link` (Moonraker WebSocket)

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::models::connection::ConnectionState;
use crate::models::toolchange::ToolchangeKind;

/// 프린터 링크가 발행하는 신호
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrinterEvent {
    /// 소켓 열림
    Connected,
    /// 소켓 닫힘
    Disconnected,
    /// 재연결 예약됨
    ReconnectScheduled {
        /// 재시도까지 대기 시간 (밀리초)
        delay_ms: u64,
    },
    /// 전송 에러
    Error(String),
    /// 트리거 문구 감지
    Toolchange(ToolchangeKind),
}

/// 프린터 호스트와의 지속 연결
#[async_trait]
pub trait PrinterLink: Send + Sync {
    /// 연결 시작. 결과는 이벤트로만 보고되며 호출자에게 에러를 돌려주지 않는다.
    fn connect(&self, host: &str, port: &str);

    /// 연결 유지 의도를 해제하고 소켓을 닫는다. 재연결을 예약하지 않는다.
    async fn disconnect(&self);

    /// 현재 연결 상태
    fn state(&self) -> ConnectionState;

    /// 연결 유지 의도 (재연결 대기 중에도 true)
    fn wants_connection(&self) -> bool;

    /// 이벤트 구독
    fn subscribe(&self) -> broadcast::Receiver<PrinterEvent>;
}
