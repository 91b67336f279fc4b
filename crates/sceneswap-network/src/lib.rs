//! # sceneswap-network
//!
//! WebSocket 네트워크 어댑터.
//! 프린터 호스트(Moonraker)와의 지속 연결, 스트리밍 소프트웨어(obs-websocket v5)와의
//! 요청/응답 세션을 담당한다. 두 링크 모두 [`ws_client::FrameTransport`] 뒤에서 동작하므로
//! 테스트에서는 인메모리 전송으로 교체할 수 있다.
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! use sceneswap_network::printer_link::MoonrakerLink;
//! use sceneswap_network::studio_link::ObsStudioLink;
//! use sceneswap_network::ws_client::WsClient;
//!
//! let transport = Arc::new(WsClient::new());
//! let printer = MoonrakerLink::new(transport.clone(), trigger_rx, Duration::from_secs(5));
//! let studio = ObsStudioLink::new(transport, Duration::from_secs(10));
//! ```

pub mod obs_protocol;
pub mod printer_link;
pub mod studio_link;
pub mod ws_client;
