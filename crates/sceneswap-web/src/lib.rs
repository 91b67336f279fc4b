//! # sceneswap-web
//!
//! 로컬 제어 표면 서버.
//! Axum 기반 REST API + SSE 로그 스트림.
//!
//! ## 기능
//! - 연결 상태/설정/씬 목록 조회
//! - 프린터/OBS 연결 토글
//! - 수동 씬 전환, 역할별 씬 선택
//! - 자동 전환/미리보기 토글
//! - 로그 이력 조회 및 실시간 구독

pub mod error;
pub mod handlers;
pub mod routes;

use axum::Router;
use sceneswap_control::reconciler::Reconciler;
use sceneswap_core::config::WebConfig;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// 포트 바인드 최대 시도 횟수
const MAX_PORT_ATTEMPTS: u16 = 10;

/// 바인드 후보 포트. `u16` 범위를 넘는 후보는 만들지 않는다.
fn candidate_ports(base: u16) -> impl Iterator<Item = u16> {
    (0..MAX_PORT_ATTEMPTS).map_while(move |offset| base.checked_add(offset))
}

/// 웹 서버 애플리케이션 상태
#[derive(Clone)]
pub struct AppState {
    /// 모든 조작이 거쳐 가는 조정자
    pub reconciler: Arc<Reconciler>,
}

/// 라우터 구성 (`/api` 아래에 모든 엔드포인트)
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", routes::api_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// 로컬 제어 표면 서버
pub struct WebServer {
    config: WebConfig,
    state: AppState,
}

impl WebServer {
    /// 새 웹 서버 생성
    pub fn new(reconciler: Arc<Reconciler>, config: WebConfig) -> Self {
        Self {
            config,
            state: AppState { reconciler },
        }
    }

    /// 서버 실행
    ///
    /// 설정 포트부터 차례로 바인드를 시도한다. 사용 중이면 다음 포트로 넘어가며,
    /// 후보를 모두 소진하면 마지막 에러를 반환한다.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) -> Result<(), std::io::Error> {
        let ip = if self.config.allow_external {
            IpAddr::V4(Ipv4Addr::UNSPECIFIED)
        } else {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        };

        let app = router(self.state);
        let base_port = self.config.port;
        let mut last_error = None;

        for port in candidate_ports(base_port) {
            let addr = SocketAddr::new(ip, port);
            let listener = match TcpListener::bind(addr).await {
                Ok(listener) => listener,
                Err(e) if e.kind() == std::io::ErrorKind::AddrInUse => {
                    warn!("포트 {port} 이미 사용 중, 다음 포트 시도...");
                    last_error = Some(e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            if port != base_port {
                warn!("포트 {base_port} 사용 불가, 대체 포트 {port} 사용");
            }
            info!("제어 표면 서버 시작: http://{addr}");

            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    loop {
                        if *shutdown_rx.borrow() {
                            info!("웹 서버 종료 신호 수신");
                            break;
                        }
                        if shutdown_rx.changed().await.is_err() {
                            break;
                        }
                    }
                })
                .await?;

            info!("제어 표면 서버 종료");
            return Ok(());
        }

        Err(last_error.unwrap_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::AddrInUse,
                format!("포트 {base_port}부터 바인드 가능한 포트 없음"),
            )
        }))
    }

    /// 서버 URL 반환
    pub fn url(&self) -> String {
        format!("http://localhost:{}", self.config.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use sceneswap_capture::preview::PreviewLink;
    use sceneswap_capture::v4l::V4lCaptureBackend;
    use sceneswap_control::log_panel::LogPanel;
    use sceneswap_control::reconciler::Links;
    use sceneswap_core::error::CoreError;
    use sceneswap_core::models::capture::CaptureConstraints;
    use sceneswap_core::models::panel::{PanelConfig, PASSWORD_MASK};
    use sceneswap_core::ports::config_store::ConfigStore;
    use sceneswap_core::trigger::TriggerPhrases;
    use sceneswap_network::printer_link::MoonrakerLink;
    use sceneswap_network::studio_link::ObsStudioLink;
    use sceneswap_network::ws_client::{FrameTransport, WsConnection};
    use sceneswap_storage::MemoryConfigStore;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;

    /// 항상 연결을 거부하는 전송
    struct RefusingTransport;

    #[async_trait]
    impl FrameTransport for RefusingTransport {
        async fn open(&self, url: &str) -> Result<WsConnection, CoreError> {
            Err(CoreError::Network(format!("{url}: connection refused")))
        }
    }

    struct Fixture {
        reconciler: Arc<Reconciler>,
        store: Arc<MemoryConfigStore>,
    }

    fn fixture(saved: Option<PanelConfig>) -> Fixture {
        let store = Arc::new(match saved {
            Some(record) => MemoryConfigStore::with_record(record),
            None => MemoryConfigStore::new(),
        });
        let transport: Arc<dyn FrameTransport> = Arc::new(RefusingTransport);
        let (triggers_tx, triggers_rx) =
            watch::channel(TriggerPhrases::from_config(&PanelConfig::default()));

        let links = Links {
            printer: Arc::new(MoonrakerLink::new(
                transport.clone(),
                triggers_rx,
                Duration::from_secs(60),
            )),
            studio: Arc::new(ObsStudioLink::new(transport, Duration::from_secs(1))),
            preview: Arc::new(PreviewLink::new(
                Arc::new(V4lCaptureBackend::with_roots(
                    "/nonexistent/sceneswap/sys",
                    "/nonexistent/sceneswap/dev",
                )),
                CaptureConstraints::default(),
            )),
        };
        let reconciler = Arc::new(Reconciler::new(
            links,
            store.clone(),
            Arc::new(LogPanel::default()),
            triggers_tx,
            Duration::ZERO,
        ));
        reconciler.load();
        Fixture { reconciler, store }
    }

    fn app(fixture: &Fixture) -> Router {
        router(AppState {
            reconciler: fixture.reconciler.clone(),
        })
    }

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[test]
    fn web_server_url() {
        let fixture = fixture(None);
        let server = WebServer::new(fixture.reconciler.clone(), WebConfig::default());
        assert_eq!(server.url(), "http://localhost:9190");
    }

    #[test]
    fn candidate_ports_follow_base() {
        let ports: Vec<u16> = candidate_ports(9190).collect();
        assert_eq!(ports.len(), usize::from(MAX_PORT_ATTEMPTS));
        assert_eq!(ports.first(), Some(&9190));
        assert_eq!(ports.last(), Some(&9199));
    }

    #[test]
    fn candidate_ports_stop_at_u16_max() {
        let ports: Vec<u16> = candidate_ports(65534).collect();
        assert_eq!(ports, vec![65534, 65535]);
        assert_eq!(candidate_ports(u16::MAX).count(), 1);
    }

    #[tokio::test]
    async fn status_reports_initial_snapshot() {
        let fixture = fixture(None);
        let (status, body) = send(app(&fixture), "GET", "/api/status", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["printer"], "disconnected");
        assert_eq!(body["studio"], "disconnected");
        assert_eq!(body["auto_switch"], true);
        assert_eq!(body["preview_active"], false);
        assert_eq!(body["config"]["printerHost"], "voron.local");
        assert_eq!(body["scenes"], json!([]));
    }

    #[tokio::test]
    async fn config_masks_password_and_keeps_it_when_omitted() {
        let saved = PanelConfig {
            studio_password: "hunter2".into(),
            ..PanelConfig::default()
        };
        let fixture = fixture(Some(saved));

        let (_, body) = send(app(&fixture), "GET", "/api/config", None).await;
        assert_eq!(body["studioPassword"], PASSWORD_MASK);

        let mut update = body.clone();
        update["printerHost"] = json!("printer.lan");
        update
            .as_object_mut()
            .unwrap()
            .remove("studioPassword");
        let (status, body) = send(app(&fixture), "PUT", "/api/config", Some(update)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["printerHost"], "printer.lan");

        let stored = fixture.store.load().unwrap().unwrap();
        assert_eq!(stored.printer_host, "printer.lan");
        assert_eq!(stored.studio_password, "hunter2");
    }

    #[tokio::test]
    async fn explicit_password_replaces_stored_one() {
        let saved = PanelConfig {
            studio_password: "hunter2".into(),
            ..PanelConfig::default()
        };
        let fixture = fixture(Some(saved));

        let (status, _) = send(
            app(&fixture),
            "PUT",
            "/api/config",
            Some(json!({ "studioPassword": PASSWORD_MASK })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let stored = fixture.store.load().unwrap().unwrap();
        assert_eq!(stored.studio_password, PASSWORD_MASK);
    }

    #[tokio::test]
    async fn partial_config_update_fills_defaults() {
        let fixture = fixture(None);
        let (status, body) = send(
            app(&fixture),
            "PUT",
            "/api/config",
            Some(json!({ "printerHost": "10.0.0.5" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["printerHost"], "10.0.0.5");
        assert_eq!(body["printerPort"], "7125");
        assert_eq!(body["triggerToolChanging"], "Toolchange Starting");
    }

    #[tokio::test]
    async fn reset_restores_defaults_and_clears_store() {
        let saved = PanelConfig {
            printer_host: "printer.lan".into(),
            ..PanelConfig::default()
        };
        let fixture = fixture(Some(saved));

        let (status, body) = send(app(&fixture), "POST", "/api/config/reset", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["printerHost"], "voron.local");
        assert!(fixture.store.load().unwrap().is_none());
    }

    #[tokio::test]
    async fn selecting_unknown_scene_is_bad_request() {
        let fixture = fixture(None);
        let (status, body) = send(
            app(&fixture),
            "PUT",
            "/api/scenes/selection",
            Some(json!({ "role": "printing", "name": "Ghost" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
    }

    #[tokio::test]
    async fn clearing_selection_is_allowed_without_catalog() {
        let fixture = fixture(None);
        let (status, body) = send(
            app(&fixture),
            "PUT",
            "/api/scenes/selection",
            Some(json!({ "role": "tool_changing", "name": "" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["config"]["sceneToolChanging"], "");
    }

    #[tokio::test]
    async fn auto_switch_toggle_flips_flag() {
        let fixture = fixture(None);
        let (_, body) = send(app(&fixture), "POST", "/api/auto-switch/toggle", None).await;
        assert_eq!(body["auto_switch"], false);
        let (_, body) = send(app(&fixture), "POST", "/api/auto-switch/toggle", None).await;
        assert_eq!(body["auto_switch"], true);
    }

    #[tokio::test]
    async fn studio_toggle_logs_connection_error() {
        let fixture = fixture(None);
        let (status, body) = send(app(&fixture), "POST", "/api/studio/toggle", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["studio"], "disconnected");
        let messages = fixture.reconciler.log().messages();
        assert!(messages.iter().any(|m| m == "Connecting to OBS..."));
        assert!(messages.iter().any(|m| m.starts_with("OBS connection error")));
    }

    #[tokio::test]
    async fn scene_operations_require_studio() {
        let fixture = fixture(None);
        let (status, body) = send(app(&fixture), "POST", "/api/scenes/refresh", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["status"], 409);

        let (status, _) = send(
            app(&fixture),
            "POST",
            "/api/scenes/switch",
            Some(json!({ "role": "tool_changing" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let messages = fixture.reconciler.log().messages();
        assert!(messages.iter().any(|m| m == "Please connect to OBS first"));
        assert!(messages.iter().any(|m| m == "OBS not connected"));
    }

    #[tokio::test]
    async fn printer_toggle_sets_and_clears_intent() {
        let fixture = fixture(None);
        let (_, body) = send(app(&fixture), "POST", "/api/printer/toggle", None).await;
        assert_eq!(body["printer_reconnecting"], true);

        let (_, body) = send(app(&fixture), "POST", "/api/printer/toggle", None).await;
        assert_eq!(body["printer_reconnecting"], false);
        assert_eq!(body["printer"], "disconnected");
    }

    #[tokio::test]
    async fn preview_toggle_without_device_stays_inactive() {
        let fixture = fixture(None);
        let (_, body) = send(app(&fixture), "POST", "/api/preview/toggle", None).await;

        assert_eq!(body["preview_active"], false);
        let messages = fixture.reconciler.log().messages();
        assert!(messages.iter().any(|m| m.starts_with("Camera preview error")));
    }

    #[tokio::test]
    async fn log_since_filters_history() {
        let fixture = fixture(None);
        let log = fixture.reconciler.log();
        let first = log.info("first");
        log.warn("second");

        let (_, body) = send(app(&fixture), "GET", "/api/log", None).await;
        assert_eq!(body.as_array().unwrap().len(), 2);

        let uri = format!("/api/log?since={}", first.seq);
        let (_, body) = send(app(&fixture), "GET", &uri, None).await;
        let entries = body.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["message"], "second");
        assert_eq!(entries[0]["level"], "warn");
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let fixture = fixture(None);
        let (status, _) = send(app(&fixture), "GET", "/api/frames", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
