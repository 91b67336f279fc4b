//! # sceneswap-app
//!
//! SceneSwap 바이너리 진입점.
//! DI 컨테이너 역할, 라이프사이클 관리, 조정자 이벤트 루프 구동.

mod lifecycle;

use anyhow::Result;
use clap::Parser;
use sceneswap_capture::preview::PreviewLink;
use sceneswap_capture::v4l::V4lCaptureBackend;
use sceneswap_control::log_panel::LogPanel;
use sceneswap_control::reconciler::{Links, Reconciler};
use sceneswap_core::config::AppConfig;
use sceneswap_core::config_manager::ConfigManager;
use sceneswap_core::models::panel::PanelConfig;
use sceneswap_core::ports::capture::PreviewControl;
use sceneswap_core::ports::config_store::ConfigStore;
use sceneswap_core::ports::printer::PrinterLink;
use sceneswap_core::ports::studio::StudioLink;
use sceneswap_core::trigger::TriggerPhrases;
use sceneswap_network::printer_link::MoonrakerLink;
use sceneswap_network::studio_link::ObsStudioLink;
use sceneswap_network::ws_client::{FrameTransport, WsClient};
use sceneswap_storage::{MemoryConfigStore, PanelStore};
use sceneswap_web::WebServer;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::lifecycle::LifecycleManager;

/// SceneSwap — 툴체인지 기반 OBS 씬 자동 전환
#[derive(Parser, Debug)]
#[command(name = "sceneswap")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,

    /// 제어 표면 포트 (기본: 설정 파일 값)
    #[arg(long, short = 'p')]
    web_port: Option<u16>,

    /// 패널 설정 저장 경로 (기본: 플랫폼 데이터 디렉토리)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// 프로세스 설정 파일 경로 (기본: 플랫폼 설정 디렉토리의 settings.json)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// 저장된 설정이 있어도 시작 시 자동 연결하지 않음
    #[arg(long)]
    no_autoconnect: bool,

    /// 패널 설정을 디스크에 저장하지 않음 (인메모리)
    #[arg(long)]
    ephemeral: bool,
}

/// 프로세스 설정 로드. 실패하면 기본값으로 계속 진행한다.
fn load_app_config(settings: Option<PathBuf>) -> AppConfig {
    let manager = match settings {
        Some(path) => ConfigManager::with_path(path),
        None => ConfigManager::new(),
    };
    match manager {
        Ok(manager) => {
            info!("설정 파일: {}", manager.config_path().display());
            manager.get()
        }
        Err(e) => {
            warn!("설정 관리자 초기화 실패, 기본 설정 사용: {e}");
            AppConfig::default_config()
        }
    }
}

/// 패널 설정 저장소 결정 (CLI 인자 → 설정 파일 → 플랫폼 기본 경로)
fn open_panel_store(args: &Args, config: &AppConfig) -> Result<Arc<dyn ConfigStore>> {
    if args.ephemeral {
        info!("인메모리 패널 저장소 사용");
        return Ok(Arc::new(MemoryConfigStore::new()));
    }

    let dir = match args
        .data_dir
        .clone()
        .or_else(|| config.storage.data_dir.clone())
    {
        Some(dir) => dir,
        None => ConfigManager::data_dir()?,
    };
    let store = PanelStore::open(&dir, config.storage.mirror_enabled)?;
    info!("패널 저장소: {}", dir.display());
    Ok(Arc::new(store))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_filter = format!(
        "sceneswap={lvl},sceneswap_app={lvl},sceneswap_core={lvl},sceneswap_storage={lvl},sceneswap_network={lvl},sceneswap_capture={lvl},sceneswap_control={lvl},sceneswap_web={lvl},sceneswap::panel={lvl}",
        lvl = args.log_level
    );
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_filter)),
        )
        .init();

    info!("SceneSwap 시작");

    let mut config = load_app_config(args.settings.clone());
    if let Some(port) = args.web_port {
        config.web.port = port;
    }

    let store = open_panel_store(&args, &config)?;
    let log = Arc::new(LogPanel::new(config.log.capacity));
    let (triggers_tx, triggers_rx) =
        watch::channel(TriggerPhrases::from_config(&PanelConfig::default()));

    // ── 링크 ──
    let transport: Arc<dyn FrameTransport> = Arc::new(WsClient::new());
    let printer = Arc::new(MoonrakerLink::new(
        transport.clone(),
        triggers_rx,
        config.reconnect_delay(),
    ));
    let studio = Arc::new(ObsStudioLink::new(transport, config.handshake_timeout()));
    let preview = Arc::new(PreviewLink::new(
        Arc::new(V4lCaptureBackend::new()),
        config.capture_constraints(),
    ));

    let reconciler = Arc::new(Reconciler::new(
        Links {
            printer: printer.clone(),
            studio: studio.clone(),
            preview: preview.clone(),
        },
        store,
        log,
        triggers_tx,
        config.preview_autostart_delay(),
    ));

    let lifecycle = Arc::new(LifecycleManager::new());

    // 시작 시퀀스보다 먼저 구독해야 자동 연결 이벤트를 놓치지 않는다
    let events = printer.subscribe();
    let loop_reconciler = reconciler.clone();
    let loop_shutdown = lifecycle.subscribe();
    let event_loop = tokio::spawn(async move {
        loop_reconciler.run(events, loop_shutdown).await;
    });

    // ── 제어 표면 ──
    let web_server = WebServer::new(reconciler.clone(), config.web.clone());
    info!("제어 표면: {}", web_server.url());
    let web_shutdown_rx = lifecycle.subscribe();
    tokio::spawn(async move {
        if let Err(e) = web_server.run(web_shutdown_rx).await {
            error!("웹 서버 오류: {e}");
        }
    });

    reconciler.startup(!args.no_autoconnect).await;

    info!("SceneSwap 실행 중 (Ctrl+C로 종료)");

    // OS 시그널 대기
    lifecycle.wait_for_signal().await;

    printer.disconnect().await;
    studio.disconnect().await;
    preview.stop().await;
    if let Err(e) = event_loop.await {
        warn!("조정자 이벤트 루프 종료 실패: {e}");
    }

    info!("SceneSwap 종료");
    Ok(())
}
