//! 조정자.
//!
//! 프린터 링크, 스튜디오 링크, 미리보기 링크, 패널 설정 저장소를 소유하고 조율한다.
//! 자동 전환 플래그는 프로세스 수명 동안만 유지되며 이벤트 처리 시점에 읽는다.
//! 설정이 바뀔 때마다 즉시 저장하고 트리거 문구 채널을 갱신한다.

use parking_lot::RwLock;
use sceneswap_core::error::CoreError;
use sceneswap_core::models::connection::ConnectionState;
use sceneswap_core::models::panel::PanelConfig;
use sceneswap_core::models::scene::SceneCatalog;
use sceneswap_core::models::toolchange::{SceneRole, ToolchangeKind};
use sceneswap_core::ports::capture::PreviewControl;
use sceneswap_core::ports::config_store::ConfigStore;
use sceneswap_core::ports::printer::{PrinterEvent, PrinterLink};
use sceneswap_core::ports::studio::StudioLink;
use sceneswap_core::trigger::TriggerPhrases;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, warn};

use crate::log_panel::LogPanel;

/// 조정자가 소유하는 링크 묶음
pub struct Links {
    pub printer: Arc<dyn PrinterLink>,
    pub studio: Arc<dyn StudioLink>,
    pub preview: Arc<dyn PreviewControl>,
}

/// 제어 표면에 노출하는 읽기 전용 상태
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelSnapshot {
    pub printer: ConnectionState,
    /// 연결 유지 의도가 있지만 아직 연결되지 않음
    pub printer_reconnecting: bool,
    pub studio: ConnectionState,
    pub auto_switch: bool,
    pub preview_active: bool,
    /// 비밀번호는 가려진다
    pub config: PanelConfig,
    pub scenes: Vec<String>,
}

/// 수동/자동 씬 전환 문구
#[derive(Clone, Copy)]
enum SwitchOrigin {
    Toolchange,
    Quick,
}

pub struct Reconciler {
    printer: Arc<dyn PrinterLink>,
    studio: Arc<dyn StudioLink>,
    preview: Arc<dyn PreviewControl>,
    store: Arc<dyn ConfigStore>,
    log: Arc<LogPanel>,
    panel: RwLock<PanelConfig>,
    catalog: RwLock<SceneCatalog>,
    auto_switch: AtomicBool,
    triggers: watch::Sender<TriggerPhrases>,
    preview_autostart_delay: Duration,
}

impl Reconciler {
    /// `triggers`는 프린터 링크가 구독하는 채널의 송신 측이다
    pub fn new(
        links: Links,
        store: Arc<dyn ConfigStore>,
        log: Arc<LogPanel>,
        triggers: watch::Sender<TriggerPhrases>,
        preview_autostart_delay: Duration,
    ) -> Self {
        Self {
            printer: links.printer,
            studio: links.studio,
            preview: links.preview,
            store,
            log,
            panel: RwLock::new(PanelConfig::default()),
            catalog: RwLock::new(SceneCatalog::default()),
            auto_switch: AtomicBool::new(true),
            triggers,
            preview_autostart_delay,
        }
    }

    pub fn log(&self) -> &Arc<LogPanel> {
        &self.log
    }

    /// 현재 패널 설정 (복제본)
    pub fn panel(&self) -> PanelConfig {
        self.panel.read().clone()
    }

    pub fn auto_switch_enabled(&self) -> bool {
        self.auto_switch.load(Ordering::SeqCst)
    }

    /// 저장된 설정을 읽어 필드를 채운다. 저장된 레코드가 있었으면 true.
    pub fn load(&self) -> bool {
        let (config, saved) = match self.store.load() {
            Ok(Some(config)) => (config, true),
            Ok(None) => (PanelConfig::default(), false),
            Err(e) => {
                self.log
                    .error(format!("Failed to read saved configuration: {e}"));
                (PanelConfig::default(), false)
            }
        };
        self.apply_panel(config);
        saved
    }

    /// 시작 시퀀스 — 저장된 레코드가 있을 때만 스튜디오, 프린터 순으로 자동 연결
    pub async fn startup(&self, autoconnect: bool) {
        if !self.load() {
            self.log
                .info("Application ready. Configure settings and click Connect.");
            return;
        }

        self.log.info("Loaded saved configuration");
        if !autoconnect {
            debug!("자동 연결 비활성화");
            return;
        }
        self.log
            .info("Attempting to auto-connect to OBS and Moonraker...");
        self.connect_studio().await;
        self.connect_printer();
    }

    // ── 프린터 ──────────────────────────────────────────

    pub fn connect_printer(&self) {
        let panel = self.panel();
        self.log.info("Connecting to Moonraker...");
        self.printer.connect(&panel.printer_host, &panel.printer_port);
    }

    pub async fn disconnect_printer(&self) {
        self.printer.disconnect().await;
        self.log.info("Disconnected from Moonraker");
    }

    /// 연결 유지 의도가 있으면 해제, 없으면 연결
    pub async fn toggle_printer(&self) {
        if self.printer.wants_connection() {
            self.disconnect_printer().await;
        } else {
            self.connect_printer();
        }
    }

    // ── 스튜디오 ────────────────────────────────────────

    /// 연결 → 씬 목록 갱신 → 가상 카메라 보장 → 미리보기 자동 시작
    pub async fn connect_studio(&self) -> bool {
        let panel = self.panel();
        if let Err(e) = self
            .studio
            .connect(&panel.studio_host, &panel.studio_port, panel.password())
            .await
        {
            match e {
                // 연결 도중 해제 요청으로 취소됨
                CoreError::NotConnected(_) => self.log.info("OBS connection cancelled"),
                e => self.log.error(format!("OBS connection error: {e}")),
            };
            return false;
        }
        self.log.success("Connected to OBS WebSocket");

        if let Err(e) = self.refresh_scenes().await {
            debug!("씬 목록 갱신 건너뜀: {e}");
        }
        self.ensure_virtual_cam().await;
        self.autostart_preview().await;
        true
    }

    pub async fn disconnect_studio(&self) {
        self.studio.disconnect().await;
        self.log.info("Disconnected from OBS");
    }

    pub async fn toggle_studio(&self) {
        if self.studio.state() == ConnectionState::Disconnected {
            self.log.info("Connecting to OBS...");
            self.connect_studio().await;
        } else {
            self.disconnect_studio().await;
        }
    }

    async fn ensure_virtual_cam(&self) {
        match self.studio.virtual_cam_active().await {
            Ok(true) => {}
            Ok(false) => {
                self.log
                    .info("OBS Virtual Camera is not active. Starting it now...");
                match self.studio.start_virtual_cam().await {
                    Ok(()) => {
                        self.log.success("OBS Virtual Camera started");
                    }
                    Err(e) => {
                        self.log
                            .error(format!("Failed to start OBS Virtual Camera: {e}"));
                    }
                }
            }
            Err(e) => warn!("가상 카메라 상태 조회 실패: {e}"),
        }
    }

    async fn autostart_preview(&self) {
        match self.studio.virtual_cam_active().await {
            Ok(true) => {
                self.log
                    .info("OBS Virtual Camera detected, starting preview...");
                tokio::time::sleep(self.preview_autostart_delay).await;
                if !self.preview.is_active() {
                    self.start_preview().await;
                }
            }
            Ok(false) => {
                self.log
                    .info("OBS Virtual Camera is not active. Start it in OBS to enable the preview.");
            }
            Err(e) => warn!("미리보기 자동 시작 실패: {e}"),
        }
    }

    /// 씬 카탈로그 갱신. 선택은 카탈로그에 남아 있을 때만 유지된다.
    ///
    /// 스튜디오가 연결되지 않았으면 `NotConnected`. 조회 실패는 로그로만 보고한다.
    pub async fn refresh_scenes(&self) -> Result<(), CoreError> {
        if !self.studio.state().is_connected() {
            self.log.error("Please connect to OBS first");
            return Err(not_connected());
        }

        let names = match self.studio.list_scenes().await {
            Ok(names) => names,
            Err(e) => {
                self.log.error(format!("Error fetching scenes: {e}"));
                return Ok(());
            }
        };
        if names.is_empty() {
            self.log.warn("No scenes found in OBS");
            return Ok(());
        }

        let catalog = SceneCatalog::new(names);
        {
            let mut panel = self.panel.write();
            panel.scene_tool_changing = catalog.reconcile_selection(&panel.scene_tool_changing);
            panel.scene_printing = catalog.reconcile_selection(&panel.scene_printing);
        }
        let count = catalog.len();
        *self.catalog.write() = catalog;

        self.log.success(format!("Loaded {count} scenes from OBS"));
        self.persist();
        Ok(())
    }

    /// 수동 빠른 전환 — 자동 전환 플래그와 무관
    pub async fn switch_to_role(&self, role: SceneRole) -> Result<(), CoreError> {
        self.switch_scene(role, SwitchOrigin::Quick).await
    }

    /// 스튜디오 미연결만 에러로 돌려준다. 나머지 실패는 로그 패널에 남긴다.
    async fn switch_scene(&self, role: SceneRole, origin: SwitchOrigin) -> Result<(), CoreError> {
        if !self.studio.state().is_connected() {
            self.log.error("OBS not connected");
            return Err(not_connected());
        }

        let name = self.panel.read().scene_for(role).to_string();
        if name.is_empty() {
            self.log.error(match origin {
                SwitchOrigin::Toolchange => format!("No scene selected for {role}"),
                SwitchOrigin::Quick => format!("No scene configured for {role}"),
            });
            return Ok(());
        }

        match self.studio.switch_scene(role, &name).await {
            Ok(()) => {
                self.log.success(match origin {
                    SwitchOrigin::Toolchange => format!("Switched to {role} scene: {name}"),
                    SwitchOrigin::Quick => format!("Quick switch to {role} scene: {name}"),
                });
            }
            Err(e) => {
                self.log.error(match origin {
                    SwitchOrigin::Toolchange => format!("Error setting scene: {e}"),
                    SwitchOrigin::Quick => format!("Error switching scene: {e}"),
                });
            }
        }
        Ok(())
    }

    // ── 프린터 이벤트 ───────────────────────────────────

    /// 이벤트를 도착 순서대로 하나씩 처리한다. 종료 신호나 채널 닫힘에서 반환.
    pub async fn run(
        &self,
        mut events: broadcast::Receiver<PrinterEvent>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!("조정자 이벤트 루프 시작");
        loop {
            tokio::select! {
                received = events.recv() => match received {
                    Ok(event) => self.handle_printer_event(event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("프린터 이벤트 {skipped}개 유실");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("조정자 이벤트 루프 종료");
    }

    pub async fn handle_printer_event(&self, event: PrinterEvent) {
        match event {
            PrinterEvent::Connected => {
                self.log.success("Connected to Moonraker");
            }
            PrinterEvent::Disconnected => {
                self.log.error("Moonraker disconnected");
            }
            PrinterEvent::ReconnectScheduled { delay_ms } => {
                self.log.info(format!(
                    "Attempting to reconnect in {}...",
                    describe_delay(delay_ms)
                ));
            }
            PrinterEvent::Error(e) => {
                self.log.error(format!("Moonraker error: {e}"));
            }
            PrinterEvent::Toolchange(kind) => self.on_toolchange(kind).await,
        }
    }

    async fn on_toolchange(&self, kind: ToolchangeKind) {
        self.log
            .info(format!("Tool change detected: {}", kind.label()));
        if self.auto_switch_enabled() {
            if let Err(e) = self
                .switch_scene(kind.target_role(), SwitchOrigin::Toolchange)
                .await
            {
                debug!("툴체인지 씬 전환 건너뜀: {e}");
            }
        } else {
            self.log.info("Auto-switch disabled - scene not changed");
        }
    }

    // ── 토글 ────────────────────────────────────────────

    /// 자동 전환 플래그 반전. 새 값을 반환한다.
    pub fn toggle_auto_switch(&self) -> bool {
        let enabled = !self.auto_switch.fetch_xor(true, Ordering::SeqCst);
        if enabled {
            self.log.success("Auto-switch enabled");
        } else {
            self.log.info("Auto-switch disabled");
        }
        enabled
    }

    pub async fn toggle_preview(&self) {
        if self.preview.is_active() {
            self.preview.stop().await;
            self.log.info("Camera preview stopped");
        } else {
            self.start_preview().await;
        }
    }

    async fn start_preview(&self) {
        match self.preview.start().await {
            Ok(stream) => {
                debug!("미리보기 스트림: {}", stream.id());
                self.log.success("Camera preview started");
            }
            Err(e) => {
                self.log.error(format!(
                    "Camera preview error: {e}. Make sure OBS Virtual Camera is enabled."
                ));
                if e.is_capture_failure() {
                    let devices = self.preview.enumerate_devices().await;
                    debug!("사용 가능한 비디오 장치: {devices:?}");
                    self.log
                        .info(format!("Found {} video device(s).", devices.len()));
                }
            }
        }
    }

    // ── 설정 ────────────────────────────────────────────

    /// 패널 설정 전체 교체 후 즉시 저장.
    ///
    /// `password`가 None이면 저장된 비밀번호를 유지한다. 씬 카탈로그를 받아온 뒤에는
    /// 두 씬 선택이 카탈로그에 있거나 비어 있어야 한다.
    pub fn update_panel(
        &self,
        mut config: PanelConfig,
        password: Option<String>,
    ) -> Result<(), CoreError> {
        {
            let catalog = self.catalog.read();
            if !catalog.is_empty() {
                for role in [SceneRole::ToolChanging, SceneRole::Printing] {
                    check_scene(&catalog, role, config.scene_for(role))?;
                }
            }
        }

        config.studio_password = match password {
            Some(password) => password,
            None => self.panel.read().studio_password.clone(),
        };
        self.apply_panel(config);
        self.persist();
        Ok(())
    }

    /// 한 역할의 씬 선택 변경 후 즉시 저장
    pub fn select_scene(&self, role: SceneRole, name: &str) -> Result<(), CoreError> {
        check_scene(&self.catalog.read(), role, name)?;
        self.panel.write().set_scene(role, name);
        self.persist();
        Ok(())
    }

    /// 저장된 레코드를 지우고 필드를 기본값으로 되돌린다
    pub fn reset_config(&self) {
        if let Err(e) = self.store.clear() {
            self.log
                .error(format!("Error clearing stored config: {e}"));
        }
        self.apply_panel(PanelConfig::default());
        self.log.info("Configuration reset to defaults");
    }

    pub fn snapshot(&self) -> PanelSnapshot {
        let printer = self.printer.state();
        PanelSnapshot {
            printer,
            printer_reconnecting: self.printer.wants_connection() && !printer.is_connected(),
            studio: self.studio.state(),
            auto_switch: self.auto_switch_enabled(),
            preview_active: self.preview.is_active(),
            config: self.panel.read().masked(),
            scenes: self.catalog.read().scenes().to_vec(),
        }
    }

    fn apply_panel(&self, config: PanelConfig) {
        let triggers = TriggerPhrases::from_config(&config);
        *self.panel.write() = config;
        self.triggers.send_replace(triggers);
    }

    fn persist(&self) {
        let config = self.panel();
        if let Err(e) = self.store.save(&config) {
            self.log
                .error(format!("Failed to save configuration: {e}"));
        }
    }
}

fn not_connected() -> CoreError {
    CoreError::NotConnected("OBS".to_string())
}

/// 선택은 비어 있거나 카탈로그에 있는 이름이어야 한다
fn check_scene(catalog: &SceneCatalog, role: SceneRole, name: &str) -> Result<(), CoreError> {
    if name.is_empty() || catalog.contains(name) {
        Ok(())
    } else {
        Err(CoreError::Validation {
            field: format!("{role}"),
            message: format!("카탈로그에 없는 씬: {name}"),
        })
    }
}

/// `5000` → `"5 seconds"`, `1500` → `"1500 ms"`
fn describe_delay(delay_ms: u64) -> String {
    if delay_ms % 1000 == 0 {
        let secs = delay_ms / 1000;
        if secs == 1 {
            "1 second".to_string()
        } else {
            format!("{secs} seconds")
        }
    } else {
        format!("{delay_ms} ms")
    }
}
