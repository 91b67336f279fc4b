//! 스튜디오(OBS) 링크 포트.
//!
//! 구현: `sceneswap-network::studio_link` (obs-websocket v5)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::connection::ConnectionState;
use crate::models::toolchange::SceneRole;

/// 스트리밍 소프트웨어와의 요청/응답 세션
#[async_trait]
pub trait StudioLink: Send + Sync {
    /// 세션 수립. 실패 시 반쯤 열린 핸들을 남기지 않는다.
    async fn connect(&self, host: &str, port: &str, password: Option<&str>)
        -> Result<(), CoreError>;

    /// 세션 종료
    async fn disconnect(&self);

    /// 현재 연결 상태
    fn state(&self) -> ConnectionState;

    /// 화면 표시 순서의 씬 이름 목록
    async fn list_scenes(&self) -> Result<Vec<String>, CoreError>;

    /// 프로그램 씬 전환
    async fn switch_scene(&self, role: SceneRole, name: &str) -> Result<(), CoreError>;

    /// 가상 카메라 출력 활성 여부
    async fn virtual_cam_active(&self) -> Result<bool, CoreError>;

    async fn start_virtual_cam(&self) -> Result<(), CoreError>;

    async fn stop_virtual_cam(&self) -> Result<(), CoreError>;
}
