//! obs-websocket v5 메시지 정의.
//!
//! 모든 프레임은 `{"op": <opcode>, "d": {...}}` 형태의 JSON 텍스트다.
//! 이 모듈은 스튜디오 링크가 쓰는 opcode와 페이로드만 다룬다.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sceneswap_core::error::CoreError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};

/// 지원하는 RPC 버전
pub const RPC_VERSION: u32 = 1;

/// 메시지 opcode
pub mod op {
    pub const HELLO: u8 = 0;
    pub const IDENTIFY: u8 = 1;
    pub const IDENTIFIED: u8 = 2;
    pub const EVENT: u8 = 5;
    pub const REQUEST: u8 = 6;
    pub const REQUEST_RESPONSE: u8 = 7;
}

/// 서버 종료 코드
pub mod close_code {
    /// 인증 실패
    pub const AUTHENTICATION_FAILED: u16 = 4009;
    /// RPC 버전 미지원
    pub const UNSUPPORTED_RPC_VERSION: u16 = 4010;
}

/// 사용하는 요청 종류
pub mod request {
    pub const GET_SCENE_LIST: &str = "GetSceneList";
    pub const SET_CURRENT_PROGRAM_SCENE: &str = "SetCurrentProgramScene";
    pub const GET_VIRTUAL_CAM_STATUS: &str = "GetVirtualCamStatus";
    pub const START_VIRTUAL_CAM: &str = "StartVirtualCam";
    pub const STOP_VIRTUAL_CAM: &str = "StopVirtualCam";
}

#[derive(Debug, Deserialize)]
struct Envelope {
    op: u8,
    #[serde(default)]
    d: Value,
}

/// 인증 챌린지
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthChallenge {
    pub challenge: String,
    pub salt: String,
}

/// op 0 — 서버 인사
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hello {
    #[serde(default)]
    pub obs_web_socket_version: Option<String>,
    pub rpc_version: u32,
    #[serde(default)]
    pub authentication: Option<AuthChallenge>,
}

/// op 1 — 클라이언트 식별
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identify {
    pub rpc_version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<String>,
    /// 이벤트 구독 비트마스크 (0 = 구독 안 함)
    pub event_subscriptions: u32,
}

/// op 2 — 식별 완료
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identified {
    pub negotiated_rpc_version: u32,
}

/// op 6 — 요청
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Request<'a> {
    pub request_type: &'a str,
    pub request_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_data: Option<Value>,
}

/// 요청 처리 결과
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RequestStatus {
    pub result: bool,
    pub code: u16,
    #[serde(default)]
    pub comment: Option<String>,
}

/// op 7 — 요청 응답
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestResponse {
    pub request_type: String,
    pub request_id: String,
    pub request_status: RequestStatus,
    #[serde(default)]
    pub response_data: Option<Value>,
}

/// 서버 → 클라이언트 메시지
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    Hello(Hello),
    Identified(Identified),
    Event(Value),
    RequestResponse(RequestResponse),
    /// 이 링크가 다루지 않는 opcode
    Other(u8),
}

/// `GetSceneList` 응답의 씬 항목
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneEntry {
    pub scene_name: String,
}

/// `GetSceneList` 응답
#[derive(Debug, Clone, Deserialize)]
pub struct SceneList {
    #[serde(default)]
    pub scenes: Vec<SceneEntry>,
}

/// `GetVirtualCamStatus` 응답
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualCamStatus {
    pub output_active: bool,
}

/// 인증 문자열 계산
///
/// `base64(sha256(base64(sha256(password + salt)) + challenge))`
pub fn auth_response(password: &str, salt: &str, challenge: &str) -> String {
    let secret = STANDARD.encode(Sha256::digest(format!("{password}{salt}").as_bytes()));
    STANDARD.encode(Sha256::digest(format!("{secret}{challenge}").as_bytes()))
}

fn frame(op: u8, d: impl Serialize) -> Result<String, CoreError> {
    Ok(serde_json::to_string(&json!({ "op": op, "d": d }))?)
}

pub fn encode_identify(identify: &Identify) -> Result<String, CoreError> {
    frame(op::IDENTIFY, identify)
}

pub fn encode_request(request: &Request<'_>) -> Result<String, CoreError> {
    frame(op::REQUEST, request)
}

/// 텍스트 프레임 해석
pub fn decode(text: &str) -> Result<ServerMessage, CoreError> {
    let envelope: Envelope = serde_json::from_str(text)?;
    let message = match envelope.op {
        op::HELLO => ServerMessage::Hello(serde_json::from_value(envelope.d)?),
        op::IDENTIFIED => ServerMessage::Identified(serde_json::from_value(envelope.d)?),
        op::EVENT => ServerMessage::Event(envelope.d),
        op::REQUEST_RESPONSE => {
            ServerMessage::RequestResponse(serde_json::from_value(envelope.d)?)
        }
        other => ServerMessage::Other(other),
    };
    Ok(message)
}

/// 서버 종료 코드를 에러로 변환
pub fn close_error(code: Option<u16>, reason: &str) -> CoreError {
    match code {
        Some(close_code::AUTHENTICATION_FAILED) => {
            CoreError::Auth("OBS 인증 실패 (비밀번호 확인)".to_string())
        }
        Some(close_code::UNSUPPORTED_RPC_VERSION) => {
            CoreError::Protocol(format!("OBS가 RPC 버전 {RPC_VERSION}을 지원하지 않음"))
        }
        Some(code) => CoreError::Network(format!("OBS 연결 종료 (code={code}): {reason}")),
        None => CoreError::Network("OBS 연결 종료".to_string()),
    }
}
