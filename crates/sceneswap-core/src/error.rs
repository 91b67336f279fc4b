//! SceneSwap 핵심 에러 타입.
//!
//! 모든 어댑터 crate는 이 에러를 그대로 반환하거나 자체 에러에서 래핑한다.
//! 어떤 변형도 프로세스 치명적이지 않다 — 호출자가 로그 패널에 보고한다.

use thiserror::Error;

/// 코어 레이어 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// JSON 직렬화/역직렬화 실패
    #[error("직렬화 에러: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 설정값 오류
    #[error("설정 에러: {0}")]
    Config(String),

    /// 필드 유효성 검증 실패
    #[error("유효성 검증 실패 — {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 인증 실패 (비밀번호 오류, 비밀번호 누락)
    #[error("인증 에러: {0}")]
    Auth(String),

    /// 네트워크 에러 (연결 실패, 연결 끊김)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 원격 프로토콜 불일치 (예상치 못한 opcode, RPC 버전 불일치)
    #[error("프로토콜 에러: {0}")]
    Protocol(String),

    /// 연결되지 않은 링크에 대한 호출
    #[error("{0} 연결되지 않음")]
    NotConnected(String),

    /// 수립된 세션에서 원격 호출이 실패함 (예: 존재하지 않는 씬)
    #[error("원격 요청 실패 — {request} (code={code}): {comment}")]
    Remote {
        /// 요청 종류 (예: "SetCurrentProgramScene")
        request: String,
        /// 원격 상태 코드
        code: u16,
        /// 원격 설명
        comment: String,
    },

    /// 캡처 장치 없음
    #[error("캡처 장치 없음: {0}")]
    DeviceUnavailable(String),

    /// 캡처 장치 접근 권한 거부
    #[error("캡처 장치 접근 거부: {0}")]
    PermissionDenied(String),

    /// 기타 캡처 실패 (미지원 플랫폼 등)
    #[error("캡처 에러: {0}")]
    Capture(String),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// 캡처 장치 관련 실패인지 (장치 목록 진단 대상)
    pub fn is_capture_failure(&self) -> bool {
        matches!(
            self,
            CoreError::DeviceUnavailable(_) | CoreError::PermissionDenied(_) | CoreError::Capture(_)
        )
    }
}
