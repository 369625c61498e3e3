//! Binoculars 핵심 에러 타입.
//!
//! 어댑터 crate(저장소, 클라이언트, 콜렉터)는 이 타입을 그대로 반환하거나
//! 자체 에러 타입에서 `From<CoreError>`로 변환한다.

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

    /// 필드 유효성 검증 실패 (개별 포인트 변환 등)
    #[error("유효성 검증 실패 — {field}: {message}")]
    Validation {
        /// 검증 실패한 필드명
        field: String,
        /// 실패 사유
        message: String,
    },

    /// 네트워크 에러 (연결 실패, 타임아웃)
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 200이 아닌 응답 상태 코드
    #[error("query return status code {status}, message {message}")]
    UnexpectedStatus {
        /// HTTP 상태 코드
        status: u16,
        /// 응답 본문
        message: String,
    },

    /// 응답 본문 디코딩 실패
    #[error("응답 디코딩 실패: {0}")]
    Decode(String),

    /// 메트릭 저장소 에러 (연결 실패, 쓰기 실패, 종료된 연결)
    #[error("저장소 에러: {0}")]
    Store(String),

    /// 내부 에러 (예상치 못한 상황)
    #[error("내부 에러: {0}")]
    Internal(String),

    /// I/O 에러
    #[error("I/O 에러: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// 검증 에러 생성 헬퍼
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}
