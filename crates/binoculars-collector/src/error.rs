//! API 에러 처리.
//!
//! 에러 응답은 평문 본문으로 내려가며, 에이전트는 이 본문을 그대로 에러 메시지로 쓴다.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use binoculars_core::error::CoreError;
use thiserror::Error;

/// API 에러
#[derive(Debug, Error)]
pub enum ApiError {
    /// 잘못된 요청 (본문 디코딩 실패, 저장소 쓰기 실패)
    #[error("{0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };
        (status, message).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Serialization(e) => ApiError::BadRequest(e.to_string()),
            CoreError::Store(msg) => ApiError::BadRequest(msg),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn bad_request_is_plain_text() {
        let resp = ApiError::BadRequest("EOF while parsing a value".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            resp.headers()["content-type"],
            "text/plain; charset=utf-8"
        );
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"EOF while parsing a value");
    }

    #[test]
    fn store_error_keeps_backend_message() {
        let err = ApiError::from(CoreError::Store("database not found".to_string()));
        assert_eq!(err.to_string(), "database not found");
    }
}
