//! 헬스체크 핸들러.

use axum::http::StatusCode;

/// GET /v1/healthcheck — 항상 200 (빈 본문)
pub async fn health_check() -> StatusCode {
    StatusCode::OK
}
