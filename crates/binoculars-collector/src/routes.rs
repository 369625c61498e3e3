//! API 라우트 정의.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::AppState;

/// API 라우트 생성
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // 메트릭 수신
        .route("/v1/metrics", post(handlers::metrics::record_metrics))
        // 헬스체크 (저장소 상태와 무관)
        .route("/v1/healthcheck", get(handlers::health::health_check))
}
