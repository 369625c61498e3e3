//! 메트릭 수신 핸들러.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use binoculars_core::models::metric::MetricBatch;
use binoculars_core::models::response::ServerResponse;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::AppState;

/// POST /v1/metrics
///
/// 본문은 Content-Type과 무관하게 JSON으로 디코딩한다.
/// 디코딩/저장 실패는 400 평문, 성공 시 권장 보고 간격을 돌려준다.
pub async fn record_metrics(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ServerResponse>, ApiError> {
    let batch = MetricBatch::from_json(&body).map_err(|e| {
        debug!("메트릭 본문 디코딩 실패: {e}");
        ApiError::from(e)
    })?;
    debug!("수신 메트릭 {}개: {:?}", batch.len(), batch);

    let summary = state
        .store
        .write_batch(&state.database_name, &batch)
        .await
        .map_err(|e| {
            warn!("메트릭 저장 실패: {e}");
            ApiError::from(e)
        })?;
    if summary.skipped > 0 {
        debug!(
            "메트릭 저장: {}개 기록, {}개 건너뜀",
            summary.written, summary.skipped
        );
    }

    Ok(Json(ServerResponse::new(state.request_interval_minutes)))
}
