//! 보고 전송 포트.
//!
//! 구현: `binoculars-client` crate (reqwest)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::metric::Metric;
use crate::models::response::ServerResponse;

/// 에이전트 → 콜렉터 메트릭 전송
///
/// 재시도하지 않는다. 실패는 해당 보고 사이클에서만 끝난다.
#[async_trait]
pub trait ReportTransport: Send + Sync {
    /// 메트릭 배치 전송 후 콜렉터 응답 반환
    async fn send_metrics(&self, metrics: &[Metric]) -> Result<ServerResponse, CoreError>;
}
