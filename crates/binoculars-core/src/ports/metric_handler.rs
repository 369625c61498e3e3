//! 메트릭 핸들러 포트.
//!
//! 에이전트를 임베드하는 애플리케이션이 구현한다.
//! 메트릭 수집과 보고 결과 처리를 한 쌍으로 제공한다.

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::metric::MetricBatch;
use crate::models::response::ServerResponse;

/// 메트릭 소스 + 응답 콜백
#[async_trait]
pub trait MetricHandler: Send + Sync {
    /// 현재 메트릭 수집 (비어 있을 수 있음)
    async fn gather_metrics(&self) -> MetricBatch;

    /// 보고 결과 처리
    ///
    /// 성공/실패와 무관하게 매 사이클 호출되며,
    /// 에이전트가 임베드한 애플리케이션에 에러를 알리는 유일한 경로다.
    async fn handle_response(&self, result: &Result<ServerResponse, CoreError>);
}
