//! 메트릭 저장소 포트.
//!
//! 구현: `binoculars-storage` crate (InfluxDB, 인메모리)

use async_trait::async_trait;

use crate::error::CoreError;
use crate::models::metric::Metric;

/// 배치 쓰기 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// 기록된 포인트 수
    pub written: usize,
    /// 변환 실패로 건너뛴 포인트 수
    pub skipped: usize,
}

/// 시계열 메트릭 저장소
///
/// 여러 요청 핸들러가 동시에 호출하므로 구현체가 동시 쓰기를 책임진다.
#[async_trait]
pub trait MetricsStore: Send + Sync {
    /// 데이터베이스 생성 (이미 존재하면 성공)
    async fn create_database(&self, name: &str) -> Result<(), CoreError>;

    /// 배치 쓰기
    ///
    /// 포인트 단위 변환 실패는 경고 후 건너뛰며 배치 전체를 실패시키지 않는다.
    /// 저장소 수준 실패(연결, 쓰기 거부)만 `Err`로 반환한다.
    async fn write_batch(
        &self,
        database: &str,
        metrics: &[Metric],
    ) -> Result<WriteSummary, CoreError>;

    /// 연결 해제
    async fn close(&self) -> Result<(), CoreError>;
}
