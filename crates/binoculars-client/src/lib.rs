//! # binoculars-client
//!
//! 보고 에이전트. 애플리케이션에 임베드되어 주기적으로 메트릭을 수집하고
//! 콜렉터로 전송한 뒤, 콜렉터가 권장하는 간격으로 다음 보고를 예약한다.
//!
//! - [`http_client`] — `ReportTransport` 구현 (reqwest)
//! - [`agent`] — 보고 루프와 start/stop 제어
//! - [`source`] — 정의 목록 기반 `MetricHandler`

pub mod agent;
pub mod http_client;
pub mod source;

pub use agent::ReportingAgent;
pub use http_client::HttpReportClient;
pub use source::{DefinedMetricHandler, MetricDefinition};
