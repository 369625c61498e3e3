//! 포트 인터페이스 (trait).
//!
//! Hexagonal Architecture의 포트 레이어.
//! 어댑터 crate가 이 trait들을 구현하며 `Arc<dyn T>`로 와이어링한다.
//!
//! - [`metrics_store::MetricsStore`] — 구현: `binoculars-storage`
//! - [`report_transport::ReportTransport`] — 구현: `binoculars-client`
//! - [`metric_handler::MetricHandler`] — 구현: 에이전트를 임베드하는 애플리케이션

pub mod metric_handler;
pub mod metrics_store;
pub mod report_transport;
