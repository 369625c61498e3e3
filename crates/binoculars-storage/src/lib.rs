//! # binoculars-storage
//!
//! 메트릭 저장소 어댑터.
//! 콜렉터가 수신한 메트릭 배치를 시계열 저장소에 기록한다.
//!
//! ## 모듈
//! - `influxdb`: InfluxDB 1.x HTTP API 어댑터 (MetricsStore 구현)
//! - `line_protocol`: InfluxDB line protocol 인코더
//! - `memory`: 인메모리 저장소 (테스트/로컬 개발용, MetricsStore 구현)

pub mod influxdb;
pub mod line_protocol;
pub mod memory;

pub use influxdb::InfluxDbStore;
pub use memory::InMemoryStore;
