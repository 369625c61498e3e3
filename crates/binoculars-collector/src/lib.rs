//! # binoculars-collector
//!
//! 콜렉터 서비스. 에이전트가 보낸 메트릭 배치를 저장소에 기록하고
//! 다음 보고까지의 권장 간격(분)을 응답한다.
//!
//! ## 엔드포인트
//! - `POST /v1/metrics` — 메트릭 배치 수신
//! - `GET /v1/healthcheck` — 헬스체크

pub mod error;
pub mod handlers;
pub mod routes;

use axum::Router;
use binoculars_core::config::CollectorConfig;
use binoculars_core::error::CoreError;
use binoculars_core::period::parse_period;
use binoculars_core::ports::metrics_store::MetricsStore;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// 조회 주기 파싱 실패 시 권장 간격 (분)
pub const DEFAULT_REQUEST_INTERVAL_MINUTES: i64 = 60;

/// 콜렉터 설정
#[derive(Debug, Clone)]
pub struct CollectorSettings {
    /// 메트릭을 기록할 데이터베이스
    pub database_name: String,
    /// 에이전트 권장 보고 주기 (duration 문자열)
    pub query_period: String,
}

impl From<&CollectorConfig> for CollectorSettings {
    fn from(config: &CollectorConfig) -> Self {
        Self {
            database_name: config.database_name(),
            query_period: config.query_period.clone(),
        }
    }
}

/// 조회 주기를 분 단위 권장 간격으로 변환 (1분 미만은 0)
pub fn request_interval_minutes(query_period: &str) -> i64 {
    match parse_period(query_period) {
        Ok(period) => i64::try_from(period.as_secs() / 60).unwrap_or(i64::MAX),
        Err(e) => {
            error!("조회 주기 파싱 실패, 기본값 {DEFAULT_REQUEST_INTERVAL_MINUTES}분 사용: {e}");
            DEFAULT_REQUEST_INTERVAL_MINUTES
        }
    }
}

/// 핸들러 공유 상태
#[derive(Clone)]
pub struct AppState {
    /// 메트릭 저장소 (동시 쓰기는 구현체 책임)
    pub store: Arc<dyn MetricsStore>,
    pub database_name: Arc<str>,
    /// 응답에 담을 권장 간격 (분, 시작 시 1회 계산)
    pub request_interval_minutes: i64,
}

/// 콜렉터 서버
pub struct Collector {
    state: AppState,
}

impl Collector {
    /// 데이터베이스를 준비하고 콜렉터 생성
    ///
    /// 데이터베이스 생성 실패는 시작 실패로 처리한다.
    pub async fn connect(
        store: Arc<dyn MetricsStore>,
        settings: CollectorSettings,
    ) -> Result<Self, CoreError> {
        store.create_database(&settings.database_name).await?;
        info!("데이터베이스 준비 완료: {}", settings.database_name);

        let request_interval_minutes = request_interval_minutes(&settings.query_period);
        debug!("권장 보고 간격: {request_interval_minutes}분");

        Ok(Self {
            state: AppState {
                store,
                database_name: Arc::from(settings.database_name),
                request_interval_minutes,
            },
        })
    }

    /// 메트릭을 기록하는 데이터베이스 이름
    pub fn database_name(&self) -> &str {
        &self.state.database_name
    }

    /// 응답에 담는 권장 간격 (분)
    pub fn request_interval_minutes(&self) -> i64 {
        self.state.request_interval_minutes
    }

    /// 라우터 구성
    pub fn router(&self) -> Router {
        Router::new()
            .merge(routes::api_routes())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// 서버 실행
    ///
    /// `shutdown_rx`가 `true`가 되거나 송신측이 닫히면 진행 중인 요청을 마치고 멈춘다.
    /// 서버가 멈춘 뒤 저장소 연결을 한 번 닫는다.
    pub async fn serve(
        self,
        listener: TcpListener,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> Result<(), CoreError> {
        if let Ok(addr) = listener.local_addr() {
            info!("콜렉터 수신 대기: {addr}");
        }

        let served = axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                loop {
                    if *shutdown_rx.borrow() {
                        info!("콜렉터 종료 신호 수신");
                        break;
                    }
                    if shutdown_rx.changed().await.is_err() {
                        break;
                    }
                }
            })
            .await;

        match self.state.store.close().await {
            Ok(()) => debug!("저장소 연결 종료"),
            Err(e) => warn!("저장소 연결 종료 실패: {e}"),
        }

        served.map_err(CoreError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_from_query_period() {
        assert_eq!(request_interval_minutes("1h"), 60);
        assert_eq!(request_interval_minutes("90m"), 90);
        assert_eq!(request_interval_minutes("1h59m59s"), 119);
        assert_eq!(request_interval_minutes("1.5h"), 90);
    }

    #[test]
    fn sub_minute_period_is_zero() {
        assert_eq!(request_interval_minutes("30s"), 0);
        assert_eq!(request_interval_minutes("0"), 0);
    }

    #[test]
    fn unparseable_period_falls_back() {
        assert_eq!(request_interval_minutes("hourly"), 60);
        assert_eq!(request_interval_minutes(""), 60);
    }

    #[test]
    fn settings_from_config() {
        let config = CollectorConfig {
            application_name: "longhorn".to_string(),
            db_url: "http://influxdb:8086".to_string(),
            query_period: "30m".to_string(),
            ..CollectorConfig::default()
        };
        let settings = CollectorSettings::from(&config);
        assert_eq!(settings.database_name, "longhorn_binoculars");
        assert_eq!(settings.query_period, "30m");
    }
}
