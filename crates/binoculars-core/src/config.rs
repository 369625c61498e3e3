//! 설정 구조체.
//!
//! 콜렉터 서버와 보고 에이전트의 런타임 설정을 정의한다.
//! 값의 출처(CLI 플래그, 환경변수)는 `binoculars-app`이 담당한다.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::CoreError;
use crate::period::parse_period;

/// 데이터베이스 이름 접미사 (`<application-name>_binoculars`)
pub const DATABASE_SUFFIX: &str = "_binoculars";

/// 기본 조회 주기
pub const DEFAULT_QUERY_PERIOD: &str = "1h";

/// 기본 수신 포트
pub const DEFAULT_PORT: u16 = 8324;

/// 에이전트 기본 보고 간격 (첫 서버 응답 전까지 사용)
pub const DEFAULT_REQUEST_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// 에이전트 HTTP 요청 타임아웃
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================
// 콜렉터 설정
// ============================================================

/// 콜렉터 서버 설정
#[derive(Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// 이 콜렉터를 사용하는 애플리케이션 이름 (DB 이름 생성에 사용)
    pub application_name: String,
    /// 시계열 DB URL
    pub db_url: String,
    /// DB 사용자 (빈 문자열이면 인증 없음)
    #[serde(default)]
    pub db_user: String,
    /// DB 비밀번호
    #[serde(default)]
    pub db_pass: String,
    /// 에이전트 보고 주기 (duration 문법, Grafana GROUP BY 시간과 동일해야 함)
    #[serde(default = "default_query_period")]
    pub query_period: String,
    /// 수신 포트
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_query_period() -> String {
    DEFAULT_QUERY_PERIOD.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            application_name: String::new(),
            db_url: String::new(),
            db_user: String::new(),
            db_pass: String::new(),
            query_period: default_query_period(),
            port: DEFAULT_PORT,
        }
    }
}

impl CollectorConfig {
    /// 메트릭을 저장할 데이터베이스 이름
    pub fn database_name(&self) -> String {
        format!("{}{}", self.application_name, DATABASE_SUFFIX)
    }

    /// 수신 주소
    pub fn listen_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    /// 시작 전 필수값 검증
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.application_name.is_empty() {
            return Err(CoreError::Config("no application name specified".to_string()));
        }
        if self.db_url.is_empty() {
            return Err(CoreError::Config("no database URL specified".to_string()));
        }
        parse_period(&self.query_period)
            .map_err(|e| CoreError::Config(format!("fail to parse --query-period: {e}")))?;
        Ok(())
    }
}

impl fmt::Debug for CollectorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectorConfig")
            .field("application_name", &self.application_name)
            .field("db_url", &self.db_url)
            .field("db_user", &self.db_user)
            .field("db_pass", &if self.db_pass.is_empty() { "" } else { "***" })
            .field("query_period", &self.query_period)
            .field("port", &self.port)
            .finish()
    }
}

// ============================================================
// 에이전트 설정
// ============================================================

/// 보고 에이전트 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// 콜렉터 메트릭 엔드포인트 전체 URL (예: `https://example.com/v1/metrics`)
    pub collector_url: String,
    /// 첫 서버 응답 전까지 사용할 보고 간격
    #[serde(default = "default_request_interval")]
    pub default_request_interval: Duration,
    /// HTTP 요청 타임아웃
    #[serde(default = "default_request_timeout")]
    pub request_timeout: Duration,
}

fn default_request_interval() -> Duration {
    DEFAULT_REQUEST_INTERVAL
}

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            collector_url: format!("http://localhost:{DEFAULT_PORT}/v1/metrics"),
            default_request_interval: DEFAULT_REQUEST_INTERVAL,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}
