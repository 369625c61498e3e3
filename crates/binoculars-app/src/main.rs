//! # binoculars-app
//!
//! Binoculars 콜렉터 바이너리 진입점.
//! CLI/환경변수 파싱, 로깅 초기화, 저장소 와이어링, 시그널 기반 종료.

mod supervisor;

use anyhow::{Context, Result};
use binoculars_collector::{Collector, CollectorSettings};
use binoculars_core::config::{CollectorConfig, DEFAULT_PORT, DEFAULT_QUERY_PERIOD};
use binoculars_storage::InfluxDbStore;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use crate::supervisor::{os_signal, ServerSupervisor, StopCause};

/// Binoculars 텔레메트리 콜렉터
///
/// 에이전트가 보고한 메트릭을 InfluxDB에 기록한다.
#[derive(Parser, Debug)]
#[command(name = "binoculars")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// 디버그 로그 활성화
    #[arg(long, short = 'd', env = "DEBUG", global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 콜렉터 서버 시작
    Start(StartArgs),
}

#[derive(clap::Args, Debug)]
struct StartArgs {
    /// 이 콜렉터를 사용하는 애플리케이션 이름
    ///
    /// InfluxDB에 `<application-name>_binoculars` 데이터베이스를 만들어 모든 데이터를 저장한다.
    #[arg(long, env = "APPLICATION_NAME", default_value = "")]
    application_name: String,

    /// 데이터베이스 URL
    #[arg(long, env = "DB_URL", default_value = "")]
    db_url: String,

    /// 데이터베이스 사용자
    #[arg(long, env = "DB_USER", default_value = "")]
    db_user: String,

    /// 데이터베이스 비밀번호
    #[arg(long, env = "DB_PASS", default_value = "", hide_env_values = true)]
    db_pass: String,

    /// 각 애플리케이션 인스턴스의 보고 주기
    ///
    /// 처음 설정 후 변경할 수 없다. Grafana GROUP BY 절의 시간과 같아야 한다.
    #[arg(long, env = "QUERY_PERIOD", default_value = DEFAULT_QUERY_PERIOD)]
    query_period: String,

    /// 수신 포트
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,
}

impl From<StartArgs> for CollectorConfig {
    fn from(args: StartArgs) -> Self {
        Self {
            application_name: args.application_name,
            db_url: args.db_url,
            db_user: args.db_user,
            db_pass: args.db_pass,
            query_period: args.query_period,
            port: args.port,
        }
    }
}

/// 로그 필터 (RUST_LOG가 있으면 우선)
fn log_filter(debug: bool) -> EnvFilter {
    let default = if debug {
        "info,binoculars=debug,binoculars_core=debug,binoculars_storage=debug,binoculars_collector=debug,tower_http=debug"
    } else {
        "info"
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

async fn start(config: CollectorConfig) -> Result<()> {
    config.validate()?;
    debug!("콜렉터 설정: {config:?}");

    let store = InfluxDbStore::new(&config.db_url, &config.db_user, &config.db_pass)
        .context("fail to create db client")?;
    let collector = Collector::connect(Arc::new(store), CollectorSettings::from(&config))
        .await
        .context("데이터베이스 초기화 실패")?;

    info!(
        "데이터베이스 {}, 권장 보고 간격 {}분",
        collector.database_name(),
        collector.request_interval_minutes()
    );

    let listen_addr = config.listen_addr();
    let listener = TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("{listen_addr} 바인드 실패"))?;
    info!("서버 수신 대기: {listen_addr}");

    let supervisor = ServerSupervisor::new();
    let server = tokio::spawn(collector.serve(listener, supervisor.shutdown_receiver()));

    match supervisor.supervise(server, os_signal()).await? {
        StopCause::Signal(signal) => info!("콜렉터 종료 ({signal})"),
        StopCause::ServerExited => info!("콜렉터 종료"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(args.debug))
        .init();

    let result = match args.command {
        Command::Start(start_args) => start(CollectorConfig::from(start_args)).await,
    };
    if let Err(e) = &result {
        error!("{e:#}");
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(args).unwrap()
    }

    #[test]
    fn start_defaults() {
        let args = parse(&["binoculars", "start", "--application-name", "longhorn"]);
        assert!(!args.debug);

        let Command::Start(start) = args.command;
        let config = CollectorConfig::from(start);
        assert_eq!(config.application_name, "longhorn");
        assert_eq!(config.query_period, "1h");
        assert_eq!(config.port, 8324);
        assert!(config.db_url.is_empty());
    }

    #[test]
    fn debug_flag_is_global() {
        let args = parse(&[
            "binoculars",
            "start",
            "-d",
            "--db-url",
            "http://influxdb:8086",
            "--port",
            "9000",
            "--query-period",
            "30m",
        ]);
        assert!(args.debug);

        let Command::Start(start) = args.command;
        assert_eq!(start.port, 9000);
        assert_eq!(start.query_period, "30m");
    }

    #[test]
    fn missing_fields_fail_validation() {
        let args = parse(&["binoculars", "start"]);
        let Command::Start(start) = args.command;
        let err = CollectorConfig::from(start).validate().unwrap_err();
        assert!(err.to_string().contains("no application name specified"));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Args::try_parse_from(["binoculars"]).is_err());
    }
}
