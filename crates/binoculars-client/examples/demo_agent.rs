//! 보고 에이전트 예제
//!
//! 인스턴스 UUID 태그가 붙은 `storage_capacity`, `enabled_feature` 메트릭을
//! 콜렉터로 보고한다. SIGINT/SIGTERM 수신 시 루프 종료를 기다린 뒤 끝난다.
//!
//! 실행:
//!   BINOCULARS_URL=http://localhost:8324/v1/metrics \
//!     cargo run -p binoculars-client --example demo_agent
//!
//! 텔레메트리 수집 거부:
//!   BINOCULARS_TELEMETRY=off cargo run -p binoculars-client --example demo_agent

use std::collections::HashMap;
use std::sync::Arc;

use binoculars_client::{DefinedMetricHandler, MetricDefinition, ReportingAgent};
use binoculars_core::config::AgentConfig;
use binoculars_core::error::CoreError;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 사용자 동의 여부
fn telemetry_allowed() -> bool {
    !matches!(
        std::env::var("BINOCULARS_TELEMETRY").as_deref(),
        Ok("off" | "false" | "0")
    )
}

fn definitions(instance_uuid: String) -> Vec<MetricDefinition> {
    let tags = move || HashMap::from([("instance_uuid".to_string(), instance_uuid.clone())]);

    vec![
        MetricDefinition::new("storage_capacity", tags.clone(), || {
            HashMap::from([("value".to_string(), json!(1_000_000_000_000_u64))])
        }),
        MetricDefinition::new("enabled_feature", tags, || {
            HashMap::from([
                ("data_locality".to_string(), json!(1)),
                ("auto_salvage".to_string(), json!(1)),
            ])
        }),
    ]
}

async fn wait_for_signal() -> Result<(), CoreError> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut sigint = signal(SignalKind::interrupt())?;
        let mut sigterm = signal(SignalKind::terminate())?;
        tokio::select! {
            _ = sigint.recv() => info!("SIGINT 수신"),
            _ = sigterm.recv() => info!("SIGTERM 수신"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await?;
        info!("Ctrl+C 수신");
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), CoreError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = AgentConfig::default();
    if let Ok(url) = std::env::var("BINOCULARS_URL") {
        config.collector_url = url;
    }

    let agent = if telemetry_allowed() {
        let instance_uuid = uuid::Uuid::new_v4().to_string();
        info!("인스턴스 {instance_uuid} → {}", config.collector_url);

        let handler = DefinedMetricHandler::new(definitions(instance_uuid));
        let agent = ReportingAgent::from_config(&config, Arc::new(handler))?;
        agent.start();
        Some(agent)
    } else {
        info!("텔레메트리 수집 거부됨, 에이전트 미시작");
        None
    };

    wait_for_signal().await?;

    if let Some(agent) = agent {
        agent.stop_and_wait().await;
    }
    Ok(())
}
