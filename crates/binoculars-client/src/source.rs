//! 정의 목록 기반 메트릭 핸들러.
//!
//! 호출자가 만든 [`MetricDefinition`] 목록을 생성 시점에 받아 매 사이클마다 평가한다.
//! 프로세스 전역 상태가 없으므로 한 프로세스에 여러 에이전트를 둘 수 있다.

use async_trait::async_trait;
use binoculars_core::error::CoreError;
use binoculars_core::models::metric::{Metric, MetricBatch};
use binoculars_core::models::response::ServerResponse;
use binoculars_core::ports::metric_handler::MetricHandler;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use tracing::{error, info};

type TagsFn = Box<dyn Fn() -> HashMap<String, String> + Send + Sync>;
type FieldsFn = Box<dyn Fn() -> HashMap<String, Value> + Send + Sync>;
type ResponseFn = Box<dyn Fn(&Result<ServerResponse, CoreError>) + Send + Sync>;

/// 메트릭 하나의 이름과 태그/필드 생성 함수
pub struct MetricDefinition {
    pub name: String,
    pub tags_fn: TagsFn,
    pub fields_fn: FieldsFn,
}

impl MetricDefinition {
    pub fn new<T, F>(name: impl Into<String>, tags_fn: T, fields_fn: F) -> Self
    where
        T: Fn() -> HashMap<String, String> + Send + Sync + 'static,
        F: Fn() -> HashMap<String, Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            tags_fn: Box::new(tags_fn),
            fields_fn: Box::new(fields_fn),
        }
    }

    /// 현재 값으로 메트릭 생성
    pub fn evaluate(&self) -> Metric {
        Metric {
            name: self.name.clone(),
            tags: (self.tags_fn)(),
            fields: (self.fields_fn)(),
        }
    }
}

impl fmt::Debug for MetricDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricDefinition")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// 정의 목록 기반 `MetricHandler` 구현
#[derive(Default)]
pub struct DefinedMetricHandler {
    definitions: Vec<MetricDefinition>,
    on_response: Option<ResponseFn>,
}

impl DefinedMetricHandler {
    pub fn new(definitions: Vec<MetricDefinition>) -> Self {
        Self {
            definitions,
            on_response: None,
        }
    }

    /// 보고 결과 콜백 등록
    pub fn with_response_callback<C>(mut self, callback: C) -> Self
    where
        C: Fn(&Result<ServerResponse, CoreError>) + Send + Sync + 'static,
    {
        self.on_response = Some(Box::new(callback));
        self
    }
}

#[async_trait]
impl MetricHandler for DefinedMetricHandler {
    async fn gather_metrics(&self) -> MetricBatch {
        self.definitions.iter().map(MetricDefinition::evaluate).collect()
    }

    async fn handle_response(&self, result: &Result<ServerResponse, CoreError>) {
        match result {
            Ok(resp) => info!(
                "메트릭 전송 성공 (다음 권장 간격 {}분)",
                resp.request_interval_in_minutes
            ),
            Err(e) => error!("메트릭 전송 실패: {e}"),
        }

        if let Some(callback) = &self.on_response {
            callback(result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
    use std::sync::Arc;

    fn uuid_tags() -> HashMap<String, String> {
        HashMap::from([("instance_uuid".to_string(), "123".to_string())])
    }

    #[tokio::test]
    async fn gathers_every_definition_in_order() {
        let handler = DefinedMetricHandler::new(vec![
            MetricDefinition::new("storage_capacity", uuid_tags, || {
                HashMap::from([("value".to_string(), json!(1_000_000_000_000_u64))])
            }),
            MetricDefinition::new("enabled_feature", uuid_tags, || {
                HashMap::from([
                    ("data_locality".to_string(), json!(1)),
                    ("auto_salvage".to_string(), json!(1)),
                ])
            }),
        ]);

        let batch = handler.gather_metrics().await;
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].name, "storage_capacity");
        assert_eq!(batch[1].name, "enabled_feature");
        assert_eq!(batch[1].fields.len(), 2);
        assert_eq!(batch[0].tags["instance_uuid"], "123");
    }

    #[tokio::test]
    async fn definitions_are_evaluated_each_cycle() {
        let counter = Arc::new(AtomicI64::new(0));
        let c = counter.clone();
        let handler = DefinedMetricHandler::new(vec![MetricDefinition::new(
            "ticks",
            HashMap::new,
            move || {
                let n = c.fetch_add(1, Ordering::SeqCst) + 1;
                HashMap::from([("n".to_string(), json!(n))])
            },
        )]);

        handler.gather_metrics().await;
        let batch = handler.gather_metrics().await;
        assert_eq!(batch[0].fields["n"], json!(2));
    }

    #[tokio::test]
    async fn separate_handlers_do_not_share_definitions() {
        let a = DefinedMetricHandler::new(vec![MetricDefinition::new(
            "a",
            HashMap::new,
            HashMap::new,
        )]);
        let b = DefinedMetricHandler::default();

        assert_eq!(a.gather_metrics().await.len(), 1);
        assert!(b.gather_metrics().await.is_empty());
    }

    #[tokio::test]
    async fn callback_sees_success_and_failure() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let handler = DefinedMetricHandler::default().with_response_callback(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        handler.handle_response(&Ok(ServerResponse::new(60))).await;
        handler
            .handle_response(&Err(CoreError::Network("down".to_string())))
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
