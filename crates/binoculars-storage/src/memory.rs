//! 인메모리 저장소.
//!
//! `MetricsStore` 포트 구현. 테스트와 로컬 개발용이며,
//! 저장소 장애(`set_available(false)`)를 흉내 낼 수 있다.

use async_trait::async_trait;
use binoculars_core::error::CoreError;
use binoculars_core::models::metric::Metric;
use binoculars_core::models::point::Point;
use binoculars_core::ports::metrics_store::{MetricsStore, WriteSummary};
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::debug;

/// 인메모리 저장소 — `MetricsStore` 포트 구현
#[derive(Debug)]
pub struct InMemoryStore {
    /// 데이터베이스별 포인트
    databases: RwLock<HashMap<String, Vec<Point>>>,
    /// `write_batch` 호출 수
    write_calls: AtomicUsize,
    available: AtomicBool,
    closed: AtomicBool,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// 빈 저장소 생성
    pub fn new() -> Self {
        Self {
            databases: RwLock::new(HashMap::new()),
            write_calls: AtomicUsize::new(0),
            available: AtomicBool::new(true),
            closed: AtomicBool::new(false),
        }
    }

    /// 저장소 가용성 설정 (false면 모든 호출이 연결 실패)
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// 데이터베이스 존재 여부
    pub fn has_database(&self, name: &str) -> bool {
        self.databases.read().contains_key(name)
    }

    /// 기록된 포인트 복사본
    pub fn points(&self, database: &str) -> Vec<Point> {
        self.databases
            .read()
            .get(database)
            .cloned()
            .unwrap_or_default()
    }

    /// 기록된 포인트 수
    pub fn point_count(&self, database: &str) -> usize {
        self.databases.read().get(database).map_or(0, Vec::len)
    }

    /// `write_batch` 호출 수 (실패 포함)
    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    /// 종료 여부
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_reachable(&self) -> Result<(), CoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(CoreError::Store("저장소 연결이 이미 종료됨".to_string()));
        }
        if !self.available.load(Ordering::SeqCst) {
            return Err(CoreError::Store("저장소에 연결할 수 없음".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl MetricsStore for InMemoryStore {
    async fn create_database(&self, name: &str) -> Result<(), CoreError> {
        self.ensure_reachable()?;
        self.databases.write().entry(name.to_string()).or_default();
        debug!("인메모리 데이터베이스 준비: {name}");
        Ok(())
    }

    async fn write_batch(
        &self,
        database: &str,
        metrics: &[Metric],
    ) -> Result<WriteSummary, CoreError> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        self.ensure_reachable()?;

        let (points, skipped) = Point::convert_batch(metrics, Utc::now());
        let written = points.len();

        let mut databases = self.databases.write();
        let stored = databases
            .get_mut(database)
            .ok_or_else(|| CoreError::Store(format!("database not found: {database:?}")))?;
        stored.extend(points);

        Ok(WriteSummary { written, skipped })
    }

    async fn close(&self) -> Result<(), CoreError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::sync::Arc;

    #[tokio::test]
    async fn write_requires_database() {
        let store = InMemoryStore::new();
        let err = store
            .write_batch("missing", &[Metric::new("m").field("v", 1)])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("database not found"));
        assert_eq!(store.write_calls(), 1);
    }

    #[tokio::test]
    async fn partial_batch_keeps_valid_points() {
        let store = InMemoryStore::new();
        store.create_database("db").await.unwrap();

        let summary = store
            .write_batch(
                "db",
                &[
                    Metric::new("bad").field("v", Value::Null),
                    Metric::new("good").field("v", 1),
                ],
            )
            .await
            .unwrap();

        assert_eq!(summary, WriteSummary { written: 1, skipped: 1 });
        let points = store.points("db");
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].measurement, "good");
    }

    #[tokio::test]
    async fn outage_and_close_fail_writes() {
        let store = InMemoryStore::new();
        store.create_database("db").await.unwrap();

        store.set_available(false);
        assert!(store.write_batch("db", &[]).await.is_err());
        assert!(store.create_database("other").await.is_err());

        store.set_available(true);
        assert!(store.write_batch("db", &[]).await.is_ok());

        store.close().await.unwrap();
        assert!(store.is_closed());
        assert!(store.write_batch("db", &[]).await.is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writes_are_all_recorded() {
        let store = Arc::new(InMemoryStore::new());
        store.create_database("db").await.unwrap();

        let writes = (0..32).map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .write_batch("db", &[Metric::new(format!("m{i}")).field("v", i)])
                    .await
            })
        });

        for result in futures::future::join_all(writes).await {
            assert!(result.unwrap().is_ok());
        }
        assert_eq!(store.point_count("db"), 32);
        assert_eq!(store.write_calls(), 32);
    }
}
