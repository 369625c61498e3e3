//! InfluxDB 1.x 저장소 어댑터.
//!
//! `MetricsStore` 포트 구현. HTTP API(`/query`, `/write`)를 사용하며
//! 포인트 타임스탬프는 콜렉터 수신 시각(ns 정밀도)으로 기록한다.

use async_trait::async_trait;
use binoculars_core::error::CoreError;
use binoculars_core::models::metric::Metric;
use binoculars_core::models::point::Point;
use binoculars_core::ports::metrics_store::{MetricsStore, WriteSummary};
use chrono::Utc;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

use crate::line_protocol;

/// 기록 정밀도 (나노초)
const PRECISION_NANOSECOND: &str = "ns";

/// HTTP 요청 타임아웃
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// `/query` 응답 본문
#[derive(Debug, Default, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    #[serde(default)]
    error: Option<String>,
}

/// InfluxDB 저장소 — `MetricsStore` 포트 구현
pub struct InfluxDbStore {
    client: reqwest::Client,
    base_url: Url,
    username: Option<String>,
    password: Option<String>,
    closed: AtomicBool,
}

impl InfluxDbStore {
    /// 새 InfluxDB 어댑터 생성
    ///
    /// 사용자 이름이 비어 있지 않을 때만 Basic 인증을 사용한다.
    /// TLS 인증서 검증은 하지 않는다.
    pub fn new(url: &str, username: &str, password: &str) -> Result<Self, CoreError> {
        if url.is_empty() {
            return Err(CoreError::Config("empty url".to_string()));
        }

        let mut base_url = Url::parse(url)
            .map_err(|e| CoreError::Config(format!("잘못된 DB URL {url:?}: {e}")))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {e}")))?;

        Ok(Self {
            client,
            base_url,
            username: (!username.is_empty()).then(|| username.to_string()),
            password: (!password.is_empty()).then(|| password.to_string()),
            closed: AtomicBool::new(false),
        })
    }

    /// 엔드포인트 URL 생성
    fn endpoint(&self, path: &str) -> Result<Url, CoreError> {
        self.base_url
            .join(path)
            .map_err(|e| CoreError::Internal(format!("엔드포인트 URL 생성 실패: {e}")))
    }

    /// 인증 헤더가 포함된 요청 빌더 반환
    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let req = self.client.request(method, url);
        match &self.username {
            Some(user) => req.basic_auth(user, self.password.as_ref()),
            None => req,
        }
    }

    fn ensure_open(&self) -> Result<(), CoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(CoreError::Store("InfluxDB 연결이 이미 종료됨".to_string()));
        }
        Ok(())
    }

    /// InfluxQL 식별자 인용
    fn quote_ident(name: &str) -> String {
        format!("\"{}\"", name.replace('\\', "\\\\").replace('"', "\\\""))
    }

    /// 에러 응답 본문에서 메시지 추출 (`{"error": "..."}` 또는 원문)
    fn error_message(body: &str) -> String {
        serde_json::from_str::<QueryResponse>(body)
            .ok()
            .and_then(|r| r.error)
            .unwrap_or_else(|| body.trim().to_string())
    }
}

#[async_trait]
impl MetricsStore for InfluxDbStore {
    async fn create_database(&self, name: &str) -> Result<(), CoreError> {
        self.ensure_open()?;

        let statement = format!("CREATE DATABASE {}", Self::quote_ident(name));
        debug!("InfluxDB 쿼리: {statement}");

        let resp = self
            .request(reqwest::Method::POST, self.endpoint("query")?)
            .form(&[("q", statement.as_str())])
            .send()
            .await
            .map_err(|e| CoreError::Store(format!("데이터베이스 생성 요청 실패: {e}")))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| CoreError::Store(format!("쿼리 응답 읽기 실패: {e}")))?;

        if !status.is_success() {
            return Err(CoreError::Store(format!(
                "데이터베이스 생성 실패 ({status}): {}",
                Self::error_message(&body)
            )));
        }

        let parsed: QueryResponse = serde_json::from_str(&body)
            .map_err(|e| CoreError::Store(format!("쿼리 응답 파싱 실패: {e}")))?;
        if let Some(err) = parsed.error {
            return Err(CoreError::Store(err));
        }
        if let Some(err) = parsed.results.into_iter().find_map(|r| r.error) {
            return Err(CoreError::Store(err));
        }

        info!("데이터베이스 준비 완료: {name}");
        Ok(())
    }

    async fn write_batch(
        &self,
        database: &str,
        metrics: &[Metric],
    ) -> Result<WriteSummary, CoreError> {
        self.ensure_open()?;

        let (points, skipped) = Point::convert_batch(metrics, Utc::now());
        let summary = WriteSummary {
            written: points.len(),
            skipped,
        };
        if points.is_empty() {
            debug!("기록할 포인트 없음 (건너뜀 {skipped}개)");
            return Ok(summary);
        }

        let mut url = self.endpoint("write")?;
        url.query_pairs_mut()
            .append_pair("db", database)
            .append_pair("precision", PRECISION_NANOSECOND);

        let resp = self
            .request(reqwest::Method::POST, url)
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(line_protocol::encode_points(&points))
            .send()
            .await
            .map_err(|e| CoreError::Store(format!("InfluxDB 쓰기 요청 실패: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_else(|e| {
                tracing::warn!("응답 본문 읽기 실패: {e}");
                String::new()
            });
            return Err(CoreError::Store(format!(
                "InfluxDB 쓰기 실패 ({status}): {}",
                Self::error_message(&body)
            )));
        }

        debug!("InfluxDB 쓰기 성공: {} 포인트 → {database}", summary.written);
        Ok(summary)
    }

    async fn close(&self) -> Result<(), CoreError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            debug!("InfluxDB 연결 이미 종료됨");
        } else {
            debug!("InfluxDB 연결 종료");
        }
        Ok(())
    }
}
