//! 콜렉터 HTTP 클라이언트.
//!
//! `ReportTransport` 포트 구현. 메트릭 배치를 JSON 배열로 POST하고
//! 응답 본문에서 권장 보고 간격을 읽는다. 재시도는 하지 않는다.

use async_trait::async_trait;
use binoculars_core::config::DEFAULT_REQUEST_TIMEOUT;
use binoculars_core::error::CoreError;
use binoculars_core::models::metric::Metric;
use binoculars_core::models::response::ServerResponse;
use binoculars_core::ports::report_transport::ReportTransport;
use reqwest::StatusCode;
use std::time::Duration;
use tracing::debug;

/// 콜렉터 HTTP 클라이언트 — `ReportTransport` 포트 구현
#[derive(Debug, Clone)]
pub struct HttpReportClient {
    client: reqwest::Client,
    collector_url: String,
}

impl HttpReportClient {
    /// 기본 타임아웃(30초)으로 생성
    ///
    /// `collector_url`은 메트릭 엔드포인트 전체 URL (예: `https://example.com/v1/metrics`)
    pub fn new(collector_url: &str) -> Result<Self, CoreError> {
        Self::with_timeout(collector_url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// 요청 타임아웃 지정 생성
    pub fn with_timeout(collector_url: &str, timeout: Duration) -> Result<Self, CoreError> {
        if collector_url.is_empty() {
            return Err(CoreError::Config("콜렉터 URL이 비어 있음".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoreError::Network(format!("HTTP 클라이언트 빌드 실패: {e}")))?;

        Ok(Self {
            client,
            collector_url: collector_url.to_string(),
        })
    }
}

#[async_trait]
impl ReportTransport for HttpReportClient {
    async fn send_metrics(&self, metrics: &[Metric]) -> Result<ServerResponse, CoreError> {
        debug!("메트릭 전송: {}개 → {}", metrics.len(), self.collector_url);

        let resp = self
            .client
            .post(&self.collector_url)
            .json(metrics)
            .send()
            .await
            .map_err(|e| CoreError::Network(format!("메트릭 전송 실패: {e}")))?;

        let status = resp.status();
        let body = resp
            .bytes()
            .await
            .map_err(|e| CoreError::Network(format!("응답 본문 읽기 실패: {e}")))?;

        if status != StatusCode::OK {
            return Err(CoreError::UnexpectedStatus {
                status: status.as_u16(),
                message: String::from_utf8_lossy(&body).trim_end().to_string(),
            });
        }

        let response: ServerResponse = serde_json::from_slice(&body)
            .map_err(|e| CoreError::Decode(format!("콜렉터 응답 파싱 실패: {e}")))?;

        debug!(
            "콜렉터 응답: requestIntervalInMinutes={}",
            response.request_interval_in_minutes
        );
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn sample() -> Vec<Metric> {
        vec![Metric::new("storage_capacity")
            .tag("instance_uuid", "abc")
            .field("value", 1024)]
    }

    #[test]
    fn empty_url_rejected() {
        assert!(HttpReportClient::new("").is_err());
    }

    #[tokio::test]
    async fn posts_bare_array_and_parses_interval() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/metrics")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(serde_json::json!([
                {"name": "storage_capacity", "tags": {"instance_uuid": "abc"}, "fields": {"value": 1024}}
            ])))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"requestIntervalInMinutes":15}"#)
            .create_async()
            .await;

        let client = HttpReportClient::new(&format!("{}/v1/metrics", server.url())).unwrap();
        let resp = client.send_metrics(&sample()).await.unwrap();

        assert_eq!(resp.request_interval_in_minutes, 15);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn empty_batch_is_sent_as_empty_array() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/metrics")
            .match_body(Matcher::Exact("[]".to_string()))
            .with_status(200)
            .with_body(r#"{"requestIntervalInMinutes":60}"#)
            .create_async()
            .await;

        let client = HttpReportClient::new(&format!("{}/v1/metrics", server.url())).unwrap();
        assert!(client.send_metrics(&[]).await.is_ok());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_ok_status_carries_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/metrics")
            .with_status(400)
            .with_body("expected value at line 1 column 1\n")
            .create_async()
            .await;

        let client = HttpReportClient::new(&format!("{}/v1/metrics", server.url())).unwrap();
        let err = client.send_metrics(&sample()).await.unwrap_err();

        match err {
            CoreError::UnexpectedStatus { status, ref message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "expected value at line 1 column 1");
            }
            other => panic!("예상치 못한 에러: {other:?}"),
        }
        assert!(err.to_string().starts_with("query return status code 400"));
    }

    #[tokio::test]
    async fn accepted_is_not_ok() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/metrics")
            .with_status(202)
            .with_body(r#"{"requestIntervalInMinutes":5}"#)
            .create_async()
            .await;

        let client = HttpReportClient::new(&format!("{}/v1/metrics", server.url())).unwrap();
        let err = client.send_metrics(&sample()).await.unwrap_err();
        assert!(matches!(err, CoreError::UnexpectedStatus { status: 202, .. }));
    }

    #[tokio::test]
    async fn malformed_response_is_decode_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1/metrics")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = HttpReportClient::new(&format!("{}/v1/metrics", server.url())).unwrap();
        let err = client.send_metrics(&sample()).await.unwrap_err();
        assert!(matches!(err, CoreError::Decode(_)));
    }

    #[tokio::test]
    async fn unreachable_collector_is_network_error() {
        let client = HttpReportClient::with_timeout(
            "http://127.0.0.1:1/v1/metrics",
            Duration::from_secs(2),
        )
        .unwrap();
        let err = client.send_metrics(&sample()).await.unwrap_err();
        assert!(matches!(err, CoreError::Network(_)));
    }
}
