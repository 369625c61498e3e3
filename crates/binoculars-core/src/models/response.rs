//! 콜렉터 응답 모델.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 콜렉터가 다음 보고 주기로 권장하는 간격
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerResponse {
    /// 권장 보고 간격 (분)
    #[serde(rename = "requestIntervalInMinutes", default)]
    pub request_interval_in_minutes: i64,
}

impl ServerResponse {
    /// 새 응답 생성
    pub fn new(request_interval_in_minutes: i64) -> Self {
        Self {
            request_interval_in_minutes,
        }
    }

    /// 에이전트가 채택할 간격. 0 이하이면 `None` (기존 간격 유지)
    pub fn request_interval(&self) -> Option<Duration> {
        u64::try_from(self.request_interval_in_minutes)
            .ok()
            .filter(|minutes| *minutes > 0)
            .map(|minutes| Duration::from_secs(minutes.saturating_mul(60)))
    }
}
