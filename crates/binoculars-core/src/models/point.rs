//! 저장용 포인트.
//!
//! 수신한 [`Metric`]을 시계열 저장소에 기록 가능한 형태로 변환한다.
//! 변환 실패는 포인트 단위 에러이며 배치 전체를 실패시키지 않는다.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

use crate::error::CoreError;
use crate::models::metric::Metric;

/// 타입이 확정된 필드 값
///
/// JSON 숫자는 정수/실수 구분 없이 모두 `Float`로 기록한다.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Float(f64),
    Boolean(bool),
    String(String),
}

impl FieldValue {
    /// JSON 값을 필드 값으로 변환
    pub fn from_json(key: &str, value: &Value) -> Result<Self, CoreError> {
        match value {
            Value::Number(n) => n.as_f64().map(FieldValue::Float).ok_or_else(|| {
                CoreError::validation(format!("fields.{key}"), format!("표현할 수 없는 숫자: {n}"))
            }),
            Value::Bool(b) => Ok(FieldValue::Boolean(*b)),
            Value::String(s) => Ok(FieldValue::String(s.clone())),
            Value::Null => Err(CoreError::validation(
                format!("fields.{key}"),
                "null 값은 저장할 수 없음",
            )),
            Value::Array(_) | Value::Object(_) => Err(CoreError::validation(
                format!("fields.{key}"),
                "지원하지 않는 필드 타입 (배열/객체)",
            )),
        }
    }
}

/// 저장소 예약 키 (태그/필드 키로 쓸 수 없음)
const RESERVED_KEY: &str = "time";

/// 태그/필드 키 검사
fn check_key(field: &str, key: &str) -> Result<(), CoreError> {
    if key.is_empty() {
        return Err(CoreError::validation(field, "빈 키"));
    }
    if key == RESERVED_KEY {
        return Err(CoreError::validation(field, format!("예약된 키 {key:?}")));
    }
    check_trailing_backslash(field, key)
}

/// 끝의 `\`는 뒤따르는 구분자를 이스케이프하므로 거부
fn check_trailing_backslash(field: &str, value: &str) -> Result<(), CoreError> {
    if value.ends_with('\\') {
        return Err(CoreError::validation(field, "'\\'로 끝나는 값"));
    }
    Ok(())
}

/// 시계열 저장소 포인트
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    /// 측정 이름
    pub measurement: String,
    /// 태그 (키 정렬)
    pub tags: BTreeMap<String, String>,
    /// 필드 (키 정렬, 최소 1개)
    pub fields: BTreeMap<String, FieldValue>,
    /// 콜렉터 수신 시각
    pub timestamp: DateTime<Utc>,
}

impl Point {
    /// 메트릭을 포인트로 변환
    ///
    /// 빈 이름, 필드 없음, 빈 키, null/배열/객체 필드 값은 에러.
    /// line protocol로 표현할 수 없는 이름(`#` 시작, `\`로 끝남, 예약 키 `time`)도 에러.
    /// 값이 빈 태그는 저장소 관례대로 생략한다.
    pub fn from_metric(metric: &Metric, timestamp: DateTime<Utc>) -> Result<Self, CoreError> {
        if metric.name.is_empty() {
            return Err(CoreError::validation("name", "측정 이름이 비어 있음"));
        }
        if metric.name.starts_with('#') {
            return Err(CoreError::validation("name", "'#'으로 시작하는 측정 이름"));
        }
        check_trailing_backslash("name", &metric.name)?;
        if metric.fields.is_empty() {
            return Err(CoreError::validation("fields", "필드가 없는 포인트는 지원하지 않음"));
        }

        let mut tags = BTreeMap::new();
        for (key, value) in &metric.tags {
            check_key("tags", key)?;
            check_trailing_backslash(&format!("tags.{key}"), value)?;
            if !value.is_empty() {
                tags.insert(key.clone(), value.clone());
            }
        }

        let mut fields = BTreeMap::new();
        for (key, value) in &metric.fields {
            check_key("fields", key)?;
            fields.insert(key.clone(), FieldValue::from_json(key, value)?);
        }

        Ok(Self {
            measurement: metric.name.clone(),
            tags,
            fields,
            timestamp,
        })
    }

    /// 배치 변환. 변환 실패한 메트릭은 경고 로그 후 건너뛴다.
    ///
    /// 반환: (변환된 포인트, 건너뛴 개수)
    pub fn convert_batch(metrics: &[Metric], timestamp: DateTime<Utc>) -> (Vec<Point>, usize) {
        let mut points = Vec::with_capacity(metrics.len());
        let mut skipped = 0;

        for metric in metrics {
            match Point::from_metric(metric, timestamp) {
                Ok(point) => points.push(point),
                Err(e) => {
                    warn!(
                        "메트릭 {:?} 포인트 생성 실패, 이 포인트는 건너뜀: {e}",
                        metric.name
                    );
                    skipped += 1;
                }
            }
        }

        (points, skipped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ts() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn converts_scalars() {
        let metric = Metric::new("enabled_feature")
            .tag("instance_uuid", "abc")
            .field("data_locality", 1)
            .field("enabled", true)
            .field("mode", "strict");

        let point = Point::from_metric(&metric, ts()).unwrap();
        assert_eq!(point.measurement, "enabled_feature");
        assert_eq!(point.tags["instance_uuid"], "abc");
        assert_eq!(point.fields["data_locality"], FieldValue::Float(1.0));
        assert_eq!(point.fields["enabled"], FieldValue::Boolean(true));
        assert_eq!(point.fields["mode"], FieldValue::String("strict".into()));
        assert_eq!(point.timestamp, ts());
    }

    #[test]
    fn rejects_unserializable_fields() {
        let null_field = Metric::new("m").field("v", Value::Null);
        assert!(Point::from_metric(&null_field, ts()).is_err());

        let object_field = Metric::new("m").field("v", json!({"nested": 1}));
        assert!(Point::from_metric(&object_field, ts()).is_err());

        let array_field = Metric::new("m").field("v", json!([1, 2]));
        assert!(Point::from_metric(&array_field, ts()).is_err());
    }

    #[test]
    fn rejects_structurally_empty_metrics() {
        assert!(Point::from_metric(&Metric::new("").field("v", 1), ts()).is_err());
        assert!(Point::from_metric(&Metric::new("m"), ts()).is_err());
        assert!(Point::from_metric(&Metric::new("m").field("", 1), ts()).is_err());
        assert!(Point::from_metric(&Metric::new("m").tag("", "x").field("v", 1), ts()).is_err());
    }

    #[test]
    fn rejects_values_line_protocol_cannot_carry() {
        let cases = [
            Metric::new("m").tag("path", "C:\\").field("v", 1),
            Metric::new("m").tag("dir\\", "x").field("v", 1),
            Metric::new("m").field("v\\", 1),
            Metric::new("m\\").field("v", 1),
            Metric::new("#note").field("v", 1),
            Metric::new("m").field("time", 1),
            Metric::new("m").tag("time", "x").field("v", 1),
        ];
        for metric in &cases {
            assert!(Point::from_metric(metric, ts()).is_err(), "{metric:?}");
        }

        let inner = Metric::new("a#b").tag("path", "C:\\dir").field("timestamp", 1);
        assert!(Point::from_metric(&inner, ts()).is_ok());
    }

    #[test]
    fn empty_tag_values_are_dropped() {
        let metric = Metric::new("m").tag("zone", "").field("v", 1);
        let point = Point::from_metric(&metric, ts()).unwrap();
        assert!(point.tags.is_empty());
    }

    #[test]
    fn convert_batch_skips_bad_points() {
        let metrics = vec![
            Metric::new("bad").field("v", Value::Null),
            Metric::new("good").field("v", 2.5),
        ];
        let (points, skipped) = Point::convert_batch(&metrics, ts());
        assert_eq!(skipped, 1);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].measurement, "good");
    }
}
