//! 메트릭 모델.
//!
//! 에이전트가 수집해 콜렉터로 전송하는 단일 메트릭과 배치.
//! 타임스탬프는 클라이언트가 보내지 않으며 콜렉터가 수신 시각으로 부여한다.

use serde::de::{self, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::ops::Deref;

use crate::error::CoreError;

/// 단일 메트릭
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    /// 측정 이름 (예: "storage_capacity")
    #[serde(default)]
    pub name: String,
    /// 차원 필터링용 태그 (비어 있을 수 있음)
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: HashMap<String, String>,
    /// 측정값 (숫자 또는 기타 스칼라)
    #[serde(default, deserialize_with = "null_as_default")]
    pub fields: HashMap<String, Value>,
}

impl Metric {
    /// 태그/필드가 비어 있는 메트릭 생성
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: HashMap::new(),
            fields: HashMap::new(),
        }
    }

    /// 태그 추가
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// 필드 추가
    pub fn field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// 일부 클라이언트가 빈 map을 `null`로 보내므로 빈 값으로 취급
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// 메트릭 배치
///
/// 순서는 의미가 없지만 진단을 위해 보존한다.
/// 직렬화는 JSON 배열, 역직렬화는 배열 / `{"metrics": [...]}` / `null` 모두 허용.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct MetricBatch(Vec<Metric>);

impl MetricBatch {
    /// 요청 본문에서 배치 디코딩
    pub fn from_json(body: &[u8]) -> Result<Self, CoreError> {
        Ok(serde_json::from_slice(body)?)
    }
}

impl Deref for MetricBatch {
    type Target = [Metric];

    fn deref(&self) -> &[Metric] {
        &self.0
    }
}

impl From<Vec<Metric>> for MetricBatch {
    fn from(metrics: Vec<Metric>) -> Self {
        Self(metrics)
    }
}

impl FromIterator<Metric> for MetricBatch {
    fn from_iter<I: IntoIterator<Item = Metric>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for MetricBatch {
    type Item = Metric;
    type IntoIter = std::vec::IntoIter<Metric>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'de> Deserialize<'de> for MetricBatch {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(BatchVisitor)
    }
}

struct BatchVisitor;

impl<'de> Visitor<'de> for BatchVisitor {
    type Value = MetricBatch;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an array of metrics or an object with a `metrics` array")
    }

    fn visit_unit<E: de::Error>(self) -> Result<MetricBatch, E> {
        Ok(MetricBatch::default())
    }

    fn visit_none<E: de::Error>(self) -> Result<MetricBatch, E> {
        Ok(MetricBatch::default())
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<MetricBatch, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut metrics = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(metric) = seq.next_element::<Metric>()? {
            metrics.push(metric);
        }
        Ok(MetricBatch(metrics))
    }

    fn visit_map<A>(self, mut map: A) -> Result<MetricBatch, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut metrics: Option<Vec<Metric>> = None;
        while let Some(key) = map.next_key::<String>()? {
            if key == "metrics" {
                if metrics.is_some() {
                    return Err(de::Error::duplicate_field("metrics"));
                }
                metrics = Some(map.next_value::<Option<Vec<Metric>>>()?.unwrap_or_default());
            } else {
                map.next_value::<IgnoredAny>()?;
            }
        }
        Ok(MetricBatch(metrics.unwrap_or_default()))
    }
}
