use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::ids::{SpanId, TraceId};

/// Well-known tag keys and values shared by the instrumentation layer and
/// anything inspecting the spans it emits.
pub mod keys {
    /// Identifies the integration that produced the span.
    pub const COMPONENT: &str = "component";
    /// Span kind tag; wiretap only ever emits [`SPAN_KIND_CLIENT`].
    pub const SPAN_KIND: &str = "span.kind";
    pub const SPAN_KIND_CLIENT: &str = "client";
    /// Identifies the wrapped database system.
    pub const DB_TYPE: &str = "db.type";
    /// Boolean tag set to `true` when the wrapped call failed.
    pub const ERROR: &str = "error";

    /// Log field naming the event category (`"error"` for failures).
    pub const EVENT: &str = "event";
    /// Log field carrying the rendered failure.
    pub const ERROR_OBJECT: &str = "error.object";
    /// Log field carrying the failure's type name.
    pub const ERROR_KIND: &str = "error.kind";
}

/// Timestamp in nanoseconds since UNIX epoch
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub fn now() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos() as u64;
        Self(nanos)
    }
}

/// Tag value
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TagValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for TagValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for TagValue {
    fn from(value: u64) -> Self {
        Self::Int(value as i64)
    }
}

impl From<usize> for TagValue {
    fn from(value: usize) -> Self {
        Self::Int(value as i64)
    }
}

impl From<f64> for TagValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for TagValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Structured log entry attached to a span
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: Timestamp,
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl LogRecord {
    pub fn new(fields: BTreeMap<String, serde_json::Value>) -> Self {
        Self {
            timestamp: Timestamp::now(),
            fields,
        }
    }
}

/// A finished (or in-flight) span as recorded by a tracer backend
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpanRecord {
    pub trace_id: TraceId,
    pub span_id: SpanId,
    pub parent_span_id: Option<SpanId>,
    pub name: String,
    pub start_time: Timestamp,
    pub end_time: Option<Timestamp>,
    pub tags: BTreeMap<String, TagValue>,
    pub logs: Vec<LogRecord>,
}

impl SpanRecord {
    /// Calculate span duration in nanoseconds
    pub fn duration_nanos(&self) -> Option<u64> {
        self.end_time.map(|end| end.0 - self.start_time.0)
    }

    pub fn tag(&self, key: &str) -> Option<&TagValue> {
        self.tags.get(key)
    }

    /// Whether the failure tag was set on this span.
    pub fn is_error(&self) -> bool {
        matches!(self.tags.get(keys::ERROR), Some(TagValue::Bool(true)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(tags: BTreeMap<String, TagValue>) -> SpanRecord {
        SpanRecord {
            trace_id: TraceId::generate(),
            span_id: SpanId::generate(),
            parent_span_id: None,
            name: "op".to_owned(),
            start_time: Timestamp(10),
            end_time: Some(Timestamp(35)),
            tags,
            logs: Vec::new(),
        }
    }

    #[test]
    fn duration_is_end_minus_start() {
        assert_eq!(record(BTreeMap::new()).duration_nanos(), Some(25));
    }

    #[test]
    fn error_tag_must_be_boolean_true() {
        let mut tags = BTreeMap::new();
        assert!(!record(tags.clone()).is_error());

        tags.insert(keys::ERROR.to_owned(), TagValue::String("true".into()));
        assert!(!record(tags.clone()).is_error());

        tags.insert(keys::ERROR.to_owned(), TagValue::Bool(true));
        assert!(record(tags).is_error());
    }
}
