use std::collections::BTreeMap;

use crate::span::TagValue;

/// A span under construction: a name plus the tags known before start.
#[derive(Clone, Debug, Default)]
pub struct SpanBuilder {
    pub name: String,
    pub tags: BTreeMap<String, TagValue>,
}

impl SpanBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tags: BTreeMap::new(),
        }
    }

    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<TagValue>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }
}

/// A started span.
///
/// Every method must be callable in any state without panicking; callers
/// drive the lifecycle blindly and rely on the backend to sort out misuse
/// (a second `finish` is a no-op, tags after `finish` are dropped).
pub trait Span: Send {
    fn set_tag(&mut self, key: &str, value: TagValue);

    /// Attach a structured log entry to the span.
    fn log(&mut self, fields: BTreeMap<String, serde_json::Value>);

    /// Mark the span complete and hand it to the backend.
    fn finish(&mut self);
}

/// The capabilities wiretap needs from a tracing backend.
///
/// Parenting is the tracer's concern: a started span becomes a child of
/// whatever span the backend considers active in the calling context, or a
/// new root when none is.
pub trait Tracer: Send + Sync {
    fn start_span(&self, builder: SpanBuilder) -> Box<dyn Span>;

    /// Whether a span is active in the calling context.
    fn has_active_span(&self) -> bool;
}

/// A span with observable-no effect.
///
/// Returned instead of a real span when instrumentation is gated off, so
/// call sites keep a single code path through tag/log/finish.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSpan;

impl NoopSpan {
    pub fn boxed() -> Box<dyn Span> {
        Box::new(NoopSpan)
    }
}

impl Span for NoopSpan {
    fn set_tag(&mut self, _key: &str, _value: TagValue) {}

    fn log(&mut self, _fields: BTreeMap<String, serde_json::Value>) {}

    fn finish(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_tags() {
        let builder = SpanBuilder::new("get")
            .with_tag("id", "u:1")
            .with_tag("attempt", 2i64);

        assert_eq!(builder.name, "get");
        assert_eq!(builder.tags.get("id"), Some(&TagValue::String("u:1".into())));
        assert_eq!(builder.tags.get("attempt"), Some(&TagValue::Int(2)));
    }

    #[test]
    fn noop_span_accepts_the_whole_lifecycle() {
        let mut span = NoopSpan::boxed();
        span.set_tag("id", "u:1".into());
        span.log(BTreeMap::new());
        span.finish();
        span.finish();
    }
}
