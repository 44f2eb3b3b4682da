use std::collections::BTreeMap;
use std::sync::Arc;

use wiretap_trace::{keys, NoopSpan, Span, SpanBuilder, TagValue, Tracer};

/// Identifies this integration on every span it emits.
pub const COMPONENT_NAME: &str = "rust-cooper";

/// Identifies the wrapped database system.
pub const DB_TYPE: &str = "cooper";

/// Decides whether a wrapped call gets a span and how spans are decorated.
///
/// Both settings are fixed at construction; a policy handed to a sub-handle
/// wrapper is the same policy, so tracing behavior never drifts across the
/// object graph a client session produces.
#[derive(Clone)]
pub struct TracePolicy {
    tracer: Arc<dyn Tracer>,
    active_span_only: bool,
}

impl TracePolicy {
    pub fn new(tracer: Arc<dyn Tracer>, active_span_only: bool) -> Self {
        Self {
            tracer,
            active_span_only,
        }
    }

    pub fn tracer(&self) -> &Arc<dyn Tracer> {
        &self.tracer
    }

    pub fn active_span_only(&self) -> bool {
        self.active_span_only
    }

    /// Produce the span for one wrapped operation.
    ///
    /// When gated off, the tracer is never consulted: the caller receives an
    /// inert span and nothing reaches the backend. Never fails.
    pub fn span(&self, operation: &str) -> Box<dyn Span> {
        if self.active_span_only && !self.tracer.has_active_span() {
            return NoopSpan::boxed();
        }
        self.tracer.start_span(
            SpanBuilder::new(operation)
                .with_tag(keys::COMPONENT, COMPONENT_NAME)
                .with_tag(keys::SPAN_KIND, keys::SPAN_KIND_CLIENT)
                .with_tag(keys::DB_TYPE, DB_TYPE),
        )
    }

    /// The span lifecycle every wrapped operation goes through: start, tag,
    /// delegate, record any failure, finish, and hand the delegate's result
    /// back untouched.
    pub fn traced<T, E, TagFn, CallFn>(
        &self,
        operation: &str,
        tag: TagFn,
        call: CallFn,
    ) -> Result<T, E>
    where
        E: std::error::Error,
        TagFn: FnOnce(&mut dyn Span),
        CallFn: FnOnce() -> Result<T, E>,
    {
        let mut span = self.span(operation);
        tag(span.as_mut());
        let result = call();
        if let Err(error) = &result {
            record_failure(span.as_mut(), error);
        }
        span.finish();
        result
    }
}

/// Mark a span failed and attach the failure as a structured log entry.
///
/// Finishing the span stays the caller's job, so it happens in exactly one
/// place regardless of how the call exited.
pub fn record_failure<E>(span: &mut dyn Span, error: &E)
where
    E: std::error::Error + ?Sized,
{
    span.set_tag(keys::ERROR, TagValue::Bool(true));

    let mut fields = BTreeMap::new();
    fields.insert(keys::EVENT.to_owned(), serde_json::json!("error"));
    fields.insert(
        keys::ERROR_OBJECT.to_owned(),
        serde_json::json!(error.to_string()),
    );
    fields.insert(
        keys::ERROR_KIND.to_owned(),
        serde_json::json!(std::any::type_name::<E>()),
    );
    span.log(fields);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiretap_trace::RecordingTracer;

    #[derive(Debug)]
    struct Boom;

    impl std::fmt::Display for Boom {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("boom")
        }
    }

    impl std::error::Error for Boom {}

    #[test]
    fn span_carries_fixed_tags() {
        let tracer = Arc::new(RecordingTracer::new());
        let policy = TracePolicy::new(tracer.clone(), false);

        policy.span("get").finish();

        let spans = tracer.finished_spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name, "get");
        assert_eq!(
            spans[0].tag(keys::COMPONENT),
            Some(&TagValue::String(COMPONENT_NAME.into()))
        );
        assert_eq!(
            spans[0].tag(keys::SPAN_KIND),
            Some(&TagValue::String(keys::SPAN_KIND_CLIENT.into()))
        );
        assert_eq!(
            spans[0].tag(keys::DB_TYPE),
            Some(&TagValue::String(DB_TYPE.into()))
        );
    }

    #[test]
    fn gated_policy_reports_nothing_without_active_span() {
        let tracer = Arc::new(RecordingTracer::new());
        let policy = TracePolicy::new(tracer.clone(), true);

        policy.span("get").finish();

        assert!(tracer.finished_spans().is_empty());
    }

    #[test]
    fn gated_policy_traces_under_active_span() {
        let tracer = Arc::new(RecordingTracer::new());
        let policy = TracePolicy::new(tracer.clone(), true);

        let mut parent = tracer.start_span(SpanBuilder::new("parent"));
        policy.span("get").finish();
        parent.finish();

        let spans = tracer.finished_spans();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].name, "get");
        assert_eq!(spans[0].parent_span_id, Some(spans[1].span_id));
    }

    #[test]
    fn traced_records_failure_and_returns_error() {
        let tracer = Arc::new(RecordingTracer::new());
        let policy = TracePolicy::new(tracer.clone(), false);

        let result: Result<(), Boom> = policy.traced("get", |_| {}, || Err(Boom));
        assert!(result.is_err());

        let spans = tracer.finished_spans();
        assert_eq!(spans.len(), 1);
        assert!(spans[0].is_error());
        assert_eq!(spans[0].logs.len(), 1);
        let fields = &spans[0].logs[0].fields;
        assert_eq!(fields.get(keys::EVENT), Some(&serde_json::json!("error")));
        assert_eq!(
            fields.get(keys::ERROR_OBJECT),
            Some(&serde_json::json!("boom"))
        );
    }

    #[test]
    fn traced_success_leaves_no_error_mark() {
        let tracer = Arc::new(RecordingTracer::new());
        let policy = TracePolicy::new(tracer.clone(), false);

        let result: Result<u32, Boom> = policy.traced("get", |_| {}, || Ok(7));
        assert_eq!(result.ok(), Some(7));

        let spans = tracer.finished_spans();
        assert_eq!(spans.len(), 1);
        assert!(!spans[0].is_error());
        assert!(spans[0].logs.is_empty());
    }
}
