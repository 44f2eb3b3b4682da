use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use crate::ids::{SpanId, TraceId};
use crate::span::{LogRecord, SpanRecord, TagValue, Timestamp};
use crate::tracer::{Span, SpanBuilder, Tracer};

#[derive(Clone, Copy)]
struct ActiveFrame {
    trace_id: TraceId,
    span_id: SpanId,
}

#[derive(Default)]
struct RecorderShared {
    /// Finished spans in finish order.
    finished: Mutex<Vec<SpanRecord>>,
    /// Active-span stack per thread. A started span is active on the
    /// starting thread until it finishes.
    active: Mutex<HashMap<ThreadId, Vec<ActiveFrame>>>,
}

impl RecorderShared {
    fn deactivate(&self, span_id: SpanId) {
        let mut active = self.active.lock();
        for stack in active.values_mut() {
            if let Some(pos) = stack.iter().rposition(|frame| frame.span_id == span_id) {
                stack.remove(pos);
                break;
            }
        }
        active.retain(|_, stack| !stack.is_empty());
    }
}

/// An in-memory [`Tracer`] that keeps every finished span for inspection.
///
/// Spans started while another span is active on the same thread become its
/// children and share its trace id; spans started on an idle thread become
/// new roots. Clones share the same storage.
///
/// This is the backend the test suites and the demo binary run against; it
/// is also handy as a scratch tracer when debugging an integration.
#[derive(Clone, Default)]
pub struct RecordingTracer {
    shared: Arc<RecorderShared>,
}

impl RecordingTracer {
    pub fn new() -> Self {
        Self::default()
    }

    /// All finished spans, in finish order.
    pub fn finished_spans(&self) -> Vec<SpanRecord> {
        self.shared.finished.lock().clone()
    }

    /// Drop every finished span.
    pub fn reset(&self) {
        self.shared.finished.lock().clear();
    }

    /// The span currently active on the calling thread, if any.
    pub fn active_span_id(&self) -> Option<SpanId> {
        let active = self.shared.active.lock();
        active
            .get(&thread::current().id())
            .and_then(|stack| stack.last())
            .map(|frame| frame.span_id)
    }
}

impl Tracer for RecordingTracer {
    fn start_span(&self, builder: SpanBuilder) -> Box<dyn Span> {
        let mut active = self.shared.active.lock();
        let stack = active.entry(thread::current().id()).or_default();

        let (trace_id, parent_span_id) = match stack.last() {
            Some(parent) => (parent.trace_id, Some(parent.span_id)),
            None => (TraceId::generate(), None),
        };
        let span_id = SpanId::generate();
        stack.push(ActiveFrame { trace_id, span_id });
        drop(active);

        Box::new(RecordingSpan {
            shared: self.shared.clone(),
            record: Some(SpanRecord {
                trace_id,
                span_id,
                parent_span_id,
                name: builder.name,
                start_time: Timestamp::now(),
                end_time: None,
                tags: builder.tags,
                logs: Vec::new(),
            }),
        })
    }

    fn has_active_span(&self) -> bool {
        let active = self.shared.active.lock();
        active
            .get(&thread::current().id())
            .is_some_and(|stack| !stack.is_empty())
    }
}

struct RecordingSpan {
    shared: Arc<RecorderShared>,
    /// `None` once finished.
    record: Option<SpanRecord>,
}

impl Span for RecordingSpan {
    fn set_tag(&mut self, key: &str, value: TagValue) {
        if let Some(record) = self.record.as_mut() {
            record.tags.insert(key.to_owned(), value);
        }
    }

    fn log(&mut self, fields: BTreeMap<String, serde_json::Value>) {
        if let Some(record) = self.record.as_mut() {
            record.logs.push(LogRecord::new(fields));
        }
    }

    fn finish(&mut self) {
        let Some(mut record) = self.record.take() else {
            tracing::warn!("span finished twice; second finish ignored");
            return;
        };
        record.end_time = Some(Timestamp::now());
        self.shared.deactivate(record.span_id);
        self.shared.finished.lock().push(record);
    }
}

impl Drop for RecordingSpan {
    fn drop(&mut self) {
        if let Some(record) = self.record.take() {
            tracing::warn!(span = %record.name, "span dropped without finish");
            self.shared.deactivate(record.span_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn root_span_has_no_parent() {
        let tracer = RecordingTracer::new();
        let mut span = tracer.start_span(SpanBuilder::new("root"));
        span.finish();

        let spans = tracer.finished_spans();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].name, "root");
        assert_eq!(spans[0].parent_span_id, None);
        assert!(spans[0].end_time.is_some());
    }

    #[test]
    fn nested_span_inherits_trace_and_parent() {
        let tracer = RecordingTracer::new();
        let mut parent = tracer.start_span(SpanBuilder::new("parent"));
        let mut child = tracer.start_span(SpanBuilder::new("child"));
        child.finish();
        parent.finish();

        let spans = tracer.finished_spans();
        assert_eq!(spans.len(), 2);
        let (child, parent) = (&spans[0], &spans[1]);
        assert_eq!(child.trace_id, parent.trace_id);
        assert_eq!(child.parent_span_id, Some(parent.span_id));
        assert_eq!(parent.parent_span_id, None);
        assert!(!tracer.has_active_span());
    }

    #[test]
    fn activity_is_per_thread() {
        let tracer = RecordingTracer::new();
        let mut span = tracer.start_span(SpanBuilder::new("main-thread"));
        assert!(tracer.has_active_span());

        let remote = tracer.clone();
        let seen_on_other_thread = thread::spawn(move || remote.has_active_span())
            .join()
            .unwrap();
        assert!(!seen_on_other_thread);

        span.finish();
        assert!(!tracer.has_active_span());
    }

    #[test]
    fn double_finish_records_once() {
        let tracer = RecordingTracer::new();
        let mut span = tracer.start_span(SpanBuilder::new("once"));
        span.finish();
        span.finish();
        assert_eq!(tracer.finished_spans().len(), 1);
    }

    #[test]
    fn dropped_unfinished_span_is_not_recorded() {
        let tracer = RecordingTracer::new();
        {
            let _span = tracer.start_span(SpanBuilder::new("lost"));
        }
        assert!(tracer.finished_spans().is_empty());
        assert!(!tracer.has_active_span());
    }

    #[test]
    fn tags_after_finish_are_dropped() {
        let tracer = RecordingTracer::new();
        let mut span = tracer.start_span(SpanBuilder::new("op").with_tag("id", "u:1"));
        span.finish();
        span.set_tag("late", TagValue::Bool(true));

        let spans = tracer.finished_spans();
        assert_eq!(spans[0].tags.len(), 1);
        assert_eq!(spans[0].tag("id"), Some(&TagValue::String("u:1".into())));
    }

    #[test]
    fn reset_clears_finished_spans() {
        let tracer = RecordingTracer::new();
        tracer.start_span(SpanBuilder::new("op")).finish();
        assert_eq!(tracer.finished_spans().len(), 1);
        tracer.reset();
        assert!(tracer.finished_spans().is_empty());
    }
}
