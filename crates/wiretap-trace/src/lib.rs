//! Span model and tracer abstraction for wiretap.
//!
//! This crate defines what a span *is* (ids, tags, log records) and the two
//! capabilities an instrumentation layer needs from a tracing backend:
//! starting a span and answering whether one is active in the calling
//! context. The backend itself is supplied by the embedding application;
//! [`RecordingTracer`] is an in-memory implementation for tests and local
//! inspection.
//!
//! # Example
//!
//! ```
//! use wiretap_trace::{RecordingTracer, SpanBuilder, Tracer};
//!
//! let tracer = RecordingTracer::new();
//! let mut span = tracer.start_span(SpanBuilder::new("fetch").with_tag("id", "u:42"));
//! // Do work...
//! span.finish();
//!
//! assert_eq!(tracer.finished_spans().len(), 1);
//! ```

mod ids;
mod recording;
mod span;
mod tracer;

pub use ids::{ParseIdError, SpanId, TraceId};
pub use recording::RecordingTracer;
pub use span::{keys, LogRecord, SpanRecord, TagValue, Timestamp};
pub use tracer::{NoopSpan, Span, SpanBuilder, Tracer};
