//! Transparent tracing instrumentation for Cooper cluster clients.
//!
//! Wrap a cluster handle once and every operation reaching the engine —
//! through the cluster itself, through buckets opened from it, through the
//! management handle — produces exactly one finished span: named after the
//! operation, tagged with the call's diagnostic arguments, error-tagged
//! and log-annotated when the call failed. Return values and errors pass
//! through untouched; the wrapper adds no behavior of its own.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use cooper_client::{Bucket, Cluster, Document, Durability, MemoryCluster};
//! use serde_json::json;
//! use wiretap::TracedCluster;
//! use wiretap_trace::RecordingTracer;
//!
//! let tracer = Arc::new(RecordingTracer::new());
//! let cluster = TracedCluster::new(MemoryCluster::new(), tracer.clone(), false);
//!
//! let bucket = cluster.open_bucket("travel", None)?;
//! bucket.upsert(Document::new("route:1", json!({"to": "CDG"})), Durability::NONE, None)?;
//!
//! let spans = tracer.finished_spans();
//! assert_eq!(spans.len(), 2);
//! assert_eq!(spans[0].name, "open_bucket");
//! assert_eq!(spans[1].name, "upsert");
//! # Ok::<(), cooper_client::ClientError>(())
//! ```
//!
//! When constructed with `active_span_only = true`, operations invoked
//! outside any active span run untraced — nothing reaches the tracer at
//! all — while the call sites stay identical.

mod bucket;
mod cluster;
mod manager;
mod policy;
pub mod tags;

pub use bucket::TracedBucket;
pub use cluster::TracedCluster;
pub use manager::TracedManager;
pub use policy::{record_failure, TracePolicy, COMPONENT_NAME, DB_TYPE};
