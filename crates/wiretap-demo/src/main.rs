use clap::Parser;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use cooper_client::{
    Bucket, BucketSettings, Cluster, ClusterManager, Document, Durability, MemoryCluster, Query,
    ServiceType, ViewQuery,
};
use wiretap::TracedCluster;
use wiretap_trace::{RecordingTracer, SpanBuilder, SpanRecord, TagValue, Tracer};

#[derive(Parser)]
#[command(name = "wiretap-demo")]
#[command(about = "Run a sample workload against an instrumented in-memory cluster", long_about = None)]
struct Cli {
    /// Only trace operations that happen inside an active span
    #[arg(long)]
    active_span_only: bool,

    /// Wrap the workload in an ambient root span
    #[arg(long)]
    root_span: bool,

    /// Bucket name for the workload
    #[arg(long, default_value = "demo")]
    bucket: String,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let tracer = Arc::new(RecordingTracer::new());
    let cluster = TracedCluster::new(MemoryCluster::new(), tracer.clone(), cli.active_span_only);

    let root = cli
        .root_span
        .then(|| tracer.start_span(SpanBuilder::new("workload")));
    run_workload(&cluster, &cli.bucket)?;
    if let Some(mut root) = root {
        root.finish();
    }

    dump(&tracer, cli.pretty)
}

fn run_workload(cluster: &TracedCluster<MemoryCluster>, bucket_name: &str) -> anyhow::Result<()> {
    let cluster = cluster.authenticate("admin", "wiretap")?;
    let manager = cluster.cluster_manager("admin", "wiretap")?;
    manager.insert_bucket(&BucketSettings::new(bucket_name).quota_mb(128), None)?;

    let bucket = cluster.open_bucket(bucket_name, Some(Duration::from_secs(2)))?;

    bucket.upsert(
        Document::new("route:1", json!({"from": "LHR", "to": "CDG", "stops": 0})),
        Durability::NONE,
        None,
    )?;
    bucket.get("route:1", None)?;
    bucket.counter("visits", 1, Some(0), Durability::NONE, None)?;
    bucket.list_append("recent", json!("route:1"), None)?;
    bucket.queue_push("jobs", json!({"kind": "reindex"}), None)?;
    bucket.queue_pop("jobs", None)?;
    bucket.query(&Query::simple("SELECT * FROM demo"), None)?;
    bucket.view_query(&ViewQuery::new("routes", "by_id").limit(10), None)?;
    bucket.ping(None, &[ServiceType::KeyValue, ServiceType::Query])?;

    // One deliberate failure, so the dump shows error recording.
    if let Err(error) = bucket.insert(
        Document::new("route:1", json!({})),
        Durability::NONE,
        None,
    ) {
        tracing::info!(%error, "expected failure recorded on its span");
    }

    bucket.close(None)?;
    cluster.disconnect(None)?;
    Ok(())
}

fn dump(tracer: &RecordingTracer, pretty: bool) -> anyhow::Result<()> {
    let spans = tracer.finished_spans();
    let errors = spans.iter().filter(|span| span.is_error()).count();

    let doc = json!({
        "total": spans.len(),
        "errors": errors,
        "spans": spans.iter().map(render_span).collect::<Vec<_>>(),
    });

    let out = if pretty {
        serde_json::to_string_pretty(&doc)?
    } else {
        serde_json::to_string(&doc)?
    };
    println!("{out}");
    Ok(())
}

fn render_span(span: &SpanRecord) -> serde_json::Value {
    let tags: Vec<serde_json::Value> = span
        .tags
        .iter()
        .map(|(key, value)| {
            json!({
                "key": key,
                "value": tag_value_json(value),
            })
        })
        .collect();

    json!({
        "trace_id": span.trace_id.to_hex(),
        "span_id": span.span_id.to_hex(),
        "parent_span_id": span.parent_span_id.map(|id| id.to_hex()),
        "name": span.name,
        "start_time_nanos": span.start_time.0,
        "duration_nanos": span.duration_nanos(),
        "tags": tags,
        "logs": span
            .logs
            .iter()
            .map(|log| json!({"timestamp_nanos": log.timestamp.0, "fields": log.fields}))
            .collect::<Vec<_>>(),
    })
}

fn tag_value_json(value: &TagValue) -> serde_json::Value {
    match value {
        TagValue::String(text) => json!(text),
        TagValue::Int(number) => json!(number),
        TagValue::Float(number) => json!(number),
        TagValue::Bool(flag) => json!(flag),
    }
}
