use std::sync::Arc;
use std::time::Duration;

use cooper_client::{ClientError, Cluster, DiagnosticsReport, Query, QueryResult};
use wiretap_trace::Tracer;

use crate::bucket::TracedBucket;
use crate::manager::TracedManager;
use crate::policy::TracePolicy;
use crate::tags::{display_or_null, tag_timeout, type_name_of};

/// A [`Cluster`] that traces every operation of the cluster it wraps.
///
/// Bucket and management handles obtained through this wrapper come back
/// wrapped themselves, carrying the same tracer and gating flag, so one
/// construction at the top of the object graph instruments the whole
/// session.
pub struct TracedCluster<C: Cluster> {
    inner: C,
    policy: TracePolicy,
}

impl<C: Cluster> TracedCluster<C> {
    pub fn new(inner: C, tracer: Arc<dyn Tracer>, active_span_only: bool) -> Self {
        Self {
            inner,
            policy: TracePolicy::new(tracer, active_span_only),
        }
    }

    pub(crate) fn with_policy(inner: C, policy: TracePolicy) -> Self {
        Self { inner, policy }
    }

    /// The wrapped cluster handle.
    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn into_inner(self) -> C {
        self.inner
    }
}

impl<C: Cluster> Cluster for TracedCluster<C> {
    type Bucket = TracedBucket<C::Bucket>;
    type Manager = TracedManager<C::Manager>;

    fn open_bucket(
        &self,
        name: &str,
        timeout: Option<Duration>,
    ) -> Result<Self::Bucket, ClientError> {
        self.policy
            .traced(
                "open_bucket",
                |span| {
                    span.set_tag("name", name.into());
                    tag_timeout(span, timeout);
                },
                || self.inner.open_bucket(name, timeout),
            )
            .map(|bucket| TracedBucket::with_policy(bucket, self.policy.clone()))
    }

    fn open_bucket_with_credentials(
        &self,
        name: &str,
        password: &str,
        timeout: Option<Duration>,
    ) -> Result<Self::Bucket, ClientError> {
        // Same operation as `open_bucket`; the password is never tagged.
        self.policy
            .traced(
                "open_bucket",
                |span| {
                    span.set_tag("name", name.into());
                    tag_timeout(span, timeout);
                },
                || self.inner.open_bucket_with_credentials(name, password, timeout),
            )
            .map(|bucket| TracedBucket::with_policy(bucket, self.policy.clone()))
    }

    fn query(&self, query: &Query, timeout: Option<Duration>) -> Result<QueryResult, ClientError> {
        self.policy.traced(
            "query",
            |span| {
                span.set_tag("query", type_name_of(query).into());
                tag_timeout(span, timeout);
            },
            || self.inner.query(query, timeout),
        )
    }

    fn cluster_manager(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Self::Manager, ClientError> {
        self.inner
            .cluster_manager(username, password)
            .map(|manager| TracedManager::with_policy(manager, self.policy.clone()))
    }

    fn authenticate(&self, username: &str, password: &str) -> Result<Self, ClientError> {
        // A new top-level handle over the same connection policy: wrap it
        // afresh with the same tracer and gating flag.
        self.inner
            .authenticate(username, password)
            .map(|cluster| Self::with_policy(cluster, self.policy.clone()))
    }

    fn diagnostics(&self, report_id: Option<&str>) -> Result<DiagnosticsReport, ClientError> {
        self.policy.traced(
            "diagnostics",
            |span| span.set_tag("report_id", display_or_null(report_id.as_ref()).into()),
            || self.inner.diagnostics(report_id),
        )
    }

    fn disconnect(&self, timeout: Option<Duration>) -> Result<bool, ClientError> {
        self.policy.traced(
            "disconnect",
            |span| tag_timeout(span, timeout),
            || self.inner.disconnect(timeout),
        )
    }
}
