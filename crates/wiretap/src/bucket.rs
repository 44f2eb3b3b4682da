use std::time::Duration;

use cooper_client::{
    Bucket, ClientError, Document, Durability, PingReport, Query, QueryResult, ReplicaMode,
    ServiceType, ViewQuery, ViewResult,
};

use crate::policy::TracePolicy;
use crate::tags::{display_or_null, join_display, tag_durability, tag_timeout, type_name_of};

/// A [`Bucket`] that traces every operation of the bucket it wraps.
pub struct TracedBucket<B: Bucket> {
    inner: B,
    policy: TracePolicy,
}

impl<B: Bucket> TracedBucket<B> {
    pub(crate) fn with_policy(inner: B, policy: TracePolicy) -> Self {
        Self { inner, policy }
    }

    /// The wrapped bucket handle.
    pub fn inner(&self) -> &B {
        &self.inner
    }

    pub fn into_inner(self) -> B {
        self.inner
    }
}

impl<B: Bucket> Bucket for TracedBucket<B> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    fn get(
        &self,
        id: &str,
        timeout: Option<Duration>,
    ) -> Result<Option<Document>, ClientError> {
        self.policy.traced(
            "get",
            |span| {
                span.set_tag("id", id.into());
                tag_timeout(span, timeout);
            },
            || self.inner.get(id, timeout),
        )
    }

    fn get_from_replica(
        &self,
        id: &str,
        mode: ReplicaMode,
        timeout: Option<Duration>,
    ) -> Result<Vec<Document>, ClientError> {
        self.policy.traced(
            "get_from_replica",
            |span| {
                span.set_tag("id", id.into());
                span.set_tag("mode", mode.to_string().into());
                tag_timeout(span, timeout);
            },
            || self.inner.get_from_replica(id, mode, timeout),
        )
    }

    fn get_and_lock(
        &self,
        id: &str,
        lock_time: Duration,
        timeout: Option<Duration>,
    ) -> Result<Document, ClientError> {
        self.policy.traced(
            "get_and_lock",
            |span| {
                span.set_tag("id", id.into());
                span.set_tag("lock_time_ms", (lock_time.as_millis() as i64).into());
                tag_timeout(span, timeout);
            },
            || self.inner.get_and_lock(id, lock_time, timeout),
        )
    }

    fn get_and_touch(
        &self,
        id: &str,
        expiry: Duration,
        timeout: Option<Duration>,
    ) -> Result<Document, ClientError> {
        self.policy.traced(
            "get_and_touch",
            |span| {
                span.set_tag("id", id.into());
                span.set_tag("expiry_ms", (expiry.as_millis() as i64).into());
                tag_timeout(span, timeout);
            },
            || self.inner.get_and_touch(id, expiry, timeout),
        )
    }

    fn exists(&self, id: &str, timeout: Option<Duration>) -> Result<bool, ClientError> {
        self.policy.traced(
            "exists",
            |span| {
                span.set_tag("id", id.into());
                tag_timeout(span, timeout);
            },
            || self.inner.exists(id, timeout),
        )
    }

    fn insert(
        &self,
        document: Document,
        durability: Durability,
        timeout: Option<Duration>,
    ) -> Result<Document, ClientError> {
        let id = document.id.clone();
        self.policy.traced(
            "insert",
            |span| {
                span.set_tag("id", id.as_str().into());
                tag_durability(span, durability);
                tag_timeout(span, timeout);
            },
            || self.inner.insert(document, durability, timeout),
        )
    }

    fn upsert(
        &self,
        document: Document,
        durability: Durability,
        timeout: Option<Duration>,
    ) -> Result<Document, ClientError> {
        let id = document.id.clone();
        self.policy.traced(
            "upsert",
            |span| {
                span.set_tag("id", id.as_str().into());
                tag_durability(span, durability);
                tag_timeout(span, timeout);
            },
            || self.inner.upsert(document, durability, timeout),
        )
    }

    fn replace(
        &self,
        document: Document,
        durability: Durability,
        timeout: Option<Duration>,
    ) -> Result<Document, ClientError> {
        let id = document.id.clone();
        self.policy.traced(
            "replace",
            |span| {
                span.set_tag("id", id.as_str().into());
                tag_durability(span, durability);
                tag_timeout(span, timeout);
            },
            || self.inner.replace(document, durability, timeout),
        )
    }

    fn remove(
        &self,
        id: &str,
        durability: Durability,
        timeout: Option<Duration>,
    ) -> Result<Document, ClientError> {
        self.policy.traced(
            "remove",
            |span| {
                span.set_tag("id", id.into());
                tag_durability(span, durability);
                tag_timeout(span, timeout);
            },
            || self.inner.remove(id, durability, timeout),
        )
    }

    fn touch(
        &self,
        id: &str,
        expiry: Duration,
        timeout: Option<Duration>,
    ) -> Result<bool, ClientError> {
        self.policy.traced(
            "touch",
            |span| {
                span.set_tag("id", id.into());
                span.set_tag("expiry_ms", (expiry.as_millis() as i64).into());
                tag_timeout(span, timeout);
            },
            || self.inner.touch(id, expiry, timeout),
        )
    }

    fn unlock(&self, id: &str, cas: u64, timeout: Option<Duration>) -> Result<bool, ClientError> {
        self.policy.traced(
            "unlock",
            |span| {
                span.set_tag("id", id.into());
                span.set_tag("cas", cas.into());
                tag_timeout(span, timeout);
            },
            || self.inner.unlock(id, cas, timeout),
        )
    }

    fn counter(
        &self,
        id: &str,
        delta: i64,
        initial: Option<i64>,
        durability: Durability,
        timeout: Option<Duration>,
    ) -> Result<i64, ClientError> {
        self.policy.traced(
            "counter",
            |span| {
                span.set_tag("id", id.into());
                span.set_tag("delta", delta.into());
                span.set_tag("initial", display_or_null(initial.as_ref()).into());
                tag_durability(span, durability);
                tag_timeout(span, timeout);
            },
            || self.inner.counter(id, delta, initial, durability, timeout),
        )
    }

    fn append(
        &self,
        document: Document,
        durability: Durability,
        timeout: Option<Duration>,
    ) -> Result<Document, ClientError> {
        let id = document.id.clone();
        self.policy.traced(
            "append",
            |span| {
                span.set_tag("id", id.as_str().into());
                tag_durability(span, durability);
                tag_timeout(span, timeout);
            },
            || self.inner.append(document, durability, timeout),
        )
    }

    fn prepend(
        &self,
        document: Document,
        durability: Durability,
        timeout: Option<Duration>,
    ) -> Result<Document, ClientError> {
        let id = document.id.clone();
        self.policy.traced(
            "prepend",
            |span| {
                span.set_tag("id", id.as_str().into());
                tag_durability(span, durability);
                tag_timeout(span, timeout);
            },
            || self.inner.prepend(document, durability, timeout),
        )
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

    fn view_query(
        &self,
        query: &ViewQuery,
        timeout: Option<Duration>,
    ) -> Result<ViewResult, ClientError> {
        self.policy.traced(
            "view_query",
            |span| {
                span.set_tag("query", type_name_of(query).into());
                span.set_tag("design_doc", query.design_doc.as_str().into());
                span.set_tag("view", query.view.as_str().into());
                tag_timeout(span, timeout);
            },
            || self.inner.view_query(query, timeout),
        )
    }

    fn list_get(
        &self,
        id: &str,
        index: usize,
        timeout: Option<Duration>,
    ) -> Result<serde_json::Value, ClientError> {
        self.policy.traced(
            "list_get",
            |span| {
                span.set_tag("id", id.into());
                span.set_tag("index", index.into());
                tag_timeout(span, timeout);
            },
            || self.inner.list_get(id, index, timeout),
        )
    }

    fn list_append(
        &self,
        id: &str,
        element: serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<bool, ClientError> {
        self.policy.traced(
            "list_append",
            |span| {
                span.set_tag("id", id.into());
                tag_timeout(span, timeout);
            },
            || self.inner.list_append(id, element, timeout),
        )
    }

    fn list_prepend(
        &self,
        id: &str,
        element: serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<bool, ClientError> {
        self.policy.traced(
            "list_prepend",
            |span| {
                span.set_tag("id", id.into());
                tag_timeout(span, timeout);
            },
            || self.inner.list_prepend(id, element, timeout),
        )
    }

    fn list_set(
        &self,
        id: &str,
        index: usize,
        element: serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<bool, ClientError> {
        self.policy.traced(
            "list_set",
            |span| {
                span.set_tag("id", id.into());
                span.set_tag("index", index.into());
                tag_timeout(span, timeout);
            },
            || self.inner.list_set(id, index, element, timeout),
        )
    }

    fn list_remove(
        &self,
        id: &str,
        index: usize,
        timeout: Option<Duration>,
    ) -> Result<bool, ClientError> {
        self.policy.traced(
            "list_remove",
            |span| {
                span.set_tag("id", id.into());
                span.set_tag("index", index.into());
                tag_timeout(span, timeout);
            },
            || self.inner.list_remove(id, index, timeout),
        )
    }

    fn list_size(&self, id: &str, timeout: Option<Duration>) -> Result<usize, ClientError> {
        self.policy.traced(
            "list_size",
            |span| {
                span.set_tag("id", id.into());
                tag_timeout(span, timeout);
            },
            || self.inner.list_size(id, timeout),
        )
    }

    fn map_add(
        &self,
        id: &str,
        key: &str,
        value: serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<bool, ClientError> {
        self.policy.traced(
            "map_add",
            |span| {
                span.set_tag("id", id.into());
                span.set_tag("key", key.into());
                tag_timeout(span, timeout);
            },
            || self.inner.map_add(id, key, value, timeout),
        )
    }

    fn map_get(
        &self,
        id: &str,
        key: &str,
        timeout: Option<Duration>,
    ) -> Result<serde_json::Value, ClientError> {
        self.policy.traced(
            "map_get",
            |span| {
                span.set_tag("id", id.into());
                span.set_tag("key", key.into());
                tag_timeout(span, timeout);
            },
            || self.inner.map_get(id, key, timeout),
        )
    }

    fn map_remove(
        &self,
        id: &str,
        key: &str,
        timeout: Option<Duration>,
    ) -> Result<bool, ClientError> {
        self.policy.traced(
            "map_remove",
            |span| {
                span.set_tag("id", id.into());
                span.set_tag("key", key.into());
                tag_timeout(span, timeout);
            },
            || self.inner.map_remove(id, key, timeout),
        )
    }

    fn map_size(&self, id: &str, timeout: Option<Duration>) -> Result<usize, ClientError> {
        self.policy.traced(
            "map_size",
            |span| {
                span.set_tag("id", id.into());
                tag_timeout(span, timeout);
            },
            || self.inner.map_size(id, timeout),
        )
    }

    fn set_add(
        &self,
        id: &str,
        value: serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<bool, ClientError> {
        self.policy.traced(
            "set_add",
            |span| {
                span.set_tag("id", id.into());
                tag_timeout(span, timeout);
            },
            || self.inner.set_add(id, value, timeout),
        )
    }

    fn set_contains(
        &self,
        id: &str,
        value: serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<bool, ClientError> {
        self.policy.traced(
            "set_contains",
            |span| {
                span.set_tag("id", id.into());
                tag_timeout(span, timeout);
            },
            || self.inner.set_contains(id, value, timeout),
        )
    }

    fn set_remove(
        &self,
        id: &str,
        value: serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<bool, ClientError> {
        self.policy.traced(
            "set_remove",
            |span| {
                span.set_tag("id", id.into());
                tag_timeout(span, timeout);
            },
            || self.inner.set_remove(id, value, timeout),
        )
    }

    fn set_size(&self, id: &str, timeout: Option<Duration>) -> Result<usize, ClientError> {
        self.policy.traced(
            "set_size",
            |span| {
                span.set_tag("id", id.into());
                tag_timeout(span, timeout);
            },
            || self.inner.set_size(id, timeout),
        )
    }

    fn queue_push(
        &self,
        id: &str,
        element: serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<bool, ClientError> {
        self.policy.traced(
            "queue_push",
            |span| {
                span.set_tag("id", id.into());
                tag_timeout(span, timeout);
            },
            || self.inner.queue_push(id, element, timeout),
        )
    }

    fn queue_pop(
        &self,
        id: &str,
        timeout: Option<Duration>,
    ) -> Result<Option<serde_json::Value>, ClientError> {
        self.policy.traced(
            "queue_pop",
            |span| {
                span.set_tag("id", id.into());
                tag_timeout(span, timeout);
            },
            || self.inner.queue_pop(id, timeout),
        )
    }

    fn queue_size(&self, id: &str, timeout: Option<Duration>) -> Result<usize, ClientError> {
        self.policy.traced(
            "queue_size",
            |span| {
                span.set_tag("id", id.into());
                tag_timeout(span, timeout);
            },
            || self.inner.queue_size(id, timeout),
        )
    }

    fn ping(
        &self,
        report_id: Option<&str>,
        services: &[ServiceType],
    ) -> Result<PingReport, ClientError> {
        self.policy.traced(
            "ping",
            |span| {
                span.set_tag("report_id", display_or_null(report_id.as_ref()).into());
                span.set_tag("services", join_display(services).into());
            },
            || self.inner.ping(report_id, services),
        )
    }

    fn invalidate_query_cache(&self) -> Result<usize, ClientError> {
        self.policy.traced(
            "invalidate_query_cache",
            |_span| {},
            || self.inner.invalidate_query_cache(),
        )
    }

    fn close(&self, timeout: Option<Duration>) -> Result<bool, ClientError> {
        self.policy.traced(
            "close",
            |span| tag_timeout(span, timeout),
            || self.inner.close(timeout),
        )
    }
}
