use std::time::Duration;

use crate::error::ClientError;
use crate::query::{Query, QueryResult, ViewQuery, ViewResult};
use crate::types::{Document, Durability, PingReport, ReplicaMode, ServiceType};

/// A bucket of JSON documents: KV access, queries, data-structure
/// operations, and health checks.
///
/// Mutations take a [`Durability`] requirement (forwarded opaquely) and an
/// optional timeout. A document's `cas` of `0` means "no expectation";
/// engines reject mismatched non-zero CAS values with
/// [`ClientError::CasMismatch`].
pub trait Bucket {
    /// The bucket's configured name. Pure accessor, no I/O.
    fn name(&self) -> &str;

    /// Whether this handle has been closed. Pure accessor, no I/O.
    fn is_closed(&self) -> bool;

    fn get(&self, id: &str, timeout: Option<Duration>)
        -> Result<Option<Document>, ClientError>;

    /// Read from replica copies instead of the active node.
    fn get_from_replica(
        &self,
        id: &str,
        mode: ReplicaMode,
        timeout: Option<Duration>,
    ) -> Result<Vec<Document>, ClientError>;

    /// Fetch and write-lock a document for `lock_time`.
    fn get_and_lock(
        &self,
        id: &str,
        lock_time: Duration,
        timeout: Option<Duration>,
    ) -> Result<Document, ClientError>;

    /// Fetch a document and reset its expiry in one round trip.
    fn get_and_touch(
        &self,
        id: &str,
        expiry: Duration,
        timeout: Option<Duration>,
    ) -> Result<Document, ClientError>;

    fn exists(&self, id: &str, timeout: Option<Duration>) -> Result<bool, ClientError>;

    /// Store a new document. Fails if the id is already taken.
    fn insert(
        &self,
        document: Document,
        durability: Durability,
        timeout: Option<Duration>,
    ) -> Result<Document, ClientError>;

    /// Store a document, creating or overwriting.
    fn upsert(
        &self,
        document: Document,
        durability: Durability,
        timeout: Option<Duration>,
    ) -> Result<Document, ClientError>;

    /// Overwrite an existing document, honoring its CAS expectation.
    fn replace(
        &self,
        document: Document,
        durability: Durability,
        timeout: Option<Duration>,
    ) -> Result<Document, ClientError>;

    /// Delete a document, returning its last stored state.
    fn remove(
        &self,
        id: &str,
        durability: Durability,
        timeout: Option<Duration>,
    ) -> Result<Document, ClientError>;

    /// Reset a document's expiry.
    fn touch(
        &self,
        id: &str,
        expiry: Duration,
        timeout: Option<Duration>,
    ) -> Result<bool, ClientError>;

    /// Release a write lock taken by [`Bucket::get_and_lock`].
    fn unlock(&self, id: &str, cas: u64, timeout: Option<Duration>) -> Result<bool, ClientError>;

    /// Atomically add `delta` to an integer document, seeding it with
    /// `initial` when absent (if given). Returns the new value.
    fn counter(
        &self,
        id: &str,
        delta: i64,
        initial: Option<i64>,
        durability: Durability,
        timeout: Option<Duration>,
    ) -> Result<i64, ClientError>;

    /// Append to a string document's content.
    fn append(
        &self,
        document: Document,
        durability: Durability,
        timeout: Option<Duration>,
    ) -> Result<Document, ClientError>;

    /// Prepend to a string document's content.
    fn prepend(
        &self,
        document: Document,
        durability: Durability,
        timeout: Option<Duration>,
    ) -> Result<Document, ClientError>;

    /// Run a statement query scoped to this bucket.
    fn query(&self, query: &Query, timeout: Option<Duration>) -> Result<QueryResult, ClientError>;

    /// Run a view query against this bucket.
    fn view_query(
        &self,
        query: &ViewQuery,
        timeout: Option<Duration>,
    ) -> Result<ViewResult, ClientError>;

    // List documents (JSON arrays).

    fn list_get(
        &self,
        id: &str,
        index: usize,
        timeout: Option<Duration>,
    ) -> Result<serde_json::Value, ClientError>;

    fn list_append(
        &self,
        id: &str,
        element: serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<bool, ClientError>;

    fn list_prepend(
        &self,
        id: &str,
        element: serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<bool, ClientError>;

    fn list_set(
        &self,
        id: &str,
        index: usize,
        element: serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<bool, ClientError>;

    fn list_remove(
        &self,
        id: &str,
        index: usize,
        timeout: Option<Duration>,
    ) -> Result<bool, ClientError>;

    fn list_size(&self, id: &str, timeout: Option<Duration>) -> Result<usize, ClientError>;

    // Map documents (JSON objects).

    fn map_add(
        &self,
        id: &str,
        key: &str,
        value: serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<bool, ClientError>;

    fn map_get(
        &self,
        id: &str,
        key: &str,
        timeout: Option<Duration>,
    ) -> Result<serde_json::Value, ClientError>;

    fn map_remove(
        &self,
        id: &str,
        key: &str,
        timeout: Option<Duration>,
    ) -> Result<bool, ClientError>;

    fn map_size(&self, id: &str, timeout: Option<Duration>) -> Result<usize, ClientError>;

    // Set documents (JSON arrays with unique elements).

    fn set_add(
        &self,
        id: &str,
        value: serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<bool, ClientError>;

    fn set_contains(
        &self,
        id: &str,
        value: serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<bool, ClientError>;

    fn set_remove(
        &self,
        id: &str,
        value: serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<bool, ClientError>;

    fn set_size(&self, id: &str, timeout: Option<Duration>) -> Result<usize, ClientError>;

    // Queue documents (JSON arrays, FIFO).

    fn queue_push(
        &self,
        id: &str,
        element: serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<bool, ClientError>;

    fn queue_pop(
        &self,
        id: &str,
        timeout: Option<Duration>,
    ) -> Result<Option<serde_json::Value>, ClientError>;

    fn queue_size(&self, id: &str, timeout: Option<Duration>) -> Result<usize, ClientError>;

    /// Actively probe the given services (all of them when empty).
    fn ping(
        &self,
        report_id: Option<&str>,
        services: &[ServiceType],
    ) -> Result<PingReport, ClientError>;

    /// Drop any prepared-statement cache. Returns how many entries went.
    fn invalidate_query_cache(&self) -> Result<usize, ClientError>;

    /// Close this handle. Returns `false` if it was already closed.
    fn close(&self, timeout: Option<Duration>) -> Result<bool, ClientError>;
}
