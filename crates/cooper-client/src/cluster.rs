use std::time::Duration;

use crate::bucket::Bucket;
use crate::error::ClientError;
use crate::manager::ClusterManager;
use crate::query::{Query, QueryResult};
use crate::types::DiagnosticsReport;

/// Top-level handle to a Cooper cluster.
///
/// Everything here is synchronous: a call blocks until the engine answers
/// or fails. Timeouts are forwarded to the engine, which decides whether
/// and how to enforce them.
pub trait Cluster {
    type Bucket: Bucket;
    type Manager: ClusterManager;

    /// Open a bucket by name.
    fn open_bucket(
        &self,
        name: &str,
        timeout: Option<Duration>,
    ) -> Result<Self::Bucket, ClientError>;

    /// Open a password-protected bucket.
    fn open_bucket_with_credentials(
        &self,
        name: &str,
        password: &str,
        timeout: Option<Duration>,
    ) -> Result<Self::Bucket, ClientError>;

    /// Run a statement query at cluster scope.
    fn query(&self, query: &Query, timeout: Option<Duration>) -> Result<QueryResult, ClientError>;

    /// Obtain the management handle for this cluster.
    fn cluster_manager(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Self::Manager, ClientError>;

    /// Re-authenticate, producing a new handle over the same cluster.
    fn authenticate(&self, username: &str, password: &str) -> Result<Self, ClientError>
    where
        Self: Sized;

    /// Passive health snapshot of every known endpoint.
    fn diagnostics(&self, report_id: Option<&str>) -> Result<DiagnosticsReport, ClientError>;

    /// Shut the connection down. Returns `false` if it was already down.
    fn disconnect(&self, timeout: Option<Duration>) -> Result<bool, ClientError>;
}
