use std::time::Duration;

use crate::error::ClientError;
use crate::types::{AuthDomain, BucketSettings, ClusterInfo, User, UserSettings};

/// Administrative surface of a cluster: bucket provisioning and user
/// management.
pub trait ClusterManager {
    fn info(&self, timeout: Option<Duration>) -> Result<ClusterInfo, ClientError>;

    fn get_buckets(&self, timeout: Option<Duration>) -> Result<Vec<BucketSettings>, ClientError>;

    fn get_bucket(
        &self,
        name: &str,
        timeout: Option<Duration>,
    ) -> Result<Option<BucketSettings>, ClientError>;

    fn has_bucket(&self, name: &str, timeout: Option<Duration>) -> Result<bool, ClientError>;

    /// Provision a new bucket. Fails if one of that name already exists.
    fn insert_bucket(
        &self,
        settings: &BucketSettings,
        timeout: Option<Duration>,
    ) -> Result<BucketSettings, ClientError>;

    /// Reconfigure an existing bucket.
    fn update_bucket(
        &self,
        settings: &BucketSettings,
        timeout: Option<Duration>,
    ) -> Result<BucketSettings, ClientError>;

    /// Drop a bucket. Returns `false` if no such bucket existed.
    fn remove_bucket(&self, name: &str, timeout: Option<Duration>) -> Result<bool, ClientError>;

    /// Create or replace a user definition.
    fn upsert_user(
        &self,
        domain: AuthDomain,
        username: &str,
        settings: &UserSettings,
        timeout: Option<Duration>,
    ) -> Result<bool, ClientError>;

    /// Delete a user. Returns `false` if no such user existed.
    fn remove_user(
        &self,
        domain: AuthDomain,
        username: &str,
        timeout: Option<Duration>,
    ) -> Result<bool, ClientError>;

    fn get_users(
        &self,
        domain: AuthDomain,
        timeout: Option<Duration>,
    ) -> Result<Vec<User>, ClientError>;

    fn get_user(
        &self,
        domain: AuthDomain,
        user_id: &str,
        timeout: Option<Duration>,
    ) -> Result<Option<User>, ClientError>;
}
