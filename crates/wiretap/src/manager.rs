use std::time::Duration;

use cooper_client::{
    AuthDomain, BucketSettings, ClientError, ClusterInfo, ClusterManager, User, UserSettings,
};

use crate::policy::TracePolicy;
use crate::tags::tag_timeout;

/// A [`ClusterManager`] that traces every operation of the manager it
/// wraps. User settings are never tagged; they can carry passwords.
pub struct TracedManager<M: ClusterManager> {
    inner: M,
    policy: TracePolicy,
}

impl<M: ClusterManager> TracedManager<M> {
    pub(crate) fn with_policy(inner: M, policy: TracePolicy) -> Self {
        Self { inner, policy }
    }

    /// The wrapped management handle.
    pub fn inner(&self) -> &M {
        &self.inner
    }

    pub fn into_inner(self) -> M {
        self.inner
    }
}

impl<M: ClusterManager> ClusterManager for TracedManager<M> {
    fn info(&self, timeout: Option<Duration>) -> Result<ClusterInfo, ClientError> {
        self.policy.traced(
            "info",
            |span| tag_timeout(span, timeout),
            || self.inner.info(timeout),
        )
    }

    fn get_buckets(&self, timeout: Option<Duration>) -> Result<Vec<BucketSettings>, ClientError> {
        self.policy.traced(
            "get_buckets",
            |span| tag_timeout(span, timeout),
            || self.inner.get_buckets(timeout),
        )
    }

    fn get_bucket(
        &self,
        name: &str,
        timeout: Option<Duration>,
    ) -> Result<Option<BucketSettings>, ClientError> {
        self.policy.traced(
            "get_bucket",
            |span| {
                span.set_tag("name", name.into());
                tag_timeout(span, timeout);
            },
            || self.inner.get_bucket(name, timeout),
        )
    }

    fn has_bucket(&self, name: &str, timeout: Option<Duration>) -> Result<bool, ClientError> {
        self.policy.traced(
            "has_bucket",
            |span| {
                span.set_tag("name", name.into());
                tag_timeout(span, timeout);
            },
            || self.inner.has_bucket(name, timeout),
        )
    }

    fn insert_bucket(
        &self,
        settings: &BucketSettings,
        timeout: Option<Duration>,
    ) -> Result<BucketSettings, ClientError> {
        self.policy.traced(
            "insert_bucket",
            |span| {
                span.set_tag("settings", settings.to_string().into());
                tag_timeout(span, timeout);
            },
            || self.inner.insert_bucket(settings, timeout),
        )
    }

    fn update_bucket(
        &self,
        settings: &BucketSettings,
        timeout: Option<Duration>,
    ) -> Result<BucketSettings, ClientError> {
        self.policy.traced(
            "update_bucket",
            |span| {
                span.set_tag("settings", settings.to_string().into());
                tag_timeout(span, timeout);
            },
            || self.inner.update_bucket(settings, timeout),
        )
    }

    fn remove_bucket(&self, name: &str, timeout: Option<Duration>) -> Result<bool, ClientError> {
        self.policy.traced(
            "remove_bucket",
            |span| {
                span.set_tag("name", name.into());
                tag_timeout(span, timeout);
            },
            || self.inner.remove_bucket(name, timeout),
        )
    }

    fn upsert_user(
        &self,
        domain: AuthDomain,
        username: &str,
        settings: &UserSettings,
        timeout: Option<Duration>,
    ) -> Result<bool, ClientError> {
        self.policy.traced(
            "upsert_user",
            |span| {
                span.set_tag("domain", domain.to_string().into());
                span.set_tag("username", username.into());
                tag_timeout(span, timeout);
            },
            || self.inner.upsert_user(domain, username, settings, timeout),
        )
    }

    fn remove_user(
        &self,
        domain: AuthDomain,
        username: &str,
        timeout: Option<Duration>,
    ) -> Result<bool, ClientError> {
        self.policy.traced(
            "remove_user",
            |span| {
                span.set_tag("domain", domain.to_string().into());
                span.set_tag("username", username.into());
                tag_timeout(span, timeout);
            },
            || self.inner.remove_user(domain, username, timeout),
        )
    }

    fn get_users(
        &self,
        domain: AuthDomain,
        timeout: Option<Duration>,
    ) -> Result<Vec<User>, ClientError> {
        self.policy.traced(
            "get_users",
            |span| {
                span.set_tag("domain", domain.to_string().into());
                tag_timeout(span, timeout);
            },
            || self.inner.get_users(domain, timeout),
        )
    }

    fn get_user(
        &self,
        domain: AuthDomain,
        user_id: &str,
        timeout: Option<Duration>,
    ) -> Result<Option<User>, ClientError> {
        self.policy.traced(
            "get_user",
            |span| {
                span.set_tag("domain", domain.to_string().into());
                span.set_tag("user_id", user_id.into());
                tag_timeout(span, timeout);
            },
            || self.inner.get_user(domain, user_id, timeout),
        )
    }
}
