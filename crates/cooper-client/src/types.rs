use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A JSON document plus its storage metadata.
///
/// `cas` is the compare-and-swap token last observed for the document; a
/// freshly constructed document carries `0`, meaning "no expectation".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub content: serde_json::Value,
    pub cas: u64,
    pub expiry: Option<Duration>,
}

impl Document {
    pub fn new(id: impl Into<String>, content: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            content,
            cas: 0,
            expiry: None,
        }
    }

    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.expiry = Some(expiry);
        self
    }
}

/// How many nodes must have persisted a mutation to disk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersistTo {
    #[default]
    None,
    Active,
    One,
    Two,
    Three,
}

impl fmt::Display for PersistTo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::Active => "active",
            Self::One => "one",
            Self::Two => "two",
            Self::Three => "three",
        })
    }
}

/// How many replicas must have acknowledged a mutation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplicateTo {
    #[default]
    None,
    One,
    Two,
    Three,
}

impl fmt::Display for ReplicateTo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::None => "none",
            Self::One => "one",
            Self::Two => "two",
            Self::Three => "three",
        })
    }
}

/// Durability requirements for a mutation. Opaque to the engine beyond
/// being forwarded; the default requires nothing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Durability {
    pub persist_to: PersistTo,
    pub replicate_to: ReplicateTo,
}

impl Durability {
    pub const NONE: Durability = Durability {
        persist_to: PersistTo::None,
        replicate_to: ReplicateTo::None,
    };

    pub fn new(persist_to: PersistTo, replicate_to: ReplicateTo) -> Self {
        Self {
            persist_to,
            replicate_to,
        }
    }
}

/// Which replica copies a replica read targets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplicaMode {
    All,
    Index(u32),
}

impl fmt::Display for ReplicaMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Index(index) => write!(f, "replica-{index}"),
        }
    }
}

/// Cluster services a ping can target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    KeyValue,
    Query,
    View,
    Management,
}

impl ServiceType {
    pub const ALL: [ServiceType; 4] = [
        ServiceType::KeyValue,
        ServiceType::Query,
        ServiceType::View,
        ServiceType::Management,
    ];
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::KeyValue => "kv",
            Self::Query => "query",
            Self::View => "view",
            Self::Management => "mgmt",
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BucketType {
    #[default]
    Persistent,
    Ephemeral,
}

impl fmt::Display for BucketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Persistent => "persistent",
            Self::Ephemeral => "ephemeral",
        })
    }
}

/// Definition of a bucket as the management surface sees it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketSettings {
    pub name: String,
    pub bucket_type: BucketType,
    pub quota_mb: u64,
    pub replicas: u32,
    pub flush_enabled: bool,
}

impl BucketSettings {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bucket_type: BucketType::default(),
            quota_mb: 100,
            replicas: 0,
            flush_enabled: false,
        }
    }

    pub fn bucket_type(mut self, bucket_type: BucketType) -> Self {
        self.bucket_type = bucket_type;
        self
    }

    pub fn quota_mb(mut self, quota_mb: u64) -> Self {
        self.quota_mb = quota_mb;
        self
    }

    pub fn replicas(mut self, replicas: u32) -> Self {
        self.replicas = replicas;
        self
    }

    pub fn flush_enabled(mut self, flush_enabled: bool) -> Self {
        self.flush_enabled = flush_enabled;
        self
    }
}

impl fmt::Display for BucketSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {} MB, {} replicas)",
            self.name, self.bucket_type, self.quota_mb, self.replicas
        )
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterInfo {
    pub version: String,
    pub nodes: usize,
}

/// Where a user is defined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthDomain {
    Local,
    External,
}

impl fmt::Display for AuthDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Local => "local",
            Self::External => "external",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub name: String,
    pub bucket: Option<String>,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bucket: None,
        }
    }

    pub fn on_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }
}

/// Payload for creating or updating a user. The password never travels
/// back out through [`User`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSettings {
    pub full_name: String,
    pub password: Option<String>,
    pub roles: Vec<Role>,
}

impl UserSettings {
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            password: None,
            roles: Vec::new(),
        }
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn role(mut self, role: Role) -> Self {
        self.roles.push(role);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub domain: AuthDomain,
    pub full_name: String,
    pub roles: Vec<Role>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndpointState {
    Connected,
    Connecting,
    Disconnected,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointHealth {
    pub service: ServiceType,
    pub state: EndpointState,
    pub local: String,
    pub remote: String,
}

/// Snapshot of every endpoint the client currently knows about.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsReport {
    pub id: String,
    pub version: String,
    pub endpoints: Vec<EndpointHealth>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PingState {
    Ok,
    Timeout,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub service: ServiceType,
    pub state: PingState,
    pub latency: Duration,
}

/// Result of actively probing services, as opposed to the passive
/// [`DiagnosticsReport`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingReport {
    pub id: String,
    pub services: Vec<ServiceHealth>,
}
