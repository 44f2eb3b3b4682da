//! Client capability surface for a Cooper document cluster.
//!
//! The surface is expressed as traits ([`Cluster`], [`Bucket`],
//! [`ClusterManager`]) so that layers composing over a client — pools,
//! instrumentation, test doubles — can stay generic over the engine
//! behind it. The [`mem`] module ships an in-process reference engine
//! implementing the whole surface.
//!
//! # Example
//!
//! ```
//! use cooper_client::{Bucket, Cluster, Document, Durability, MemoryCluster};
//! use serde_json::json;
//!
//! let cluster = MemoryCluster::new();
//! let bucket = cluster.open_bucket("travel", None)?;
//! bucket.upsert(
//!     Document::new("route:1", json!({"from": "LHR", "to": "CDG"})),
//!     Durability::NONE,
//!     None,
//! )?;
//! assert!(bucket.exists("route:1", None)?);
//! # Ok::<(), cooper_client::ClientError>(())
//! ```

mod bucket;
mod cluster;
mod error;
mod manager;
pub mod mem;
mod query;
mod types;

pub use bucket::Bucket;
pub use cluster::Cluster;
pub use error::ClientError;
pub use manager::ClusterManager;
pub use mem::{MemoryBucket, MemoryCluster, MemoryManager};
pub use query::{Query, QueryResult, ViewQuery, ViewResult, ViewRow};
pub use types::{
    AuthDomain, BucketSettings, BucketType, ClusterInfo, DiagnosticsReport, Document, Durability,
    EndpointHealth, EndpointState, PersistTo, PingReport, PingState, ReplicaMode, ReplicateTo,
    Role, ServiceHealth, ServiceType, User, UserSettings,
};
