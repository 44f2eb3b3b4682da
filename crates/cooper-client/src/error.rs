use std::time::Duration;

/// Everything a cluster, bucket, or management operation can fail with.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    #[error("document {0:?} not found")]
    DocumentNotFound(String),

    #[error("document {0:?} already exists")]
    DocumentExists(String),

    #[error("CAS mismatch on document {0:?}")]
    CasMismatch(String),

    #[error("document {0:?} is locked")]
    DocumentLocked(String),

    #[error("document {id:?} does not hold a {expected}")]
    WrongContentKind { id: String, expected: &'static str },

    #[error("index {index} out of bounds for list {id:?} of length {len}")]
    IndexOutOfBounds { id: String, index: usize, len: usize },

    #[error("no entry {path:?} in document {id:?}")]
    PathNotFound { id: String, path: String },

    #[error("bucket {0:?} not found")]
    BucketNotFound(String),

    #[error("bucket {0:?} already exists")]
    BucketExists(String),

    #[error("bucket {0:?} is closed")]
    BucketClosed(String),

    #[error("user {0:?} not found")]
    UserNotFound(String),

    #[error("authentication failed for {0:?}")]
    AuthFailure(String),

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("cluster connection is closed")]
    Disconnected,
}
