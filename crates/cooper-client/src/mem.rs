//! In-process reference engine.
//!
//! Implements the full client surface over plain maps so integration tests
//! and the demo binary have a real delegate to talk to. Semantics are
//! honest where they matter to callers (CAS, locks, error taxonomy) and
//! deliberately mock-grade where they do not: statement queries return
//! every document's content as a row, expiry is recorded but never
//! enforced, and timeout arguments are accepted and ignored — there is no
//! I/O to race.

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::bucket::Bucket;
use crate::cluster::Cluster;
use crate::error::ClientError;
use crate::manager::ClusterManager;
use crate::query::{Query, QueryResult, ViewQuery, ViewResult, ViewRow};
use crate::types::{
    AuthDomain, BucketSettings, ClusterInfo, DiagnosticsReport, Document, Durability,
    EndpointHealth, EndpointState, PingReport, PingState, ReplicaMode, ServiceHealth, ServiceType,
    User, UserSettings,
};

const ENGINE_VERSION: &str = "cooper-mem/0.1.0";

struct Stored {
    content: Value,
    cas: u64,
    expiry: Option<Duration>,
    locked_until: Option<Instant>,
}

impl Stored {
    fn new(content: Value, cas: u64) -> Self {
        Self {
            content,
            cas,
            expiry: None,
            locked_until: None,
        }
    }

    fn is_locked(&self) -> bool {
        self.locked_until.is_some_and(|until| until > Instant::now())
    }

    fn to_document(&self, id: &str) -> Document {
        Document {
            id: id.to_owned(),
            content: self.content.clone(),
            cas: self.cas,
            expiry: self.expiry,
        }
    }
}

struct BucketState {
    docs: RwLock<HashMap<String, Stored>>,
    cas_seq: AtomicU64,
    ping_seq: AtomicU64,
    prepared_statements: AtomicU64,
}

impl BucketState {
    fn new() -> Self {
        Self {
            docs: RwLock::new(HashMap::new()),
            cas_seq: AtomicU64::new(0),
            ping_seq: AtomicU64::new(0),
            prepared_statements: AtomicU64::new(0),
        }
    }

    fn next_cas(&self) -> u64 {
        self.cas_seq.fetch_add(1, Ordering::Relaxed) + 1
    }
}

struct ClusterState {
    buckets: RwLock<HashMap<String, Arc<BucketState>>>,
    settings: RwLock<HashMap<String, BucketSettings>>,
    passwords: RwLock<HashMap<String, String>>,
    users: RwLock<HashMap<(AuthDomain, String), UserSettings>>,
    credentials: RwLock<Option<(String, String)>>,
    connected: AtomicBool,
    report_seq: AtomicU64,
}

/// Handle to an in-memory cluster. Handles produced by
/// [`Cluster::authenticate`] share the same storage.
pub struct MemoryCluster {
    state: Arc<ClusterState>,
}

impl MemoryCluster {
    pub fn new() -> Self {
        Self {
            state: Arc::new(ClusterState {
                buckets: RwLock::new(HashMap::new()),
                settings: RwLock::new(HashMap::new()),
                passwords: RwLock::new(HashMap::new()),
                users: RwLock::new(HashMap::new()),
                credentials: RwLock::new(None),
                connected: AtomicBool::new(true),
                report_seq: AtomicU64::new(0),
            }),
        }
    }

    fn ensure_connected(&self) -> Result<(), ClientError> {
        if self.state.connected.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(ClientError::Disconnected)
        }
    }

    fn bucket_state(&self, name: &str) -> Arc<BucketState> {
        // Opening an unknown bucket provisions it with default settings.
        self.state
            .settings
            .write()
            .entry(name.to_owned())
            .or_insert_with(|| BucketSettings::new(name));
        self.state
            .buckets
            .write()
            .entry(name.to_owned())
            .or_insert_with(|| Arc::new(BucketState::new()))
            .clone()
    }
}

impl Default for MemoryCluster {
    fn default() -> Self {
        Self::new()
    }
}

impl Cluster for MemoryCluster {
    type Bucket = MemoryBucket;
    type Manager = MemoryManager;

    fn open_bucket(
        &self,
        name: &str,
        _timeout: Option<Duration>,
    ) -> Result<Self::Bucket, ClientError> {
        self.ensure_connected()?;
        Ok(MemoryBucket {
            name: name.to_owned(),
            state: self.bucket_state(name),
            closed: AtomicBool::new(false),
        })
    }

    fn open_bucket_with_credentials(
        &self,
        name: &str,
        password: &str,
        timeout: Option<Duration>,
    ) -> Result<Self::Bucket, ClientError> {
        self.ensure_connected()?;
        let mut passwords = self.state.passwords.write();
        match passwords.get(name) {
            Some(known) if known != password => {
                return Err(ClientError::AuthFailure(name.to_owned()))
            }
            Some(_) => {}
            // First credentialed open registers the password.
            None => {
                passwords.insert(name.to_owned(), password.to_owned());
            }
        }
        drop(passwords);
        self.open_bucket(name, timeout)
    }

    fn query(&self, _query: &Query, _timeout: Option<Duration>) -> Result<QueryResult, ClientError> {
        self.ensure_connected()?;
        let buckets = self.state.buckets.read();
        let mut named: Vec<(String, String, Value)> = Vec::new();
        for (bucket_name, bucket) in buckets.iter() {
            for (id, stored) in bucket.docs.read().iter() {
                named.push((bucket_name.clone(), id.clone(), stored.content.clone()));
            }
        }
        named.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
        Ok(QueryResult {
            rows: named.into_iter().map(|(_, _, content)| content).collect(),
        })
    }

    fn cluster_manager(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Self::Manager, ClientError> {
        let mut credentials = self.state.credentials.write();
        match credentials.as_ref() {
            Some((known_user, known_pass)) if known_user != username || known_pass != password => {
                return Err(ClientError::AuthFailure(username.to_owned()))
            }
            Some(_) => {}
            None => *credentials = Some((username.to_owned(), password.to_owned())),
        }
        Ok(MemoryManager {
            state: self.state.clone(),
        })
    }

    fn authenticate(&self, username: &str, password: &str) -> Result<Self, ClientError> {
        if username.is_empty() {
            return Err(ClientError::AuthFailure(username.to_owned()));
        }
        *self.state.credentials.write() = Some((username.to_owned(), password.to_owned()));
        Ok(Self {
            state: self.state.clone(),
        })
    }

    fn diagnostics(&self, report_id: Option<&str>) -> Result<DiagnosticsReport, ClientError> {
        self.ensure_connected()?;
        let id = match report_id {
            Some(id) => id.to_owned(),
            None => format!("diag-{}", self.state.report_seq.fetch_add(1, Ordering::Relaxed) + 1),
        };
        let mut endpoints: Vec<EndpointHealth> = self
            .state
            .buckets
            .read()
            .keys()
            .map(|name| EndpointHealth {
                service: ServiceType::KeyValue,
                state: EndpointState::Connected,
                local: "mem:0".to_owned(),
                remote: format!("cooper://{name}"),
            })
            .collect();
        endpoints.sort_by(|a, b| a.remote.cmp(&b.remote));
        endpoints.push(EndpointHealth {
            service: ServiceType::Management,
            state: EndpointState::Connected,
            local: "mem:0".to_owned(),
            remote: "cooper://_admin".to_owned(),
        });
        Ok(DiagnosticsReport {
            id,
            version: ENGINE_VERSION.to_owned(),
            endpoints,
        })
    }

    fn disconnect(&self, _timeout: Option<Duration>) -> Result<bool, ClientError> {
        Ok(self.state.connected.swap(false, Ordering::AcqRel))
    }
}

/// Handle to a bucket of the in-memory cluster. Handles opened for the
/// same name share document storage; `close` only closes the handle.
pub struct MemoryBucket {
    name: String,
    state: Arc<BucketState>,
    closed: AtomicBool,
}

impl MemoryBucket {
    fn ensure_open(&self) -> Result<(), ClientError> {
        if self.closed.load(Ordering::Acquire) {
            Err(ClientError::BucketClosed(self.name.clone()))
        } else {
            Ok(())
        }
    }

    /// Read access to an existing document's content.
    fn read_content<T>(
        &self,
        id: &str,
        f: impl FnOnce(&Value) -> Result<T, ClientError>,
    ) -> Result<T, ClientError> {
        self.ensure_open()?;
        let docs = self.state.docs.read();
        let stored = docs
            .get(id)
            .ok_or_else(|| ClientError::DocumentNotFound(id.to_owned()))?;
        f(&stored.content)
    }

    /// Mutate a document's content, bumping its CAS on success. When
    /// `create_with` is given, a missing document is seeded with it.
    fn mutate_content<T>(
        &self,
        id: &str,
        create_with: Option<fn() -> Value>,
        f: impl FnOnce(&mut Value) -> Result<T, ClientError>,
    ) -> Result<T, ClientError> {
        self.ensure_open()?;
        let mut docs = self.state.docs.write();
        if !docs.contains_key(id) {
            match create_with {
                Some(default) => {
                    let cas = self.state.next_cas();
                    docs.insert(id.to_owned(), Stored::new(default(), cas));
                }
                None => return Err(ClientError::DocumentNotFound(id.to_owned())),
            }
        }
        let stored = docs.get_mut(id).expect("document present");
        if stored.is_locked() {
            return Err(ClientError::DocumentLocked(id.to_owned()));
        }
        let out = f(&mut stored.content)?;
        stored.cas = self.state.next_cas();
        Ok(out)
    }
}

fn as_list<'a>(id: &str, content: &'a Value) -> Result<&'a Vec<Value>, ClientError> {
    content.as_array().ok_or(ClientError::WrongContentKind {
        id: id.to_owned(),
        expected: "list",
    })
}

fn as_list_mut<'a>(id: &str, content: &'a mut Value) -> Result<&'a mut Vec<Value>, ClientError> {
    content.as_array_mut().ok_or(ClientError::WrongContentKind {
        id: id.to_owned(),
        expected: "list",
    })
}

fn as_map<'a>(
    id: &str,
    content: &'a Value,
) -> Result<&'a serde_json::Map<String, Value>, ClientError> {
    content.as_object().ok_or(ClientError::WrongContentKind {
        id: id.to_owned(),
        expected: "map",
    })
}

fn as_map_mut<'a>(
    id: &str,
    content: &'a mut Value,
) -> Result<&'a mut serde_json::Map<String, Value>, ClientError> {
    content.as_object_mut().ok_or(ClientError::WrongContentKind {
        id: id.to_owned(),
        expected: "map",
    })
}

impl Bucket for MemoryBucket {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn get(
        &self,
        id: &str,
        _timeout: Option<Duration>,
    ) -> Result<Option<Document>, ClientError> {
        self.ensure_open()?;
        Ok(self.state.docs.read().get(id).map(|s| s.to_document(id)))
    }

    fn get_from_replica(
        &self,
        id: &str,
        _mode: ReplicaMode,
        timeout: Option<Duration>,
    ) -> Result<Vec<Document>, ClientError> {
        // A single-node engine has exactly one "replica": the active copy.
        Ok(self.get(id, timeout)?.into_iter().collect())
    }

    fn get_and_lock(
        &self,
        id: &str,
        lock_time: Duration,
        _timeout: Option<Duration>,
    ) -> Result<Document, ClientError> {
        self.ensure_open()?;
        let mut docs = self.state.docs.write();
        let stored = docs
            .get_mut(id)
            .ok_or_else(|| ClientError::DocumentNotFound(id.to_owned()))?;
        if stored.is_locked() {
            return Err(ClientError::DocumentLocked(id.to_owned()));
        }
        stored.locked_until = Some(Instant::now() + lock_time);
        Ok(stored.to_document(id))
    }

    fn get_and_touch(
        &self,
        id: &str,
        expiry: Duration,
        _timeout: Option<Duration>,
    ) -> Result<Document, ClientError> {
        self.ensure_open()?;
        let mut docs = self.state.docs.write();
        let stored = docs
            .get_mut(id)
            .ok_or_else(|| ClientError::DocumentNotFound(id.to_owned()))?;
        stored.expiry = Some(expiry);
        Ok(stored.to_document(id))
    }

    fn exists(&self, id: &str, _timeout: Option<Duration>) -> Result<bool, ClientError> {
        self.ensure_open()?;
        Ok(self.state.docs.read().contains_key(id))
    }

    fn insert(
        &self,
        document: Document,
        _durability: Durability,
        _timeout: Option<Duration>,
    ) -> Result<Document, ClientError> {
        self.ensure_open()?;
        let mut docs = self.state.docs.write();
        if docs.contains_key(&document.id) {
            return Err(ClientError::DocumentExists(document.id));
        }
        let cas = self.state.next_cas();
        let mut stored = Stored::new(document.content, cas);
        stored.expiry = document.expiry;
        let out = stored.to_document(&document.id);
        docs.insert(document.id, stored);
        Ok(out)
    }

    fn upsert(
        &self,
        document: Document,
        _durability: Durability,
        _timeout: Option<Duration>,
    ) -> Result<Document, ClientError> {
        self.ensure_open()?;
        let mut docs = self.state.docs.write();
        if docs.get(&document.id).is_some_and(Stored::is_locked) {
            return Err(ClientError::DocumentLocked(document.id));
        }
        let cas = self.state.next_cas();
        let mut stored = Stored::new(document.content, cas);
        stored.expiry = document.expiry;
        let out = stored.to_document(&document.id);
        docs.insert(document.id, stored);
        Ok(out)
    }

    fn replace(
        &self,
        document: Document,
        _durability: Durability,
        _timeout: Option<Duration>,
    ) -> Result<Document, ClientError> {
        self.ensure_open()?;
        let mut docs = self.state.docs.write();
        let stored = docs
            .get_mut(&document.id)
            .ok_or_else(|| ClientError::DocumentNotFound(document.id.clone()))?;
        if stored.is_locked() {
            return Err(ClientError::DocumentLocked(document.id));
        }
        if document.cas != 0 && document.cas != stored.cas {
            return Err(ClientError::CasMismatch(document.id));
        }
        stored.content = document.content;
        stored.expiry = document.expiry;
        stored.cas = self.state.next_cas();
        Ok(stored.to_document(&document.id))
    }

    fn remove(
        &self,
        id: &str,
        _durability: Durability,
        _timeout: Option<Duration>,
    ) -> Result<Document, ClientError> {
        self.ensure_open()?;
        let mut docs = self.state.docs.write();
        let stored = docs
            .get(id)
            .ok_or_else(|| ClientError::DocumentNotFound(id.to_owned()))?;
        if stored.is_locked() {
            return Err(ClientError::DocumentLocked(id.to_owned()));
        }
        let stored = docs.remove(id).expect("document present");
        Ok(stored.to_document(id))
    }

    fn touch(
        &self,
        id: &str,
        expiry: Duration,
        _timeout: Option<Duration>,
    ) -> Result<bool, ClientError> {
        self.ensure_open()?;
        let mut docs = self.state.docs.write();
        let stored = docs
            .get_mut(id)
            .ok_or_else(|| ClientError::DocumentNotFound(id.to_owned()))?;
        stored.expiry = Some(expiry);
        Ok(true)
    }

    fn unlock(&self, id: &str, cas: u64, _timeout: Option<Duration>) -> Result<bool, ClientError> {
        self.ensure_open()?;
        let mut docs = self.state.docs.write();
        let stored = docs
            .get_mut(id)
            .ok_or_else(|| ClientError::DocumentNotFound(id.to_owned()))?;
        if !stored.is_locked() {
            return Ok(false);
        }
        if cas != stored.cas {
            return Err(ClientError::CasMismatch(id.to_owned()));
        }
        stored.locked_until = None;
        Ok(true)
    }

    fn counter(
        &self,
        id: &str,
        delta: i64,
        initial: Option<i64>,
        _durability: Durability,
        _timeout: Option<Duration>,
    ) -> Result<i64, ClientError> {
        self.ensure_open()?;
        let mut docs = self.state.docs.write();
        match docs.get_mut(id) {
            None => {
                let Some(initial) = initial else {
                    return Err(ClientError::DocumentNotFound(id.to_owned()));
                };
                let cas = self.state.next_cas();
                docs.insert(id.to_owned(), Stored::new(Value::from(initial), cas));
                Ok(initial)
            }
            Some(stored) => {
                if stored.is_locked() {
                    return Err(ClientError::DocumentLocked(id.to_owned()));
                }
                let current = stored
                    .content
                    .as_i64()
                    .ok_or(ClientError::WrongContentKind {
                        id: id.to_owned(),
                        expected: "integer",
                    })?;
                let next = current + delta;
                stored.content = Value::from(next);
                stored.cas = self.state.next_cas();
                Ok(next)
            }
        }
    }

    fn append(
        &self,
        document: Document,
        _durability: Durability,
        _timeout: Option<Duration>,
    ) -> Result<Document, ClientError> {
        let suffix = string_content(&document.id, &document.content)?.to_owned();
        let id = document.id;
        self.mutate_content(&id, None, |content| {
            let current = string_content(&id, content)?;
            *content = Value::from(format!("{current}{suffix}"));
            Ok(())
        })?;
        Ok(self
            .get(&id, None)?
            .expect("document present after append"))
    }

    fn prepend(
        &self,
        document: Document,
        _durability: Durability,
        _timeout: Option<Duration>,
    ) -> Result<Document, ClientError> {
        let prefix = string_content(&document.id, &document.content)?.to_owned();
        let id = document.id;
        self.mutate_content(&id, None, |content| {
            let current = string_content(&id, content)?;
            *content = Value::from(format!("{prefix}{current}"));
            Ok(())
        })?;
        Ok(self
            .get(&id, None)?
            .expect("document present after prepend"))
    }

    fn query(&self, _query: &Query, _timeout: Option<Duration>) -> Result<QueryResult, ClientError> {
        self.ensure_open()?;
        self.state
            .prepared_statements
            .fetch_add(1, Ordering::Relaxed);
        let docs = self.state.docs.read();
        let mut rows: Vec<(String, Value)> = docs
            .iter()
            .map(|(id, stored)| (id.clone(), stored.content.clone()))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(QueryResult {
            rows: rows.into_iter().map(|(_, content)| content).collect(),
        })
    }

    fn view_query(
        &self,
        query: &ViewQuery,
        _timeout: Option<Duration>,
    ) -> Result<ViewResult, ClientError> {
        self.ensure_open()?;
        let docs = self.state.docs.read();
        let mut rows: Vec<ViewRow> = docs
            .iter()
            .map(|(id, stored)| ViewRow {
                id: id.clone(),
                key: Value::from(id.clone()),
                value: stored.content.clone(),
            })
            .collect();
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        if query.descending {
            rows.reverse();
        }
        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(ViewResult { rows })
    }

    fn list_get(
        &self,
        id: &str,
        index: usize,
        _timeout: Option<Duration>,
    ) -> Result<Value, ClientError> {
        self.read_content(id, |content| {
            let list = as_list(id, content)?;
            list.get(index).cloned().ok_or(ClientError::IndexOutOfBounds {
                id: id.to_owned(),
                index,
                len: list.len(),
            })
        })
    }

    fn list_append(
        &self,
        id: &str,
        element: Value,
        _timeout: Option<Duration>,
    ) -> Result<bool, ClientError> {
        self.mutate_content(id, Some(|| Value::Array(Vec::new())), |content| {
            as_list_mut(id, content)?.push(element);
            Ok(true)
        })
    }

    fn list_prepend(
        &self,
        id: &str,
        element: Value,
        _timeout: Option<Duration>,
    ) -> Result<bool, ClientError> {
        self.mutate_content(id, Some(|| Value::Array(Vec::new())), |content| {
            as_list_mut(id, content)?.insert(0, element);
            Ok(true)
        })
    }

    fn list_set(
        &self,
        id: &str,
        index: usize,
        element: Value,
        _timeout: Option<Duration>,
    ) -> Result<bool, ClientError> {
        self.mutate_content(id, None, |content| {
            let list = as_list_mut(id, content)?;
            let len = list.len();
            let slot = list.get_mut(index).ok_or(ClientError::IndexOutOfBounds {
                id: id.to_owned(),
                index,
                len,
            })?;
            *slot = element;
            Ok(true)
        })
    }

    fn list_remove(
        &self,
        id: &str,
        index: usize,
        _timeout: Option<Duration>,
    ) -> Result<bool, ClientError> {
        self.mutate_content(id, None, |content| {
            let list = as_list_mut(id, content)?;
            if index >= list.len() {
                return Err(ClientError::IndexOutOfBounds {
                    id: id.to_owned(),
                    index,
                    len: list.len(),
                });
            }
            list.remove(index);
            Ok(true)
        })
    }

    fn list_size(&self, id: &str, _timeout: Option<Duration>) -> Result<usize, ClientError> {
        self.read_content(id, |content| Ok(as_list(id, content)?.len()))
    }

    fn map_add(
        &self,
        id: &str,
        key: &str,
        value: Value,
        _timeout: Option<Duration>,
    ) -> Result<bool, ClientError> {
        self.mutate_content(id, Some(|| Value::Object(serde_json::Map::new())), |content| {
            as_map_mut(id, content)?.insert(key.to_owned(), value);
            Ok(true)
        })
    }

    fn map_get(
        &self,
        id: &str,
        key: &str,
        _timeout: Option<Duration>,
    ) -> Result<Value, ClientError> {
        self.read_content(id, |content| {
            as_map(id, content)?
                .get(key)
                .cloned()
                .ok_or(ClientError::PathNotFound {
                    id: id.to_owned(),
                    path: key.to_owned(),
                })
        })
    }

    fn map_remove(
        &self,
        id: &str,
        key: &str,
        _timeout: Option<Duration>,
    ) -> Result<bool, ClientError> {
        self.mutate_content(id, None, |content| {
            Ok(as_map_mut(id, content)?.remove(key).is_some())
        })
    }

    fn map_size(&self, id: &str, _timeout: Option<Duration>) -> Result<usize, ClientError> {
        self.read_content(id, |content| Ok(as_map(id, content)?.len()))
    }

    fn set_add(
        &self,
        id: &str,
        value: Value,
        _timeout: Option<Duration>,
    ) -> Result<bool, ClientError> {
        self.mutate_content(id, Some(|| Value::Array(Vec::new())), |content| {
            let set = as_list_mut(id, content)?;
            if set.contains(&value) {
                return Ok(false);
            }
            set.push(value);
            Ok(true)
        })
    }

    fn set_contains(
        &self,
        id: &str,
        value: Value,
        _timeout: Option<Duration>,
    ) -> Result<bool, ClientError> {
        self.read_content(id, |content| Ok(as_list(id, content)?.contains(&value)))
    }

    fn set_remove(
        &self,
        id: &str,
        value: Value,
        _timeout: Option<Duration>,
    ) -> Result<bool, ClientError> {
        self.ensure_open()?;
        if !self.state.docs.read().contains_key(id) {
            return Ok(false);
        }
        self.mutate_content(id, None, |content| {
            let set = as_list_mut(id, content)?;
            match set.iter().position(|element| element == &value) {
                Some(pos) => {
                    set.remove(pos);
                    Ok(true)
                }
                None => Ok(false),
            }
        })
    }

    fn set_size(&self, id: &str, _timeout: Option<Duration>) -> Result<usize, ClientError> {
        self.read_content(id, |content| Ok(as_list(id, content)?.len()))
    }

    fn queue_push(
        &self,
        id: &str,
        element: Value,
        _timeout: Option<Duration>,
    ) -> Result<bool, ClientError> {
        self.mutate_content(id, Some(|| Value::Array(Vec::new())), |content| {
            as_list_mut(id, content)?.push(element);
            Ok(true)
        })
    }

    fn queue_pop(
        &self,
        id: &str,
        _timeout: Option<Duration>,
    ) -> Result<Option<Value>, ClientError> {
        self.ensure_open()?;
        if !self.state.docs.read().contains_key(id) {
            return Ok(None);
        }
        self.mutate_content(id, None, |content| {
            let queue = as_list_mut(id, content)?;
            if queue.is_empty() {
                Ok(None)
            } else {
                Ok(Some(queue.remove(0)))
            }
        })
    }

    fn queue_size(&self, id: &str, _timeout: Option<Duration>) -> Result<usize, ClientError> {
        self.read_content(id, |content| Ok(as_list(id, content)?.len()))
    }

    fn ping(
        &self,
        report_id: Option<&str>,
        services: &[ServiceType],
    ) -> Result<PingReport, ClientError> {
        self.ensure_open()?;
        let id = match report_id {
            Some(id) => id.to_owned(),
            None => format!("ping-{}", self.state.ping_seq.fetch_add(1, Ordering::Relaxed) + 1),
        };
        let targets: &[ServiceType] = if services.is_empty() {
            &ServiceType::ALL
        } else {
            services
        };
        Ok(PingReport {
            id,
            services: targets
                .iter()
                .map(|&service| ServiceHealth {
                    service,
                    state: PingState::Ok,
                    latency: Duration::from_micros(50),
                })
                .collect(),
        })
    }

    fn invalidate_query_cache(&self) -> Result<usize, ClientError> {
        self.ensure_open()?;
        Ok(self.state.prepared_statements.swap(0, Ordering::Relaxed) as usize)
    }

    fn close(&self, _timeout: Option<Duration>) -> Result<bool, ClientError> {
        Ok(!self.closed.swap(true, Ordering::AcqRel))
    }
}

fn string_content<'a>(id: &str, content: &'a Value) -> Result<&'a str, ClientError> {
    content.as_str().ok_or(ClientError::WrongContentKind {
        id: id.to_owned(),
        expected: "string",
    })
}

/// Management handle for the in-memory cluster.
pub struct MemoryManager {
    state: Arc<ClusterState>,
}

impl ClusterManager for MemoryManager {
    fn info(&self, _timeout: Option<Duration>) -> Result<ClusterInfo, ClientError> {
        Ok(ClusterInfo {
            version: ENGINE_VERSION.to_owned(),
            nodes: 1,
        })
    }

    fn get_buckets(&self, _timeout: Option<Duration>) -> Result<Vec<BucketSettings>, ClientError> {
        let mut buckets: Vec<BucketSettings> = self.state.settings.read().values().cloned().collect();
        buckets.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(buckets)
    }

    fn get_bucket(
        &self,
        name: &str,
        _timeout: Option<Duration>,
    ) -> Result<Option<BucketSettings>, ClientError> {
        Ok(self.state.settings.read().get(name).cloned())
    }

    fn has_bucket(&self, name: &str, _timeout: Option<Duration>) -> Result<bool, ClientError> {
        Ok(self.state.settings.read().contains_key(name))
    }

    fn insert_bucket(
        &self,
        settings: &BucketSettings,
        _timeout: Option<Duration>,
    ) -> Result<BucketSettings, ClientError> {
        let mut all = self.state.settings.write();
        if all.contains_key(&settings.name) {
            return Err(ClientError::BucketExists(settings.name.clone()));
        }
        all.insert(settings.name.clone(), settings.clone());
        Ok(settings.clone())
    }

    fn update_bucket(
        &self,
        settings: &BucketSettings,
        _timeout: Option<Duration>,
    ) -> Result<BucketSettings, ClientError> {
        let mut all = self.state.settings.write();
        if !all.contains_key(&settings.name) {
            return Err(ClientError::BucketNotFound(settings.name.clone()));
        }
        all.insert(settings.name.clone(), settings.clone());
        Ok(settings.clone())
    }

    fn remove_bucket(&self, name: &str, _timeout: Option<Duration>) -> Result<bool, ClientError> {
        let existed = self.state.settings.write().remove(name).is_some();
        self.state.buckets.write().remove(name);
        self.state.passwords.write().remove(name);
        Ok(existed)
    }

    fn upsert_user(
        &self,
        domain: AuthDomain,
        username: &str,
        settings: &UserSettings,
        _timeout: Option<Duration>,
    ) -> Result<bool, ClientError> {
        self.state
            .users
            .write()
            .insert((domain, username.to_owned()), settings.clone());
        Ok(true)
    }

    fn remove_user(
        &self,
        domain: AuthDomain,
        username: &str,
        _timeout: Option<Duration>,
    ) -> Result<bool, ClientError> {
        Ok(self
            .state
            .users
            .write()
            .remove(&(domain, username.to_owned()))
            .is_some())
    }

    fn get_users(
        &self,
        domain: AuthDomain,
        _timeout: Option<Duration>,
    ) -> Result<Vec<User>, ClientError> {
        let users = self.state.users.read();
        let mut out: Vec<User> = users
            .iter()
            .filter(|((user_domain, _), _)| *user_domain == domain)
            .map(|((_, id), settings)| to_user(domain, id, settings))
            .collect();
        out.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(out)
    }

    fn get_user(
        &self,
        domain: AuthDomain,
        user_id: &str,
        _timeout: Option<Duration>,
    ) -> Result<Option<User>, ClientError> {
        Ok(self
            .state
            .users
            .read()
            .get(&(domain, user_id.to_owned()))
            .map(|settings| to_user(domain, user_id, settings)))
    }
}

fn to_user(domain: AuthDomain, id: &str, settings: &UserSettings) -> User {
    User {
        id: id.to_owned(),
        domain,
        full_name: settings.full_name.clone(),
        roles: settings.roles.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn bucket() -> MemoryBucket {
        MemoryCluster::new().open_bucket("test", None).unwrap()
    }

    #[test]
    fn insert_then_get_round_trips() {
        let bucket = bucket();
        let stored = bucket
            .insert(Document::new("a", json!({"n": 1})), Durability::NONE, None)
            .unwrap();
        assert!(stored.cas > 0);

        let fetched = bucket.get("a", None).unwrap().unwrap();
        assert_eq!(fetched, stored);
        assert!(bucket.exists("a", None).unwrap());
    }

    #[test]
    fn insert_rejects_duplicates() {
        let bucket = bucket();
        bucket
            .insert(Document::new("a", json!(1)), Durability::NONE, None)
            .unwrap();
        assert_eq!(
            bucket.insert(Document::new("a", json!(2)), Durability::NONE, None),
            Err(ClientError::DocumentExists("a".into()))
        );
    }

    #[test]
    fn upsert_bumps_cas() {
        let bucket = bucket();
        let first = bucket
            .upsert(Document::new("a", json!(1)), Durability::NONE, None)
            .unwrap();
        let second = bucket
            .upsert(Document::new("a", json!(2)), Durability::NONE, None)
            .unwrap();
        assert!(second.cas > first.cas);
    }

    #[test]
    fn replace_honors_cas() {
        let bucket = bucket();
        let stored = bucket
            .insert(Document::new("a", json!(1)), Durability::NONE, None)
            .unwrap();

        let mut stale = stored.clone();
        stale.cas = stored.cas + 17;
        assert_eq!(
            bucket.replace(stale, Durability::NONE, None),
            Err(ClientError::CasMismatch("a".into()))
        );

        let mut fresh = stored;
        fresh.content = json!(2);
        let replaced = bucket.replace(fresh, Durability::NONE, None).unwrap();
        assert_eq!(replaced.content, json!(2));

        assert_eq!(
            bucket.replace(Document::new("missing", json!(0)), Durability::NONE, None),
            Err(ClientError::DocumentNotFound("missing".into()))
        );
    }

    #[test]
    fn remove_returns_last_state() {
        let bucket = bucket();
        bucket
            .insert(Document::new("a", json!("x")), Durability::NONE, None)
            .unwrap();
        let removed = bucket.remove("a", Durability::NONE, None).unwrap();
        assert_eq!(removed.content, json!("x"));
        assert!(!bucket.exists("a", None).unwrap());
        assert_eq!(
            bucket.remove("a", Durability::NONE, None),
            Err(ClientError::DocumentNotFound("a".into()))
        );
    }

    #[test]
    fn lock_blocks_mutations_until_unlock() {
        let bucket = bucket();
        bucket
            .insert(Document::new("a", json!(1)), Durability::NONE, None)
            .unwrap();
        let locked = bucket
            .get_and_lock("a", Duration::from_secs(30), None)
            .unwrap();

        assert_eq!(
            bucket.upsert(Document::new("a", json!(2)), Durability::NONE, None),
            Err(ClientError::DocumentLocked("a".into()))
        );
        assert_eq!(
            bucket.get_and_lock("a", Duration::from_secs(30), None),
            Err(ClientError::DocumentLocked("a".into()))
        );

        assert_eq!(bucket.unlock("a", locked.cas + 1, None), Err(ClientError::CasMismatch("a".into())));
        assert!(bucket.unlock("a", locked.cas, None).unwrap());
        // Unlocking an unlocked document reports false.
        assert!(!bucket.unlock("a", locked.cas, None).unwrap());

        bucket
            .upsert(Document::new("a", json!(2)), Durability::NONE, None)
            .unwrap();
    }

    #[test]
    fn counter_seeds_and_advances() {
        let bucket = bucket();
        assert_eq!(
            bucket.counter("hits", 5, None, Durability::NONE, None),
            Err(ClientError::DocumentNotFound("hits".into()))
        );
        assert_eq!(bucket.counter("hits", 5, Some(10), Durability::NONE, None), Ok(10));
        assert_eq!(bucket.counter("hits", 5, Some(10), Durability::NONE, None), Ok(15));
        assert_eq!(bucket.counter("hits", -3, None, Durability::NONE, None), Ok(12));

        bucket
            .upsert(Document::new("text", json!("abc")), Durability::NONE, None)
            .unwrap();
        assert_eq!(
            bucket.counter("text", 1, None, Durability::NONE, None),
            Err(ClientError::WrongContentKind {
                id: "text".into(),
                expected: "integer"
            })
        );
    }

    #[test]
    fn append_and_prepend_concatenate() {
        let bucket = bucket();
        bucket
            .insert(Document::new("s", json!("mid")), Durability::NONE, None)
            .unwrap();
        bucket
            .append(Document::new("s", json!("-end")), Durability::NONE, None)
            .unwrap();
        let out = bucket
            .prepend(Document::new("s", json!("start-")), Durability::NONE, None)
            .unwrap();
        assert_eq!(out.content, json!("start-mid-end"));

        assert_eq!(
            bucket.append(Document::new("s", json!(7)), Durability::NONE, None),
            Err(ClientError::WrongContentKind {
                id: "s".into(),
                expected: "string"
            })
        );
    }

    #[test]
    fn list_operations() {
        let bucket = bucket();
        assert!(bucket.list_append("l", json!("b"), None).unwrap());
        assert!(bucket.list_prepend("l", json!("a"), None).unwrap());
        assert!(bucket.list_append("l", json!("c"), None).unwrap());
        assert_eq!(bucket.list_size("l", None), Ok(3));
        assert_eq!(bucket.list_get("l", 1, None), Ok(json!("b")));
        assert!(bucket.list_set("l", 1, json!("B"), None).unwrap());
        assert!(bucket.list_remove("l", 0, None).unwrap());
        assert_eq!(bucket.list_get("l", 0, None), Ok(json!("B")));
        assert_eq!(
            bucket.list_get("l", 9, None),
            Err(ClientError::IndexOutOfBounds {
                id: "l".into(),
                index: 9,
                len: 2
            })
        );
    }

    #[test]
    fn map_operations() {
        let bucket = bucket();
        assert!(bucket.map_add("m", "k1", json!(1), None).unwrap());
        assert!(bucket.map_add("m", "k2", json!(2), None).unwrap());
        assert_eq!(bucket.map_size("m", None), Ok(2));
        assert_eq!(bucket.map_get("m", "k1", None), Ok(json!(1)));
        assert_eq!(
            bucket.map_get("m", "nope", None),
            Err(ClientError::PathNotFound {
                id: "m".into(),
                path: "nope".into()
            })
        );
        assert!(bucket.map_remove("m", "k1", None).unwrap());
        assert!(!bucket.map_remove("m", "k1", None).unwrap());
    }

    #[test]
    fn set_operations() {
        let bucket = bucket();
        assert!(bucket.set_add("s", json!("x"), None).unwrap());
        assert!(!bucket.set_add("s", json!("x"), None).unwrap());
        assert!(bucket.set_contains("s", json!("x"), None).unwrap());
        assert_eq!(bucket.set_size("s", None), Ok(1));
        assert!(bucket.set_remove("s", json!("x"), None).unwrap());
        assert!(!bucket.set_remove("s", json!("x"), None).unwrap());
        assert!(!bucket.set_remove("missing", json!("x"), None).unwrap());
    }

    #[test]
    fn queue_operations_are_fifo() {
        let bucket = bucket();
        assert_eq!(bucket.queue_pop("q", None), Ok(None));
        bucket.queue_push("q", json!(1), None).unwrap();
        bucket.queue_push("q", json!(2), None).unwrap();
        assert_eq!(bucket.queue_size("q", None), Ok(2));
        assert_eq!(bucket.queue_pop("q", None), Ok(Some(json!(1))));
        assert_eq!(bucket.queue_pop("q", None), Ok(Some(json!(2))));
        assert_eq!(bucket.queue_pop("q", None), Ok(None));
    }

    #[test]
    fn wrong_kind_is_reported_for_collections() {
        let bucket = bucket();
        bucket
            .insert(Document::new("n", json!(42)), Durability::NONE, None)
            .unwrap();
        assert_eq!(
            bucket.list_size("n", None),
            Err(ClientError::WrongContentKind {
                id: "n".into(),
                expected: "list"
            })
        );
        assert_eq!(
            bucket.map_size("n", None),
            Err(ClientError::WrongContentKind {
                id: "n".into(),
                expected: "map"
            })
        );
    }

    #[test]
    fn query_returns_every_document() {
        let bucket = bucket();
        bucket
            .upsert(Document::new("b", json!({"v": 2})), Durability::NONE, None)
            .unwrap();
        bucket
            .upsert(Document::new("a", json!({"v": 1})), Durability::NONE, None)
            .unwrap();
        let result = bucket.query(&Query::simple("SELECT *"), None).unwrap();
        assert_eq!(result.rows, vec![json!({"v": 1}), json!({"v": 2})]);
    }

    #[test]
    fn view_query_orders_and_limits() {
        let bucket = bucket();
        for id in ["a", "b", "c"] {
            bucket
                .upsert(Document::new(id, json!(id)), Durability::NONE, None)
                .unwrap();
        }
        let result = bucket
            .view_query(&ViewQuery::new("dd", "by_id").descending(true).limit(2), None)
            .unwrap();
        let ids: Vec<&str> = result.rows.iter().map(|row| row.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b"]);
    }

    #[test]
    fn invalidate_query_cache_counts_statements() {
        let bucket = bucket();
        bucket.query(&Query::simple("SELECT 1"), None).unwrap();
        bucket.query(&Query::simple("SELECT 2"), None).unwrap();
        assert_eq!(bucket.invalidate_query_cache(), Ok(2));
        assert_eq!(bucket.invalidate_query_cache(), Ok(0));
    }

    #[test]
    fn closed_bucket_rejects_operations() {
        let bucket = bucket();
        assert!(bucket.close(None).unwrap());
        assert!(!bucket.close(None).unwrap());
        assert!(bucket.is_closed());
        assert_eq!(
            bucket.get("a", None),
            Err(ClientError::BucketClosed("test".into()))
        );
    }

    #[test]
    fn bucket_handles_share_storage() {
        let cluster = MemoryCluster::new();
        let first = cluster.open_bucket("shared", None).unwrap();
        let second = cluster.open_bucket("shared", None).unwrap();
        first
            .upsert(Document::new("a", json!(1)), Durability::NONE, None)
            .unwrap();
        assert!(second.exists("a", None).unwrap());
    }

    #[test]
    fn credentialed_open_checks_password() {
        let cluster = MemoryCluster::new();
        cluster
            .open_bucket_with_credentials("locked", "sekrit", None)
            .unwrap();
        assert!(cluster
            .open_bucket_with_credentials("locked", "sekrit", None)
            .is_ok());
        assert_eq!(
            cluster
                .open_bucket_with_credentials("locked", "wrong", None)
                .err(),
            Some(ClientError::AuthFailure("locked".into()))
        );
    }

    #[test]
    fn cluster_manager_checks_credentials() {
        let cluster = MemoryCluster::new();
        let cluster = cluster.authenticate("admin", "password").unwrap();
        assert!(cluster.cluster_manager("admin", "password").is_ok());
        assert_eq!(
            cluster.cluster_manager("admin", "nope").err(),
            Some(ClientError::AuthFailure("admin".into()))
        );
        assert_eq!(
            MemoryCluster::new().authenticate("", "x").err(),
            Some(ClientError::AuthFailure(String::new()))
        );
    }

    #[test]
    fn disconnect_gates_cluster_operations() {
        let cluster = MemoryCluster::new();
        assert!(cluster.disconnect(None).unwrap());
        assert!(!cluster.disconnect(None).unwrap());
        assert_eq!(
            cluster.open_bucket("b", None).err(),
            Some(ClientError::Disconnected)
        );
        assert_eq!(
            cluster.query(&Query::simple("SELECT 1"), None).err(),
            Some(ClientError::Disconnected)
        );
    }

    #[test]
    fn manager_bucket_lifecycle() {
        let cluster = MemoryCluster::new();
        let manager = cluster.cluster_manager("admin", "pw").unwrap();

        let settings = BucketSettings::new("reports").quota_mb(250).replicas(1);
        manager.insert_bucket(&settings, None).unwrap();
        assert_eq!(
            manager.insert_bucket(&settings, None),
            Err(ClientError::BucketExists("reports".into()))
        );
        assert!(manager.has_bucket("reports", None).unwrap());
        assert_eq!(manager.get_bucket("reports", None).unwrap(), Some(settings.clone()));

        let updated = settings.clone().quota_mb(500);
        assert_eq!(manager.update_bucket(&updated, None), Ok(updated));
        assert_eq!(
            manager.update_bucket(&BucketSettings::new("ghost"), None),
            Err(ClientError::BucketNotFound("ghost".into()))
        );

        assert!(manager.remove_bucket("reports", None).unwrap());
        assert!(!manager.remove_bucket("reports", None).unwrap());
    }

    #[test]
    fn manager_user_lifecycle() {
        let cluster = MemoryCluster::new();
        let manager = cluster.cluster_manager("admin", "pw").unwrap();

        let settings = UserSettings::new("Ada Lovelace")
            .password("hidden")
            .role(Role::new("reader").on_bucket("reports"));
        manager
            .upsert_user(AuthDomain::Local, "ada", &settings, None)
            .unwrap();

        let user = manager
            .get_user(AuthDomain::Local, "ada", None)
            .unwrap()
            .unwrap();
        assert_eq!(user.full_name, "Ada Lovelace");
        assert_eq!(user.roles.len(), 1);

        assert_eq!(manager.get_users(AuthDomain::Local, None).unwrap().len(), 1);
        assert!(manager.get_users(AuthDomain::External, None).unwrap().is_empty());

        assert!(manager.remove_user(AuthDomain::Local, "ada", None).unwrap());
        assert!(!manager.remove_user(AuthDomain::Local, "ada", None).unwrap());
    }

    #[test]
    fn authenticate_returns_handle_over_same_cluster() {
        let cluster = MemoryCluster::new();
        cluster
            .open_bucket("b", None)
            .unwrap()
            .upsert(Document::new("a", json!(1)), Durability::NONE, None)
            .unwrap();

        let reauthed = cluster.authenticate("admin", "pw").unwrap();
        let bucket = reauthed.open_bucket("b", None).unwrap();
        assert!(bucket.exists("a", None).unwrap());
    }
}
