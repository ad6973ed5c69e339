//! Narrow contracts for the hosted services the client talks to.
//!
//! Everything the client persists goes through one of three traits:
//! [`AuthProvider`], [`DocumentStore`] and [`BlobStore`]. The `memory`
//! implementation backs tests and local runs; `kv` stores everything in a
//! Spin key-value store.

pub mod kv;
pub mod memory;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::common::errors::{AuthError, BackendError, BackendResult};
use crate::models::models::User;

pub type Document = Map<String, Value>;

/// Location of a document: a collection path plus a document id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath {
    pub collection: String,
    pub id: String,
}

impl DocPath {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        DocPath {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

impl std::fmt::Display for DocPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Set(Value),
    Increment(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    Set { path: DocPath, data: Document },
    Update { path: DocPath, fields: Vec<(String, FieldUpdate)> },
    Delete { path: DocPath },
}

/// Mutations committed together: either all apply or none do.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, path: DocPath, data: Document) -> &mut Self {
        self.ops.push(WriteOp::Set { path, data });
        self
    }

    pub fn update(&mut self, path: DocPath, fields: Vec<(String, FieldUpdate)>) -> &mut Self {
        self.ops.push(WriteOp::Update { path, fields });
        self
    }

    pub fn increment(&mut self, path: DocPath, field: &str, by: i64) -> &mut Self {
        self.update(path, vec![(field.to_string(), FieldUpdate::Increment(by))])
    }

    pub fn delete(&mut self, path: DocPath) -> &mut Self {
        self.ops.push(WriteOp::Delete { path });
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Equality filter on a top-level field.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        Filter {
            field: field.to_string(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub descending: bool,
}

impl OrderBy {
    pub fn desc(field: &str) -> Self {
        OrderBy { field: field.to_string(), descending: true }
    }

    pub fn asc(field: &str) -> Self {
        OrderBy { field: field.to_string(), descending: false }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub path: DocPath,
    pub data: Document,
}

impl Snapshot {
    /// Deserialize the document, injecting its id as the `id` field.
    pub fn into_typed<T: DeserializeOwned>(self) -> BackendResult<T> {
        let mut data = self.data;
        data.entry("id").or_insert_with(|| Value::String(self.path.id.clone()));
        Ok(serde_json::from_value(Value::Object(data))?)
    }
}

pub fn to_document<T: Serialize>(value: &T) -> BackendResult<Document> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(BackendError::Rejected(format!("expected an object, got {}", other))),
    }
}

/// Apply field updates to a document in place.
pub fn apply_fields(doc: &mut Document, fields: &[(String, FieldUpdate)]) {
    for (field, update) in fields {
        match update {
            FieldUpdate::Set(value) => {
                doc.insert(field.clone(), value.clone());
            }
            FieldUpdate::Increment(by) => {
                let current = doc.get(field).and_then(Value::as_i64).unwrap_or(0);
                doc.insert(field.clone(), Value::from(current + by));
            }
        }
    }
}

/// True when every filter matches the document.
pub fn matches_filters(doc: &Document, filters: &[Filter]) -> bool {
    filters
        .iter()
        .all(|f| doc.get(&f.field) == Some(&f.value))
}

/// Sort snapshots in place. Strings and numbers compare naturally; missing
/// fields sort first.
pub fn sort_snapshots(snapshots: &mut [Snapshot], order: &OrderBy) {
    snapshots.sort_by(|a, b| {
        let ord = compare_values(a.data.get(&order.field), b.data.get(&order.field));
        if order.descending { ord.reverse() } else { ord }
    });
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    use std::cmp::Ordering;
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => x.to_string().cmp(&y.to_string()),
        },
    }
}

#[async_trait(?Send)]
pub trait AuthProvider {
    fn current_user(&self) -> Option<User>;
    async fn sign_up(&self, email: &str, password: &str) -> Result<User, AuthError>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError>;
    async fn sign_out(&self) -> Result<(), AuthError>;
}

#[async_trait(?Send)]
pub trait DocumentStore {
    async fn get(&self, path: &DocPath) -> BackendResult<Option<Snapshot>>;
    async fn set(&self, path: &DocPath, data: Document) -> BackendResult<()>;
    /// Store a document under a generated id and return its path.
    async fn add(&self, collection: &str, data: Document) -> BackendResult<DocPath>;
    async fn update(&self, path: &DocPath, fields: Vec<(String, FieldUpdate)>) -> BackendResult<()>;
    async fn delete(&self, path: &DocPath) -> BackendResult<()>;
    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        order: Option<&OrderBy>,
    ) -> BackendResult<Vec<Snapshot>>;
    async fn commit(&self, batch: WriteBatch) -> BackendResult<()>;
}

/// Handle to an uploaded object.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobHandle {
    pub path: String,
}

impl BlobHandle {
    pub fn new(path: impl Into<String>) -> Self {
        BlobHandle { path: path.into() }
    }
}

#[async_trait(?Send)]
pub trait BlobStore {
    async fn upload_data_url(&self, path: &str, data_url: &str) -> BackendResult<BlobHandle>;
    async fn download_url(&self, handle: &BlobHandle) -> BackendResult<String>;
    async fn delete(&self, handle: &BlobHandle) -> BackendResult<()>;
}
