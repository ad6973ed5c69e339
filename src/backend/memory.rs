//! In-process stand-ins for the hosted services.
//!
//! Every store can be switched "offline" to exercise failure paths. Writes
//! yield once to the executor before applying, the way a network call would.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use futures_lite::future::yield_now;

use crate::backend::{
    apply_fields, matches_filters, sort_snapshots, AuthProvider, BlobHandle, BlobStore, DocPath,
    Document, DocumentStore, FieldUpdate, Filter, OrderBy, Snapshot, WriteBatch, WriteOp,
};
use crate::common::data_url::DataUrl;
use crate::common::errors::{AuthError, BackendError, BackendResult};
use crate::common::helpers::{hash_password, new_id, validate_email, verify_password};
use crate::config::MIN_PASSWORD_LENGTH;
use crate::models::models::User;

type Collections = BTreeMap<String, BTreeMap<String, Document>>;

#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RefCell<Collections>,
    offline: Cell<bool>,
    failing_commits: Cell<usize>,
    commits: Cell<usize>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with `Unavailable` while offline.
    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    /// Make the next `count` batch commits fail.
    pub fn fail_next_commits(&self, count: usize) {
        self.failing_commits.set(count);
    }

    /// Number of batches committed successfully.
    pub fn commit_count(&self) -> usize {
        self.commits.get()
    }

    /// Synchronous read for assertions.
    pub fn peek(&self, path: &DocPath) -> Option<Document> {
        self.collections
            .borrow()
            .get(&path.collection)
            .and_then(|docs| docs.get(&path.id))
            .cloned()
    }

    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .borrow()
            .get(collection)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    /// Synchronous write for seeding fixtures.
    pub fn insert(&self, path: &DocPath, data: Document) {
        self.collections
            .borrow_mut()
            .entry(path.collection.clone())
            .or_default()
            .insert(path.id.clone(), data);
    }

    fn check_online(&self) -> BackendResult<()> {
        if self.offline.get() {
            return Err(BackendError::Unavailable("document store is offline".to_string()));
        }
        Ok(())
    }

    fn apply(collections: &mut Collections, op: WriteOp) -> BackendResult<()> {
        match op {
            WriteOp::Set { path, data } => {
                collections.entry(path.collection).or_default().insert(path.id, data);
            }
            WriteOp::Update { path, fields } => {
                let doc = collections
                    .get_mut(&path.collection)
                    .and_then(|docs| docs.get_mut(&path.id))
                    .ok_or_else(|| BackendError::NotFound(path.to_string()))?;
                apply_fields(doc, &fields);
            }
            WriteOp::Delete { path } => {
                if let Some(docs) = collections.get_mut(&path.collection) {
                    docs.remove(&path.id);
                }
            }
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, path: &DocPath) -> BackendResult<Option<Snapshot>> {
        self.check_online()?;
        Ok(self.peek(path).map(|data| Snapshot { path: path.clone(), data }))
    }

    async fn set(&self, path: &DocPath, data: Document) -> BackendResult<()> {
        yield_now().await;
        self.check_online()?;
        self.insert(path, data);
        Ok(())
    }

    async fn add(&self, collection: &str, data: Document) -> BackendResult<DocPath> {
        let path = DocPath::new(collection, new_id());
        self.set(&path, data).await?;
        Ok(path)
    }

    async fn update(&self, path: &DocPath, fields: Vec<(String, FieldUpdate)>) -> BackendResult<()> {
        yield_now().await;
        self.check_online()?;
        let mut collections = self.collections.borrow_mut();
        Self::apply(&mut collections, WriteOp::Update { path: path.clone(), fields })
    }

    async fn delete(&self, path: &DocPath) -> BackendResult<()> {
        yield_now().await;
        self.check_online()?;
        let mut collections = self.collections.borrow_mut();
        Self::apply(&mut collections, WriteOp::Delete { path: path.clone() })
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        order: Option<&OrderBy>,
    ) -> BackendResult<Vec<Snapshot>> {
        self.check_online()?;
        let collections = self.collections.borrow();
        let mut snapshots: Vec<Snapshot> = collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, doc)| matches_filters(doc, filters))
                    .map(|(id, doc)| Snapshot {
                        path: DocPath::new(collection, id.clone()),
                        data: doc.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        if let Some(order) = order {
            sort_snapshots(&mut snapshots, order);
        }
        Ok(snapshots)
    }

    async fn commit(&self, batch: WriteBatch) -> BackendResult<()> {
        yield_now().await;
        self.check_online()?;
        if batch.is_empty() {
            return Ok(());
        }
        let failing = self.failing_commits.get();
        if failing > 0 {
            self.failing_commits.set(failing - 1);
            return Err(BackendError::Unavailable("batch commit failed".to_string()));
        }

        // Apply against a scratch copy so a failing op leaves nothing behind.
        let mut scratch = self.collections.borrow().clone();
        for op in batch.into_ops() {
            Self::apply(&mut scratch, op)?;
        }
        *self.collections.borrow_mut() = scratch;
        self.commits.set(self.commits.get() + 1);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RefCell<HashMap<String, DataUrl>>,
    offline: Cell<bool>,
    uploads: Cell<usize>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    /// Number of upload calls received, successful or not.
    pub fn upload_count(&self) -> usize {
        self.uploads.get()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.blobs.borrow().contains_key(path)
    }

    fn check_online(&self) -> BackendResult<()> {
        if self.offline.get() {
            return Err(BackendError::Unavailable("blob store is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl BlobStore for MemoryBlobStore {
    async fn upload_data_url(&self, path: &str, data_url: &str) -> BackendResult<BlobHandle> {
        self.uploads.set(self.uploads.get() + 1);
        yield_now().await;
        self.check_online()?;
        let blob = DataUrl::parse(data_url)?;
        self.blobs.borrow_mut().insert(path.to_string(), blob);
        Ok(BlobHandle::new(path))
    }

    async fn download_url(&self, handle: &BlobHandle) -> BackendResult<String> {
        self.check_online()?;
        if !self.contains(&handle.path) {
            return Err(BackendError::NotFound(handle.path.clone()));
        }
        Ok(format!("memory://blobs/{}", handle.path))
    }

    async fn delete(&self, handle: &BlobHandle) -> BackendResult<()> {
        yield_now().await;
        self.check_online()?;
        self.blobs
            .borrow_mut()
            .remove(&handle.path)
            .map(|_| ())
            .ok_or_else(|| BackendError::NotFound(handle.path.clone()))
    }
}

#[derive(Default)]
pub struct MemoryAuth {
    accounts: RefCell<HashMap<String, (User, String)>>,
    current: RefCell<Option<User>>,
    offline: Cell<bool>,
}

impl MemoryAuth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.set(offline);
    }

    /// Replace the session without going through sign-in.
    pub fn set_current_user(&self, user: Option<User>) {
        *self.current.borrow_mut() = user;
    }

    fn check_online(&self) -> Result<(), AuthError> {
        if self.offline.get() {
            return Err(AuthError::Unavailable("auth provider is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl AuthProvider for MemoryAuth {
    fn current_user(&self) -> Option<User> {
        self.current.borrow().clone()
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<User, AuthError> {
        self.check_online()?;
        let email = email.trim().to_lowercase();
        if !validate_email(&email) {
            return Err(AuthError::InvalidEmail);
        }
        if password.len() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::WeakPassword);
        }
        if self.accounts.borrow().contains_key(&email) {
            return Err(AuthError::EmailAlreadyInUse);
        }

        let hash = hash_password(password).map_err(|e| AuthError::Unavailable(e.to_string()))?;
        let user = User { uid: new_id(), email: email.clone() };
        self.accounts.borrow_mut().insert(email, (user.clone(), hash));
        *self.current.borrow_mut() = Some(user.clone());
        Ok(user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        self.check_online()?;
        let email = email.trim().to_lowercase();
        let (user, hash) = self
            .accounts
            .borrow()
            .get(&email)
            .cloned()
            .ok_or(AuthError::UserNotFound)?;
        if !verify_password(password, &hash) {
            return Err(AuthError::WrongPassword);
        }
        *self.current.borrow_mut() = Some(user.clone());
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.check_online()?;
        self.current.borrow_mut().take();
        Ok(())
    }
}
