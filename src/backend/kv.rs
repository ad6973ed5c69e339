//! Spin key-value implementations of the backend contracts.
//!
//! Key layout:
//! - `doc:{collection}/{id}` holds a JSON document
//! - `index:{collection}` holds the JSON list of ids in that collection
//! - `blob:{path}` holds raw bytes, `blob-type:{path}` their content type
//! - `account:{email}` holds a user and their password hash

use std::cell::RefCell;
use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use spin_sdk::key_value::Store;

use crate::backend::{
    apply_fields, matches_filters, sort_snapshots, AuthProvider, BlobHandle, BlobStore, DocPath,
    Document, DocumentStore, FieldUpdate, Filter, OrderBy, Snapshot, WriteBatch, WriteOp,
};
use crate::common::data_url::DataUrl;
use crate::common::errors::{AuthError, BackendError, BackendResult};
use crate::common::helpers::{hash_password, new_id, validate_email, verify_password};
use crate::config::{kv_store_label, public_base_url, BLOB_ROUTE_PREFIX, MIN_PASSWORD_LENGTH};
use crate::models::models::User;

pub fn open_store() -> anyhow::Result<Store> {
    let label = kv_store_label();
    Store::open(&label).map_err(|e| anyhow::anyhow!("Failed to open KV store {}: {}", label, e))
}

fn kv_err(e: impl std::fmt::Display) -> BackendError {
    BackendError::Unavailable(e.to_string())
}

fn doc_key(path: &DocPath) -> String {
    format!("doc:{}/{}", path.collection, path.id)
}

fn index_key(collection: &str) -> String {
    format!("index:{}", collection)
}

pub fn blob_key(path: &str) -> String {
    format!("blob:{}", path)
}

pub fn blob_type_key(path: &str) -> String {
    format!("blob-type:{}", path)
}

fn account_key(email: &str) -> String {
    format!("account:{}", email)
}

pub struct KvDocumentStore {
    store: Store,
}

impl KvDocumentStore {
    pub fn new(store: Store) -> Self {
        KvDocumentStore { store }
    }

    pub fn open() -> anyhow::Result<Self> {
        Ok(Self::new(open_store()?))
    }

    fn read(&self, path: &DocPath) -> BackendResult<Option<Document>> {
        Ok(self.store.get_json::<Document>(doc_key(path))?)
    }

    fn write(&self, path: &DocPath, data: &Document) -> BackendResult<()> {
        self.store.set_json(doc_key(path), data)?;

        let key = index_key(&path.collection);
        let mut ids: Vec<String> = self.store.get_json(&key)?.unwrap_or_default();
        if !ids.contains(&path.id) {
            ids.push(path.id.clone());
            self.store.set_json(&key, &ids)?;
        }
        Ok(())
    }

    fn remove(&self, path: &DocPath) -> BackendResult<()> {
        self.store.delete(&doc_key(path)).map_err(kv_err)?;

        let key = index_key(&path.collection);
        let mut ids: Vec<String> = self.store.get_json(&key)?.unwrap_or_default();
        ids.retain(|id| id != &path.id);
        self.store.set_json(&key, &ids)?;
        Ok(())
    }
}

#[async_trait(?Send)]
impl DocumentStore for KvDocumentStore {
    async fn get(&self, path: &DocPath) -> BackendResult<Option<Snapshot>> {
        Ok(self.read(path)?.map(|data| Snapshot { path: path.clone(), data }))
    }

    async fn set(&self, path: &DocPath, data: Document) -> BackendResult<()> {
        self.write(path, &data)
    }

    async fn add(&self, collection: &str, data: Document) -> BackendResult<DocPath> {
        let path = DocPath::new(collection, new_id());
        self.write(&path, &data)?;
        Ok(path)
    }

    async fn update(&self, path: &DocPath, fields: Vec<(String, FieldUpdate)>) -> BackendResult<()> {
        let mut doc = self
            .read(path)?
            .ok_or_else(|| BackendError::NotFound(path.to_string()))?;
        apply_fields(&mut doc, &fields);
        self.write(path, &doc)
    }

    async fn delete(&self, path: &DocPath) -> BackendResult<()> {
        self.remove(path)
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
        order: Option<&OrderBy>,
    ) -> BackendResult<Vec<Snapshot>> {
        let ids: Vec<String> = self.store.get_json(index_key(collection))?.unwrap_or_default();

        let mut snapshots = Vec::new();
        for id in ids {
            let path = DocPath::new(collection, id);
            if let Some(data) = self.read(&path)? {
                if matches_filters(&data, filters) {
                    snapshots.push(Snapshot { path, data });
                }
            }
        }
        if let Some(order) = order {
            sort_snapshots(&mut snapshots, order);
        }
        Ok(snapshots)
    }

    async fn commit(&self, batch: WriteBatch) -> BackendResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        // Resolve every write against the current documents before touching
        // the store, so a missing update target rejects the whole batch.
        let mut staged: BTreeMap<DocPath, Option<Document>> = BTreeMap::new();
        for op in batch.into_ops() {
            match op {
                WriteOp::Set { path, data } => {
                    staged.insert(path, Some(data));
                }
                WriteOp::Update { path, fields } => {
                    let current = match staged.get(&path) {
                        Some(doc) => doc.clone(),
                        None => self.read(&path)?,
                    };
                    let mut doc = current.ok_or_else(|| BackendError::NotFound(path.to_string()))?;
                    apply_fields(&mut doc, &fields);
                    staged.insert(path, Some(doc));
                }
                WriteOp::Delete { path } => {
                    staged.insert(path, None);
                }
            }
        }

        for (path, doc) in staged {
            match doc {
                Some(data) => self.write(&path, &data)?,
                None => self.remove(&path)?,
            }
        }
        log::debug!("KV batch committed");
        Ok(())
    }
}

pub struct KvBlobStore {
    store: Store,
}

impl KvBlobStore {
    pub fn new(store: Store) -> Self {
        KvBlobStore { store }
    }

    pub fn open() -> anyhow::Result<Self> {
        Ok(Self::new(open_store()?))
    }

    /// Raw bytes and content type of a stored blob.
    pub fn read(&self, path: &str) -> BackendResult<Option<(Vec<u8>, Option<String>)>> {
        let bytes = match self.store.get(&blob_key(path)).map_err(kv_err)? {
            Some(bytes) => bytes,
            None => return Ok(None),
        };
        let content_type = self
            .store
            .get(&blob_type_key(path))
            .map_err(kv_err)?
            .and_then(|raw| String::from_utf8(raw).ok());
        Ok(Some((bytes, content_type)))
    }
}

#[async_trait(?Send)]
impl BlobStore for KvBlobStore {
    async fn upload_data_url(&self, path: &str, data_url: &str) -> BackendResult<BlobHandle> {
        let blob = DataUrl::parse(data_url)?;
        self.store.set(&blob_key(path), &blob.bytes).map_err(kv_err)?;
        self.store
            .set(&blob_type_key(path), blob.content_type.as_bytes())
            .map_err(kv_err)?;
        Ok(BlobHandle::new(path))
    }

    async fn download_url(&self, handle: &BlobHandle) -> BackendResult<String> {
        if !self.store.exists(&blob_key(&handle.path)).map_err(kv_err)? {
            return Err(BackendError::NotFound(handle.path.clone()));
        }
        let encoded: Vec<String> = handle
            .path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        Ok(format!("{}{}{}", public_base_url(), BLOB_ROUTE_PREFIX, encoded.join("/")))
    }

    async fn delete(&self, handle: &BlobHandle) -> BackendResult<()> {
        if !self.store.exists(&blob_key(&handle.path)).map_err(kv_err)? {
            return Err(BackendError::NotFound(handle.path.clone()));
        }
        self.store.delete(&blob_key(&handle.path)).map_err(kv_err)?;
        self.store.delete(&blob_type_key(&handle.path)).map_err(kv_err)?;
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct Account {
    user: User,
    password: String,
}

/// Email/password accounts stored in KV. The signed-in user lives for the
/// lifetime of this value.
pub struct KvAuth {
    store: Store,
    current: RefCell<Option<User>>,
}

impl KvAuth {
    pub fn new(store: Store) -> Self {
        KvAuth { store, current: RefCell::new(None) }
    }

    pub fn open() -> anyhow::Result<Self> {
        Ok(Self::new(open_store()?))
    }

    fn account(&self, email: &str) -> Result<Option<Account>, AuthError> {
        self.store
            .get_json(account_key(email))
            .map_err(|e| AuthError::Unavailable(e.to_string()))
    }
}

#[async_trait(?Send)]
impl AuthProvider for KvAuth {
    fn current_user(&self) -> Option<User> {
        self.current.borrow().clone()
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = email.trim().to_lowercase();
        if !validate_email(&email) {
            return Err(AuthError::InvalidEmail);
        }
        if password.len() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::WeakPassword);
        }
        if self.account(&email)?.is_some() {
            return Err(AuthError::EmailAlreadyInUse);
        }

        let account = Account {
            user: User { uid: new_id(), email: email.clone() },
            password: hash_password(password).map_err(|e| AuthError::Unavailable(e.to_string()))?,
        };
        self.store
            .set_json(account_key(&email), &account)
            .map_err(|e| AuthError::Unavailable(e.to_string()))?;

        log::info!("Created account {}", account.user.uid);
        *self.current.borrow_mut() = Some(account.user.clone());
        Ok(account.user)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = email.trim().to_lowercase();
        let account = self.account(&email)?.ok_or(AuthError::UserNotFound)?;
        if !verify_password(password, &account.password) {
            return Err(AuthError::WrongPassword);
        }
        *self.current.borrow_mut() = Some(account.user.clone());
        Ok(account.user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.current.borrow_mut().take();
        Ok(())
    }
}
