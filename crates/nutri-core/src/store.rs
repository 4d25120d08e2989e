//! Document store boundary.
//!
//! The app talks to a collection-based document database: get by ID, list a
//! collection, equality query on one field, create with an auto-generated ID,
//! set (optionally merging), update (merge into an existing document) and delete.
//! [`DocumentStore`] is that surface; [`Collection`] layers typed (de)serialization
//! on top of it so services work with [`Patient`] and [`UserProfile`] directly.

use std::marker::PhantomData;

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::{Patient, UserProfile};

/// Body of a stored document.
pub type DocumentData = Map<String, Value>;

/// Length of generated document IDs.
pub const AUTO_ID_LENGTH: usize = 20;

/// A document read from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    pub id: String,
    pub data: DocumentData,
}

/// Store errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Malformed document {collection}/{id}: {source}")]
    Malformed {
        collection: String,
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Collection-based document storage.
pub trait DocumentStore {
    /// Fetch one document.
    fn get(&self, collection: &str, id: &str) -> StoreResult<Option<DocumentSnapshot>>;

    /// Every document in a collection, in creation order.
    fn list(&self, collection: &str) -> StoreResult<Vec<DocumentSnapshot>>;

    /// Documents whose top-level `field` equals `value`.
    fn query_eq(
        &self,
        collection: &str,
        field: &str,
        value: &Value,
    ) -> StoreResult<Vec<DocumentSnapshot>>;

    /// Create a document with a generated ID.
    fn add(&self, collection: &str, data: DocumentData) -> StoreResult<String>;

    /// Write a document at a known ID. With `merge`, top-level fields are merged
    /// into any existing body instead of replacing it.
    fn set(&self, collection: &str, id: &str, data: DocumentData, merge: bool) -> StoreResult<()>;

    /// Merge top-level fields into an existing document. Fails with
    /// [`StoreError::NotFound`] when the document does not exist.
    fn update(&self, collection: &str, id: &str, data: DocumentData) -> StoreResult<()>;

    /// Delete a document. Deleting a missing document succeeds.
    fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;

    /// Fresh ID for a document under `path` (a collection or sub-collection path).
    fn generate_id(&self, _path: &str) -> String {
        generate_auto_id()
    }
}

/// 20 random alphanumeric characters.
pub fn generate_auto_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(AUTO_ID_LENGTH)
        .map(char::from)
        .collect()
}

/// An entity stored as a document body with the ID kept outside it.
pub trait Document: Serialize + DeserializeOwned {
    fn set_id(&mut self, id: String);
}

impl Document for Patient {
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

impl Document for UserProfile {
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

/// Encode an entity as a document body.
pub fn to_document<T: Serialize>(value: &T) -> StoreResult<DocumentData> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Backend(format!(
            "expected a JSON object for a document body, got {}",
            other
        ))),
    }
}

/// Typed view of one collection.
pub struct Collection<'a, T> {
    store: &'a dyn DocumentStore,
    name: &'a str,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: Document> Collection<'a, T> {
    pub fn new(store: &'a dyn DocumentStore, name: &'a str) -> Self {
        Self {
            store,
            name,
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        self.name
    }

    pub fn get(&self, id: &str) -> StoreResult<Option<T>> {
        self.store
            .get(self.name, id)?
            .map(|snapshot| self.decode(snapshot))
            .transpose()
    }

    /// Like [`get`](Self::get) but a missing document is an error.
    pub fn require(&self, id: &str) -> StoreResult<T> {
        self.get(id)?.ok_or_else(|| StoreError::NotFound {
            collection: self.name.to_string(),
            id: id.to_string(),
        })
    }

    pub fn list(&self) -> StoreResult<Vec<T>> {
        self.store
            .list(self.name)?
            .into_iter()
            .map(|snapshot| self.decode(snapshot))
            .collect()
    }

    pub fn find_by(&self, field: &str, value: impl Into<Value>) -> StoreResult<Vec<T>> {
        self.store
            .query_eq(self.name, field, &value.into())?
            .into_iter()
            .map(|snapshot| self.decode(snapshot))
            .collect()
    }

    /// Store a new entity and return its generated ID.
    pub fn add(&self, entity: &T) -> StoreResult<String> {
        self.store.add(self.name, to_document(entity)?)
    }

    /// Replace the whole body at `id`.
    pub fn set(&self, id: &str, entity: &T) -> StoreResult<()> {
        self.store.set(self.name, id, to_document(entity)?, false)
    }

    /// Merge the entity's fields into the existing document.
    pub fn update(&self, id: &str, entity: &T) -> StoreResult<()> {
        self.store.update(self.name, id, to_document(entity)?)
    }

    /// Merge selected fields into the existing document.
    pub fn update_fields(&self, id: &str, fields: DocumentData) -> StoreResult<()> {
        self.store.update(self.name, id, fields)
    }

    /// Merge selected fields, creating the document if needed.
    pub fn merge_fields(&self, id: &str, fields: DocumentData) -> StoreResult<()> {
        self.store.set(self.name, id, fields, true)
    }

    pub fn delete(&self, id: &str) -> StoreResult<()> {
        self.store.delete(self.name, id)
    }

    /// ID for an entry embedded under `id` (e.g. `pacientes/{id}/consultas`).
    pub fn generate_child_id(&self, id: &str, child: &str) -> String {
        self.store
            .generate_id(&format!("{}/{}/{}", self.name, id, child))
    }

    fn decode(&self, snapshot: DocumentSnapshot) -> StoreResult<T> {
        let DocumentSnapshot { id, data } = snapshot;
        let mut entity: T =
            serde_json::from_value(Value::Object(data)).map_err(|source| StoreError::Malformed {
                collection: self.name.to_string(),
                id: id.clone(),
                source,
            })?;
        entity.set_id(id);
        Ok(entity)
    }
}
