//! Storage trait definitions for RecordGraph
//!
//! `RecordStore` is the backend boundary: it persists encoded records by
//! class and object id and answers equality queries. It is async and
//! backend-agnostic. An in-memory fake is provided for testing via the
//! `fakes` module; `SurrealRecordStore` persists to SurrealDB.
//!
//! Application code talks to a store through a [`crate::Session`], which
//! adds record encoding, deep saving of referenced records, and decoding.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::query::Query;
use crate::storable;
use crate::value::Value;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StoreError>;

/// Encoded field payload of a record.
pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// A record as persisted by a store: identity, timestamps and the encoded
/// field payload (relations included).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub class_name: String,
    pub object_id: String,
    pub fields: JsonMap,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Generate a new object id.
pub fn new_object_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Remote record store.
///
/// Guarantees:
/// - `insert` assigns a fresh object id and stamps both timestamps.
/// - `update` replaces the stored payload of an existing record and bumps
///   `updated_at`; it fails with `RecordNotFound` if the record is absent.
/// - `find` returns matches in creation order, honouring the query limit.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Create a new record of `class_name` with the given payload.
    async fn insert(&self, class_name: &str, fields: JsonMap) -> StorageResult<StoredRecord>;

    /// Replace the payload of an existing record.
    async fn update(
        &self,
        class_name: &str,
        object_id: &str,
        fields: JsonMap,
    ) -> StorageResult<StoredRecord>;

    /// Fetch one record by identity.
    async fn get(&self, class_name: &str, object_id: &str) -> StorageResult<StoredRecord>;

    /// Run an equality query.
    async fn find(&self, query: &Query) -> StorageResult<Vec<StoredRecord>>;

    /// Delete a record. No-op if absent.
    async fn delete(&self, class_name: &str, object_id: &str) -> StorageResult<()>;

    /// Whether a raw field value can be written by this store.
    fn is_storable(&self, value: &Value) -> bool {
        storable::is_storable(value)
    }
}
