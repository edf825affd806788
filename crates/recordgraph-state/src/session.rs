//! Backend session: the handle application objects carry to reach a store.
//!
//! A session wraps a [`RecordStore`] and provides the record-level
//! operations the save engine consumes:
//! - `create_empty_record` / `first` / `find` / `fetch`
//! - `commit` (create-or-update, committing unsaved referenced records first)
//! - `is_storable`

use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::encoding;
use crate::error::StoreError;
use crate::query::Query;
use crate::record::{Record, RecordHandle};
use crate::storage_traits::{RecordStore, StorageResult, StoredRecord};
use crate::value::Value;

/// Cloneable handle to a record store.
#[derive(Clone)]
pub struct Session {
    id: Uuid,
    store: Arc<dyn RecordStore>,
}

impl Session {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            id: Uuid::new_v4(),
            store,
        }
    }

    /// Unique id of this session (clones share it).
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Whether two handles refer to the same session.
    pub fn same_session(&self, other: &Session) -> bool {
        self.id == other.id
    }

    /// New, unsaved record of `class_name` bound to this session.
    pub fn create_empty_record(&self, class_name: impl Into<String>) -> RecordHandle {
        RecordHandle::new(Record::new(class_name, self.clone()))
    }

    /// Whether a raw value can be written by the underlying store.
    pub fn is_storable(&self, value: &Value) -> bool {
        self.store.is_storable(value)
    }

    fn bind(&self, stored: &StoredRecord) -> StorageResult<RecordHandle> {
        Ok(RecordHandle::new(encoding::decode_record(
            stored,
            self.clone(),
        )?))
    }

    /// First record matching `query`, if any.
    #[instrument(skip_all, fields(class = %query.class_name()))]
    pub async fn first(&self, query: &Query) -> StorageResult<Option<RecordHandle>> {
        let limited = query.clone().limit(1);
        let rows = self.store.find(&limited).await?;
        debug!(found = !rows.is_empty(), "first-or-default lookup");
        rows.first().map(|row| self.bind(row)).transpose()
    }

    /// All records matching `query`.
    pub async fn find(&self, query: &Query) -> StorageResult<Vec<RecordHandle>> {
        let rows = self.store.find(query).await?;
        rows.iter().map(|row| self.bind(row)).collect()
    }

    /// Load a record by identity.
    pub async fn fetch(&self, class_name: &str, object_id: &str) -> StorageResult<RecordHandle> {
        let row = self.store.get(class_name, object_id).await?;
        self.bind(&row)
    }

    /// Write `record` to the store: create it when it has no object id yet,
    /// update it otherwise.
    ///
    /// Unsaved records reachable through its references or relations are
    /// committed first. Returns the same handle, now carrying the object id
    /// and timestamps assigned by the store.
    #[instrument(skip_all, fields(class = %record.class_name()))]
    pub async fn commit(&self, record: &RecordHandle) -> StorageResult<RecordHandle> {
        let mut pending = Vec::new();
        self.commit_inner(record, &mut pending).await?;
        Ok(record.clone())
    }

    fn commit_inner<'a>(
        &'a self,
        record: &'a RecordHandle,
        pending: &'a mut Vec<RecordHandle>,
    ) -> BoxFuture<'a, StorageResult<()>> {
        Box::pin(async move {
            if pending.iter().any(|p| p.ptr_eq(record)) {
                return Err(StoreError::CircularUnsavedReference {
                    class_name: record.class_name(),
                });
            }

            pending.push(record.clone());
            for dependency in record.unsaved_dependencies() {
                debug!(
                    dependency = %dependency.class_name(),
                    "committing unsaved referenced record first"
                );
                self.commit_inner(&dependency, pending).await?;
            }
            pending.pop();

            let (class_name, object_id, encoded) = record.with(|r| {
                encoding::encode_record(r, record).map(|encoded| {
                    (
                        r.class_name().to_string(),
                        r.object_id().map(str::to_string),
                        encoded,
                    )
                })
            })?;

            let stored = match object_id {
                None => self.store.insert(&class_name, encoded.fields).await?,
                Some(id) => {
                    self.store
                        .update(&class_name, &id, encoded.fields)
                        .await?
                }
            };
            record.with_mut(|r| r.apply_stored(&stored));

            if encoded.deferred_self_reference {
                // The record refers to itself; write it again now that it has an id.
                let fields = record.with(|r| encoding::encode_record(r, record))?.fields;
                let stored = self
                    .store
                    .update(&class_name, &stored.object_id, fields)
                    .await?;
                record.with_mut(|r| r.apply_stored(&stored));
            }

            debug!(
                class = %class_name,
                object_id = %stored.object_id,
                "record committed"
            );
            Ok(())
        })
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session").field("id", &self.id).finish()
    }
}
