//! In-memory fakes for storage traits (testing only)
//!
//! Provides `MemoryRecordStore`, which satisfies the `RecordStore` contract
//! without any external dependencies and counts every remote operation so
//! tests can assert on lookups and writes.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::StoreError;
use crate::query::Query;
use crate::storage_traits::*;

/// In-memory record store backed by a `Vec<StoredRecord>` in creation order.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: Mutex<Vec<StoredRecord>>,
    failing_classes: Mutex<HashSet<String>>,
    inserts: AtomicUsize,
    updates: AtomicUsize,
    queries: AtomicUsize,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent insert or update of `class_name` fail.
    pub fn fail_commits_for(&self, class_name: &str) {
        self.failing_classes
            .lock()
            .unwrap()
            .insert(class_name.to_string());
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of stored records of `class_name`.
    pub fn count_of(&self, class_name: &str) -> usize {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.class_name == class_name)
            .count()
    }

    /// Snapshot of all stored records, in creation order.
    pub fn all(&self) -> Vec<StoredRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Stored record with `object_id`, of any class.
    pub fn get_by_id(&self, object_id: &str) -> Option<StoredRecord> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.object_id == object_id)
            .cloned()
    }

    pub fn insert_count(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn update_count(&self) -> usize {
        self.updates.load(Ordering::SeqCst)
    }

    /// Total number of inserts and updates.
    pub fn write_count(&self) -> usize {
        self.insert_count() + self.update_count()
    }

    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn check_failure(&self, class_name: &str, operation: &str) -> StorageResult<()> {
        if self.failing_classes.lock().unwrap().contains(class_name) {
            return Err(StoreError::Injected {
                class_name: class_name.to_string(),
                operation: operation.to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, class_name: &str, fields: JsonMap) -> StorageResult<StoredRecord> {
        self.check_failure(class_name, "insert")?;
        let now = Utc::now();
        let record = StoredRecord {
            class_name: class_name.to_string(),
            object_id: new_object_id(),
            fields,
            created_at: now,
            updated_at: now,
        };
        self.records.lock().unwrap().push(record.clone());
        self.inserts.fetch_add(1, Ordering::SeqCst);
        Ok(record)
    }

    async fn update(
        &self,
        class_name: &str,
        object_id: &str,
        fields: JsonMap,
    ) -> StorageResult<StoredRecord> {
        self.check_failure(class_name, "update")?;
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.class_name == class_name && r.object_id == object_id)
            .ok_or_else(|| StoreError::RecordNotFound {
                class_name: class_name.to_string(),
                object_id: object_id.to_string(),
            })?;
        record.fields = fields;
        record.updated_at = Utc::now();
        self.updates.fetch_add(1, Ordering::SeqCst);
        Ok(record.clone())
    }

    async fn get(&self, class_name: &str, object_id: &str) -> StorageResult<StoredRecord> {
        let records = self.records.lock().unwrap();
        records
            .iter()
            .find(|r| r.class_name == class_name && r.object_id == object_id)
            .cloned()
            .ok_or_else(|| StoreError::RecordNotFound {
                class_name: class_name.to_string(),
                object_id: object_id.to_string(),
            })
    }

    async fn find(&self, query: &Query) -> StorageResult<Vec<StoredRecord>> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let records = self.records.lock().unwrap();
        let mut out = Vec::new();
        for record in records.iter() {
            if query.max_results().is_some_and(|max| out.len() >= max) {
                break;
            }
            if query.matches(&record.class_name, &record.fields)? {
                out.push(record.clone());
            }
        }
        Ok(out)
    }

    async fn delete(&self, class_name: &str, object_id: &str) -> StorageResult<()> {
        let mut records = self.records.lock().unwrap();
        records.retain(|r| !(r.class_name == class_name && r.object_id == object_id));
        Ok(())
    }
}
