//! Generic remote records and relations.
//!
//! A [`Record`] is a dynamically typed key/value container for one object in
//! the store. It is created empty (or loaded from the store), populated field
//! by field, and becomes durable once committed through its [`Session`].
//!
//! Records are shared through [`RecordHandle`] so that a record still being
//! populated can already be referenced from other records.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::session::Session;
use crate::storage_traits::StoredRecord;
use crate::value::{Pointer, Value};

/// One member of a relation.
#[derive(Debug, Clone)]
pub enum RelationMember {
    /// Record held in memory, possibly not yet committed
    Live(RecordHandle),
    /// Object id read back from the store
    Stored(String),
}

impl RelationMember {
    /// Object id of the member, if it has one yet.
    pub fn object_id(&self) -> Option<String> {
        match self {
            RelationMember::Live(handle) => handle.object_id(),
            RelationMember::Stored(id) => Some(id.clone()),
        }
    }
}

/// Ordered set of references to records of one target class, attached to a
/// single field of a record.
#[derive(Debug, Clone, Default)]
pub struct Relation {
    target_class: Option<String>,
    members: Vec<RelationMember>,
}

impl Relation {
    pub fn new(target_class: Option<String>) -> Self {
        Self {
            target_class,
            members: Vec::new(),
        }
    }

    pub(crate) fn from_stored(target_class: Option<String>, object_ids: Vec<String>) -> Self {
        Self {
            target_class,
            members: object_ids.into_iter().map(RelationMember::Stored).collect(),
        }
    }

    pub fn target_class(&self) -> Option<&str> {
        self.target_class.as_deref()
    }

    pub fn members(&self) -> &[RelationMember] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Add a record to the relation, keeping insertion order.
    ///
    /// Adding a record that is already a member (same handle, or same
    /// object id) leaves the relation unchanged. The first member fixes the
    /// target class when none was set.
    ///
    /// Locks `record` and every live member; use [`RelationRef::add`] for a
    /// relation that lives inside a record.
    pub fn add(&mut self, record: &RecordHandle) {
        if contains_member(&self.members, record) {
            return;
        }
        if self.target_class.is_none() {
            self.target_class = Some(record.class_name());
        }
        self.members.push(RelationMember::Live(record.clone()));
    }

    /// Object ids of all members, in order. `None` entries are unsaved.
    pub fn object_ids(&self) -> Vec<Option<String>> {
        self.members.iter().map(RelationMember::object_id).collect()
    }
}

/// Generic key/value record bound to a backend session.
#[derive(Debug, Clone)]
pub struct Record {
    class_name: String,
    object_id: Option<String>,
    fields: BTreeMap<String, Value>,
    relations: BTreeMap<String, Relation>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    session: Session,
}

impl Record {
    /// Create an empty, unsaved record of the given class.
    pub fn new(class_name: impl Into<String>, session: Session) -> Self {
        Self {
            class_name: class_name.into(),
            object_id: None,
            fields: BTreeMap::new(),
            relations: BTreeMap::new(),
            created_at: None,
            updated_at: None,
            session,
        }
    }

    pub(crate) fn from_parts(
        stored: &StoredRecord,
        fields: BTreeMap<String, Value>,
        relations: BTreeMap<String, Relation>,
        session: Session,
    ) -> Self {
        Self {
            class_name: stored.class_name.clone(),
            object_id: Some(stored.object_id.clone()),
            fields,
            relations,
            created_at: Some(stored.created_at),
            updated_at: Some(stored.updated_at),
            session,
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn object_id(&self) -> Option<&str> {
        self.object_id.as_deref()
    }

    pub fn is_new(&self) -> bool {
        self.object_id.is_none()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub fn relations(&self) -> &BTreeMap<String, Relation> {
        &self.relations
    }

    pub fn relation(&self, key: &str) -> Option<&Relation> {
        self.relations.get(key)
    }

    /// Get the relation stored under `key`, creating an empty one if absent.
    pub fn relation_mut(&mut self, key: &str) -> &mut Relation {
        self.relations.entry(key.to_string()).or_default()
    }

    pub(crate) fn apply_stored(&mut self, stored: &StoredRecord) {
        self.object_id = Some(stored.object_id.clone());
        self.created_at = Some(stored.created_at);
        self.updated_at = Some(stored.updated_at);
    }
}

/// Shared handle to a [`Record`].
///
/// Equality between handles is identity (`ptr_eq`), not field equality.
#[derive(Clone)]
pub struct RecordHandle(Arc<Mutex<Record>>);

impl RecordHandle {
    pub fn new(record: Record) -> Self {
        Self(Arc::new(Mutex::new(record)))
    }

    fn lock(&self) -> MutexGuard<'_, Record> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` with shared access to the record.
    pub fn with<R>(&self, f: impl FnOnce(&Record) -> R) -> R {
        f(&self.lock())
    }

    /// Run `f` with exclusive access to the record.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut Record) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn ptr_eq(&self, other: &RecordHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    pub fn class_name(&self) -> String {
        self.lock().class_name.clone()
    }

    pub fn object_id(&self) -> Option<String> {
        self.lock().object_id.clone()
    }

    pub fn is_new(&self) -> bool {
        self.lock().is_new()
    }

    pub fn session(&self) -> Session {
        self.lock().session.clone()
    }

    /// Stored pointer to this record, once it has an object id.
    pub fn pointer(&self) -> Option<Pointer> {
        let record = self.lock();
        record
            .object_id
            .as_ref()
            .map(|id| Pointer::new(record.class_name.clone(), id.clone()))
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().fields.get(key).cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.lock().set(key, value);
    }

    /// Access the relation stored under `key` (created on first use).
    pub fn relation(&self, key: impl Into<String>) -> RelationRef {
        let key = key.into();
        self.lock().relation_mut(&key);
        RelationRef {
            owner: self.clone(),
            key,
        }
    }

    /// Snapshot of the record.
    pub fn snapshot(&self) -> Record {
        self.lock().clone()
    }

    /// Uncommitted records this record references through field values or
    /// relation members, excluding itself.
    pub(crate) fn unsaved_dependencies(&self) -> Vec<RecordHandle> {
        let referenced: Vec<RecordHandle> = {
            let record = self.lock();
            let mut out = Vec::new();
            for value in record.fields.values() {
                collect_references(value, &mut out);
            }
            for relation in record.relations.values() {
                for member in &relation.members {
                    if let RelationMember::Live(handle) = member {
                        out.push(handle.clone());
                    }
                }
            }
            out
        };

        let mut unsaved: Vec<RecordHandle> = Vec::new();
        for handle in referenced {
            if handle.ptr_eq(self) || unsaved.iter().any(|u| u.ptr_eq(&handle)) {
                continue;
            }
            if handle.is_new() {
                unsaved.push(handle);
            }
        }
        unsaved
    }
}

fn contains_member(members: &[RelationMember], record: &RecordHandle) -> bool {
    let candidate_id = record.object_id();
    members.iter().any(|member| match member {
        RelationMember::Live(existing) => {
            existing.ptr_eq(record)
                || (candidate_id.is_some() && existing.object_id() == candidate_id)
        }
        RelationMember::Stored(id) => candidate_id.as_deref() == Some(id.as_str()),
    })
}

fn collect_references(value: &Value, out: &mut Vec<RecordHandle>) {
    match value {
        Value::Reference(handle) => out.push(handle.clone()),
        Value::Array(items) => items.iter().for_each(|v| collect_references(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_references(v, out)),
        _ => {}
    }
}

impl std::fmt::Debug for RecordHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Records may reference each other cyclically; print identity only.
        match self.0.try_lock() {
            Ok(record) => write!(
                f,
                "RecordHandle({}/{})",
                record.class_name,
                record.object_id.as_deref().unwrap_or("<new>")
            ),
            Err(_) => write!(f, "RecordHandle(<locked>)"),
        }
    }
}

/// A named relation on a specific record.
#[derive(Debug, Clone)]
pub struct RelationRef {
    owner: RecordHandle,
    key: String,
}

impl RelationRef {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Add `record` to the relation.
    ///
    /// Member identities are read without holding the owner's lock, since a
    /// member may be the owner itself.
    pub fn add(&self, record: &RecordHandle) {
        let members = self.owner.with(|owner| {
            owner
                .relation(&self.key)
                .map(|r| r.members.clone())
                .unwrap_or_default()
        });
        if contains_member(&members, record) {
            return;
        }
        let class = record.class_name();
        self.owner.with_mut(|owner| {
            let relation = owner.relation_mut(&self.key);
            if relation.target_class.is_none() {
                relation.target_class = Some(class);
            }
            relation.members.push(RelationMember::Live(record.clone()));
        });
    }

    pub fn len(&self) -> usize {
        self.owner
            .with(|owner| owner.relation(&self.key).map(Relation::len).unwrap_or(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the relation.
    pub fn get(&self) -> Relation {
        self.owner
            .with(|owner| owner.relation(&self.key).cloned().unwrap_or_default())
    }
}
