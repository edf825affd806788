//! Recursive graph save.
//!
//! [`GraphSaver`] walks an object's readable fields in declaration order,
//! saves nested persistable objects depth-first before the object that
//! refers to them, collects collections into relations and finally commits
//! the object's own record.
//!
//! Cycles are broken with an in-progress table: every object whose save has
//! started but not finished is registered with the record being built for
//! it. A nested field that points back at any such object (the immediate
//! parent or an ancestor further up) gets a reference to that record instead
//! of a recursive save. The store resolves references to records that are
//! not committed yet when the referring record is committed.

use std::collections::HashMap;

use futures::future::BoxFuture;
use recordgraph_state::{RecordHandle, Session, Value};
use tracing::Instrument;

use crate::error::SaveResult;
use crate::field_resolver::resolve_field;
use crate::key_field::find_key_field;
use crate::obs::{self, SaveSpan};
use crate::persistable::{object_identity, FieldValue, ObjectRef};
use crate::record_resolver::{class_name_of, resolve_or_create};

/// Counters collected over the lifetime of a [`GraphSaver`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveStats {
    /// Objects whose records were committed.
    pub objects_saved: usize,
    /// Nested fields answered from the in-progress table.
    pub cycles_reused: usize,
    /// Field values left out because the store cannot hold them.
    pub fields_skipped: usize,
    /// Deepest nesting reached; the root object is depth 0.
    pub max_depth: usize,
}

/// Saves object graphs through one session.
pub struct GraphSaver {
    session: Session,
    in_progress: HashMap<usize, RecordHandle>,
    stats: SaveStats,
}

impl GraphSaver {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            in_progress: HashMap::new(),
            stats: SaveStats::default(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn stats(&self) -> SaveStats {
        self.stats
    }

    /// Save `object` and everything it reaches, returning its committed
    /// record.
    pub async fn save(&mut self, object: &ObjectRef) -> SaveResult<RecordHandle> {
        self.save_node(object, 0).await
    }

    /// Save `object` as a child of `parent`, whose record is still being
    /// built: any field reaching `parent` refers to `parent_record`.
    pub async fn save_with_parent(
        &mut self,
        object: &ObjectRef,
        parent: Option<(&ObjectRef, &RecordHandle)>,
    ) -> SaveResult<RecordHandle> {
        let Some((parent, parent_record)) = parent else {
            return self.save(object).await;
        };

        let identity = object_identity(parent);
        let previous = self.in_progress.insert(identity, parent_record.clone());
        let result = self.save_node(object, 1).await;
        match previous {
            Some(record) => {
                self.in_progress.insert(identity, record);
            }
            None => {
                self.in_progress.remove(&identity);
            }
        }
        result
    }

    fn save_node<'a>(
        &'a mut self,
        object: &'a ObjectRef,
        depth: usize,
    ) -> BoxFuture<'a, SaveResult<RecordHandle>> {
        let class_name = class_name_of(object.schema());
        let span = SaveSpan::new(class_name, depth);

        Box::pin(
            async move {
                obs::emit_save_started(class_name, depth);
                self.stats.max_depth = self.stats.max_depth.max(depth);

                // Fail on a bad schema before any remote call.
                let key_field = find_key_field(object.schema())?;
                let record = resolve_or_create(object.as_ref(), key_field, &self.session).await?;
                let created = record.is_new();

                let identity = object_identity(object);
                self.in_progress.insert(identity, record.clone());
                let result = self.populate_and_commit(object, &record, depth).await;
                self.in_progress.remove(&identity);
                result?;

                self.stats.objects_saved += 1;
                obs::emit_save_committed(
                    class_name,
                    record.object_id().as_deref().unwrap_or_default(),
                    created,
                );
                Ok(record)
            }
            .instrument(span.span()),
        )
    }

    async fn populate_and_commit(
        &mut self,
        object: &ObjectRef,
        record: &RecordHandle,
        depth: usize,
    ) -> SaveResult<()> {
        let schema = object.schema();
        let class_name = class_name_of(schema);

        for descriptor in schema.readable_fields() {
            let (remote_key, value) = resolve_field(object.as_ref(), descriptor.name)?;
            match value {
                FieldValue::Enum(i) => record.set(remote_key, Value::Integer(i)),
                FieldValue::Nested(Some(child)) => {
                    let target = self.child_record(&child, &remote_key, depth).await?;
                    record.set(remote_key, target);
                }
                FieldValue::Collection(children) => {
                    let relation = record.relation(remote_key.as_str());
                    for child in &children {
                        let target = self.child_record(child, &remote_key, depth).await?;
                        relation.add(&target);
                    }
                }
                FieldValue::Nested(None) => {
                    self.write_plain(record, class_name, remote_key, Value::Null)
                }
                FieldValue::Scalar(v) => self.write_plain(record, class_name, remote_key, v),
            }
        }

        self.session.commit(record).await?;
        Ok(())
    }

    /// Record to reference for `child`: the in-progress record when the
    /// child is already being saved, else the result of saving it.
    async fn child_record(
        &mut self,
        child: &ObjectRef,
        field: &str,
        depth: usize,
    ) -> SaveResult<RecordHandle> {
        if let Some(record) = self.in_progress.get(&object_identity(child)) {
            obs::emit_cycle_reused(class_name_of(child.schema()), field);
            self.stats.cycles_reused += 1;
            return Ok(record.clone());
        }
        self.save_node(child, depth + 1).await
    }

    fn write_plain(&mut self, record: &RecordHandle, class_name: &str, key: String, value: Value) {
        if !self.session.is_storable(&value) {
            obs::emit_field_skipped(class_name, &key, value.type_name());
            self.stats.fields_skipped += 1;
            return;
        }
        record.set(key, value);
    }
}

impl std::fmt::Debug for GraphSaver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphSaver")
            .field("session", &self.session)
            .field("in_progress", &self.in_progress.len())
            .field("stats", &self.stats)
            .finish()
    }
}
