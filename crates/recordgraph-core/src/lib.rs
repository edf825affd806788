//! RecordGraph Core
//!
//! Saves graphs of application objects as records in a remote record store.
//! Nested persistable objects become references, collections become
//! relations, and objects that refer back to one another are saved once.
//!
//! ```ignore
//! let author: Arc<Author> = Arc::new(Author::new("Jo"));
//! let record = author.save_with(&session).await?;
//! ```

pub mod engine;
pub mod error;
pub mod field_resolver;
pub mod key_field;
pub mod obs;
pub mod persistable;
pub mod record_resolver;
pub mod schema;
pub mod telemetry;

use std::sync::Arc;

use async_trait::async_trait;

pub use engine::{GraphSaver, SaveStats};
pub use error::{SaveError, SaveResult};
pub use field_resolver::resolve_field;
pub use key_field::find_key_field;
pub use persistable::{
    object_identity, same_object, FieldValue, ObjectRef, PersistEnum, Persistable, SessionSlot,
};
pub use record_resolver::{class_name_of, get_by_field, resolve_or_create};
pub use schema::{lower_first, FieldDescriptor, FieldKind, TypeSchema};
pub use telemetry::init_tracing;

pub use recordgraph_state::{
    Pointer, Query, Record, RecordHandle, RecordStore, Relation, Session, StoreError, Value,
};

/// Save `object` through `session`. With a `parent` (the object whose
/// record is still being built, and that record), fields pointing back at
/// the parent refer to its record instead of saving it again.
pub async fn save(
    object: &ObjectRef,
    session: &Session,
    parent: Option<(&ObjectRef, &RecordHandle)>,
) -> SaveResult<RecordHandle> {
    GraphSaver::new(session.clone())
        .save_with_parent(object, parent)
        .await
}

/// Save `object` through the session attached to it.
pub async fn save_object(object: &ObjectRef) -> SaveResult<RecordHandle> {
    let session = object.session().ok_or(SaveError::MissingSession {
        type_name: object.schema().type_name,
    })?;
    save(object, &session, None).await
}

/// `save()` on shared persistable objects.
#[async_trait]
pub trait PersistableExt {
    /// Save through the attached session.
    async fn save(&self) -> SaveResult<RecordHandle>;

    /// Attach `session`, then save through it.
    async fn save_with(&self, session: &Session) -> SaveResult<RecordHandle>;
}

#[async_trait]
impl PersistableExt for ObjectRef {
    async fn save(&self) -> SaveResult<RecordHandle> {
        save_object(self).await
    }

    async fn save_with(&self, session: &Session) -> SaveResult<RecordHandle> {
        self.attach_session(session.clone());
        save_object(self).await
    }
}

#[async_trait]
impl<T: Persistable> PersistableExt for Arc<T> {
    async fn save(&self) -> SaveResult<RecordHandle> {
        let object: ObjectRef = self.clone();
        save_object(&object).await
    }

    async fn save_with(&self, session: &Session) -> SaveResult<RecordHandle> {
        let object: ObjectRef = self.clone();
        object.save_with(session).await
    }
}
