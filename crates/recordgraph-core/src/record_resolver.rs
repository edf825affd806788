//! Finding the stored record that corresponds to an object.

use recordgraph_state::{Query, RecordHandle, Session};
use tracing::debug;

use crate::error::{SaveError, SaveResult};
use crate::field_resolver::resolve_field;
use crate::persistable::Persistable;
use crate::schema::{FieldDescriptor, TypeSchema};

/// Remote class name of a type: its override, else its type name.
pub fn class_name_of(schema: &TypeSchema) -> &'static str {
    schema.class_name()
}

/// The stored record whose key field equals `object`'s key value, or a new
/// unsaved record of the object's class when none exists.
///
/// Issues one lookup and never commits.
pub async fn resolve_or_create(
    object: &dyn Persistable,
    key_field: &FieldDescriptor,
    session: &Session,
) -> SaveResult<RecordHandle> {
    let class_name = class_name_of(object.schema());
    match lookup(object, key_field.name, session).await? {
        Some(record) => {
            debug!(class = %class_name, object_id = ?record.object_id(), "matched stored record");
            Ok(record)
        }
        None => {
            debug!(class = %class_name, "no stored record, creating");
            Ok(session.create_empty_record(class_name))
        }
    }
}

/// First stored record of `object`'s class whose `field_name` equals the
/// object's current value of that field.
pub async fn get_by_field(
    object: &dyn Persistable,
    session: &Session,
    field_name: &str,
) -> SaveResult<Option<RecordHandle>> {
    lookup(object, field_name, session).await
}

async fn lookup(
    object: &dyn Persistable,
    field_name: &str,
    session: &Session,
) -> SaveResult<Option<RecordHandle>> {
    let schema = object.schema();
    let descriptor = schema
        .field(field_name)
        .ok_or_else(|| SaveError::FieldNotFound {
            type_name: schema.type_name,
            field: field_name.to_string(),
        })?;
    let (remote_key, value) = resolve_field(object, descriptor.name)?;
    let Some(filter) = value.lookup_value() else {
        return Err(SaveError::UnsupportedKeyField {
            type_name: schema.type_name,
            field: descriptor.name,
            kind: value.kind(),
        });
    };

    let query = Query::new(class_name_of(schema)).where_equal_to(remote_key, filter);
    Ok(session.first(&query).await?)
}
