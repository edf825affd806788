//! Wire encoding of record payloads.
//!
//! Scalars map to JSON primitives. Richer values are tagged objects:
//!
//! ```text
//! {"__type": "Date",     "iso": "2024-01-01T00:00:00Z"}
//! {"__type": "Bytes",    "hex": "deadbeef"}
//! {"__type": "Pointer",  "className": "Author", "objectId": "..."}
//! {"__type": "Relation", "className": "Book",   "objectIds": ["...", "..."]}
//! ```
//!
//! Live references encode as pointers and require the target to have an
//! object id. Decoding always yields stored pointers.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value as Json};

use crate::error::StoreError;
use crate::record::{Record, RecordHandle, Relation, RelationMember};
use crate::session::Session;
use crate::storable::is_valid_field_name;
use crate::storage_traits::{JsonMap, StorageResult, StoredRecord};
use crate::value::{Pointer, Value};

const TYPE_KEY: &str = "__type";

/// Encoded payload of one record.
#[derive(Debug, Clone)]
pub struct EncodedRecord {
    pub fields: JsonMap,
    /// Set when fields referring to the (still unsaved) record itself were
    /// left out; the record must be written again once it has an id.
    pub deferred_self_reference: bool,
}

enum Failure {
    UnsavedSelf,
    Store(StoreError),
}

impl From<StoreError> for Failure {
    fn from(err: StoreError) -> Self {
        Failure::Store(err)
    }
}

struct Owner<'a> {
    handle: &'a RecordHandle,
    class_name: &'a str,
    object_id: Option<&'a str>,
}

/// Encode a standalone value.
pub fn encode_value(value: &Value) -> StorageResult<Json> {
    match encode_inner(value, None) {
        Ok(json) => Ok(json),
        Err(Failure::Store(err)) => Err(err),
        Err(Failure::UnsavedSelf) => Err(StoreError::Serialization(
            "self reference outside of a record".to_string(),
        )),
    }
}

/// Encode the fields and relations of `record`, which is the record behind
/// `owner`. The caller typically holds `owner`'s lock, so the owner is never
/// locked again here.
pub fn encode_record(record: &Record, owner: &RecordHandle) -> StorageResult<EncodedRecord> {
    let ctx = Owner {
        handle: owner,
        class_name: record.class_name(),
        object_id: record.object_id(),
    };
    let mut fields = JsonMap::new();
    let mut deferred_self_reference = false;

    for (key, value) in record.fields() {
        if !is_valid_field_name(key) {
            return Err(StoreError::InvalidFieldName { name: key.clone() });
        }
        match encode_inner(value, Some(&ctx)) {
            Ok(json) => {
                fields.insert(key.clone(), json);
            }
            Err(Failure::UnsavedSelf) => deferred_self_reference = true,
            Err(Failure::Store(err)) => return Err(err),
        }
    }

    for (key, relation) in record.relations() {
        if !is_valid_field_name(key) {
            return Err(StoreError::InvalidFieldName { name: key.clone() });
        }
        match encode_relation(relation, &ctx) {
            Ok(json) => {
                fields.insert(key.clone(), json);
            }
            Err(Failure::UnsavedSelf) => deferred_self_reference = true,
            Err(Failure::Store(err)) => return Err(err),
        }
    }

    Ok(EncodedRecord {
        fields,
        deferred_self_reference,
    })
}

fn reference_id(handle: &RecordHandle, owner: Option<&Owner<'_>>) -> Result<Pointer, Failure> {
    if let Some(owner) = owner {
        if owner.handle.ptr_eq(handle) {
            return match owner.object_id {
                Some(id) => Ok(Pointer::new(owner.class_name, id)),
                None => Err(Failure::UnsavedSelf),
            };
        }
    }
    handle.pointer().ok_or_else(|| {
        Failure::Store(StoreError::UnsavedReference {
            class_name: handle.class_name(),
        })
    })
}

fn encode_pointer(pointer: &Pointer) -> Json {
    json!({
        "__type": "Pointer",
        "className": pointer.class_name,
        "objectId": pointer.object_id,
    })
}

fn encode_inner(value: &Value, owner: Option<&Owner<'_>>) -> Result<Json, Failure> {
    Ok(match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Integer(i) => Json::from(*i),
        Value::Number(n) => serde_json::Number::from_f64(*n)
            .map(Json::Number)
            .ok_or_else(|| StoreError::Serialization(format!("non-finite number {n}")))?,
        Value::String(s) => Json::String(s.clone()),
        Value::Date(d) => json!({
            "__type": "Date",
            "iso": d.to_rfc3339_opts(SecondsFormat::Millis, true),
        }),
        Value::Bytes(b) => json!({ "__type": "Bytes", "hex": hex::encode(b) }),
        Value::Array(items) => Json::Array(
            items
                .iter()
                .map(|v| encode_inner(v, owner))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Value::Object(map) => {
            let mut out = JsonMap::new();
            for (k, v) in map {
                if !is_valid_field_name(k) {
                    return Err(StoreError::InvalidFieldName { name: k.clone() }.into());
                }
                out.insert(k.clone(), encode_inner(v, owner)?);
            }
            Json::Object(out)
        }
        Value::Pointer(p) => encode_pointer(p),
        Value::Reference(handle) => encode_pointer(&reference_id(handle, owner)?),
    })
}

fn encode_relation(relation: &Relation, owner: &Owner<'_>) -> Result<Json, Failure> {
    let mut ids = Vec::with_capacity(relation.len());
    for member in relation.members() {
        let id = match member {
            RelationMember::Stored(id) => id.clone(),
            RelationMember::Live(handle) => reference_id(handle, Some(owner))?.object_id,
        };
        ids.push(Json::String(id));
    }
    Ok(json!({
        "__type": "Relation",
        "className": relation.target_class(),
        "objectIds": ids,
    }))
}

fn tagged_str<'a>(map: &'a JsonMap, key: &str, tag: &str) -> StorageResult<&'a str> {
    map.get(key).and_then(Json::as_str).ok_or_else(|| {
        StoreError::Serialization(format!("{tag} value missing string field {key:?}"))
    })
}

/// Decode a wire value. Relations are rejected here; see [`decode_record`].
pub fn decode_value(json: &Json) -> StorageResult<Value> {
    Ok(match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Integer(i),
            None => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        },
        Json::String(s) => Value::String(s.clone()),
        Json::Array(items) => Value::Array(
            items
                .iter()
                .map(decode_value)
                .collect::<StorageResult<Vec<_>>>()?,
        ),
        Json::Object(map) => match map.get(TYPE_KEY).and_then(Json::as_str) {
            Some("Date") => {
                let iso = tagged_str(map, "iso", "Date")?;
                let parsed = DateTime::parse_from_rfc3339(iso)
                    .map_err(|e| StoreError::Serialization(format!("bad date {iso:?}: {e}")))?;
                Value::Date(parsed.with_timezone(&Utc))
            }
            Some("Bytes") => {
                let encoded = tagged_str(map, "hex", "Bytes")?;
                let bytes = hex::decode(encoded)
                    .map_err(|e| StoreError::Serialization(format!("bad bytes: {e}")))?;
                Value::Bytes(bytes)
            }
            Some("Pointer") => Value::Pointer(Pointer::new(
                tagged_str(map, "className", "Pointer")?,
                tagged_str(map, "objectId", "Pointer")?,
            )),
            Some(other) => {
                return Err(StoreError::Serialization(format!(
                    "unexpected tagged value {other:?}"
                )))
            }
            None => {
                let mut out = BTreeMap::new();
                for (k, v) in map {
                    out.insert(k.clone(), decode_value(v)?);
                }
                Value::Object(out)
            }
        },
    })
}

fn decode_relation(map: &JsonMap) -> StorageResult<Relation> {
    let target_class = map
        .get("className")
        .and_then(Json::as_str)
        .map(str::to_string);
    let ids = map
        .get("objectIds")
        .and_then(Json::as_array)
        .ok_or_else(|| StoreError::Serialization("Relation missing objectIds".to_string()))?
        .iter()
        .map(|id| {
            id.as_str()
                .map(str::to_string)
                .ok_or_else(|| StoreError::Serialization("non-string relation id".to_string()))
        })
        .collect::<StorageResult<Vec<_>>>()?;
    Ok(Relation::from_stored(target_class, ids))
}

fn is_relation(json: &Json) -> bool {
    json.get(TYPE_KEY).and_then(Json::as_str) == Some("Relation")
}

/// Decode a stored record into a record bound to `session`.
pub fn decode_record(stored: &StoredRecord, session: Session) -> StorageResult<Record> {
    let mut fields = BTreeMap::new();
    let mut relations = BTreeMap::new();
    for (key, json) in &stored.fields {
        if is_relation(json) {
            if let Json::Object(map) = json {
                relations.insert(key.clone(), decode_relation(map)?);
            }
        } else {
            fields.insert(key.clone(), decode_value(json)?);
        }
    }
    Ok(Record::from_parts(stored, fields, relations, session))
}

/// Render a record, with its identity and timestamps, as a JSON document.
pub fn record_to_json(handle: &RecordHandle) -> StorageResult<Json> {
    handle.with(|record| {
        let encoded = encode_record(record, handle)?;
        let mut out = JsonMap::new();
        out.insert("className".to_string(), json!(record.class_name()));
        out.insert("objectId".to_string(), json!(record.object_id()));
        if let Some(created) = record.created_at() {
            out.insert(
                "createdAt".to_string(),
                json!(created.to_rfc3339_opts(SecondsFormat::Millis, true)),
            );
        }
        if let Some(updated) = record.updated_at() {
            out.insert(
                "updatedAt".to_string(),
                json!(updated.to_rfc3339_opts(SecondsFormat::Millis, true)),
            );
        }
        out.extend(encoded.fields);
        Ok(Json::Object(out))
    })
}
