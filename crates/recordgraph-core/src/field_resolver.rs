//! Field lookup by name.

use crate::error::{SaveError, SaveResult};
use crate::persistable::{FieldValue, Persistable};
use crate::schema::FieldDescriptor;

/// Resolve the field called `field_name` on `object` to the key it is stored
/// under and its current value.
///
/// Fails with [`SaveError::FieldNotFound`] when the type declares no such
/// field, the field is write-only, or the object yields no value for it.
pub fn resolve_field(object: &dyn Persistable, field_name: &str) -> SaveResult<(String, FieldValue)> {
    let schema = object.schema();
    let not_found = || SaveError::FieldNotFound {
        type_name: schema.type_name,
        field: field_name.to_string(),
    };

    let descriptor = schema
        .field(field_name)
        .filter(|f| f.readable)
        .ok_or_else(not_found)?;
    let value = object.read_field(field_name).ok_or_else(not_found)?;
    check_kind(schema.type_name, descriptor, &value)?;

    Ok((descriptor.remote_key(), value))
}

fn check_kind(
    type_name: &'static str,
    descriptor: &FieldDescriptor,
    value: &FieldValue,
) -> SaveResult<()> {
    let actual = value.kind();
    if actual != descriptor.kind {
        return Err(SaveError::FieldKindMismatch {
            type_name,
            field: descriptor.name,
            declared: descriptor.kind,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use recordgraph_state::{Session, Value};

    use super::*;
    use crate::persistable::{PersistEnum, SessionSlot};
    use crate::schema::{FieldKind, TypeSchema};

    enum Mood {
        Calm,
        Loud,
    }

    impl PersistEnum for Mood {
        fn to_int(&self) -> i64 {
            match self {
                Mood::Calm => 0,
                Mood::Loud => 1,
            }
        }
    }

    static PET: TypeSchema = TypeSchema::new(
        "Pet",
        &[
            FieldDescriptor::scalar("Name").key(),
            FieldDescriptor::enumeration("Mood").renamed("temper"),
            FieldDescriptor::scalar("Secret").write_only(),
            FieldDescriptor::nested("Owner"),
            FieldDescriptor::scalar("Broken"),
        ],
    );

    struct Pet {
        session: SessionSlot,
    }

    impl Persistable for Pet {
        fn schema(&self) -> &'static TypeSchema {
            &PET
        }

        fn read_field(&self, name: &str) -> Option<FieldValue> {
            match name {
                "Name" => Some(FieldValue::scalar("Rex")),
                "Mood" => Some(FieldValue::enumeration(&Mood::Loud)),
                "Secret" => Some(FieldValue::scalar("hidden")),
                "Owner" => Some(FieldValue::Nested(None)),
                "Broken" => Some(FieldValue::Enum(3)),
                _ => None,
            }
        }

        fn session(&self) -> Option<Session> {
            self.session.get()
        }

        fn attach_session(&self, session: Session) {
            self.session.attach(session)
        }
    }

    fn pet() -> Pet {
        Pet {
            session: SessionSlot::new(),
        }
    }

    #[test]
    fn test_scalar_uses_lowered_name() {
        let (key, value) = resolve_field(&pet(), "Name").unwrap();
        assert_eq!(key, "name");
        assert!(matches!(value, FieldValue::Scalar(Value::String(s)) if s == "Rex"));
    }

    #[test]
    fn test_enum_yields_integer_under_override() {
        let (key, value) = resolve_field(&pet(), "Mood").unwrap();
        assert_eq!(key, "temper");
        assert!(matches!(value, FieldValue::Enum(1)));
        assert_eq!(Mood::Calm.to_int(), 0);
    }

    #[test]
    fn test_empty_nested_field() {
        let (key, value) = resolve_field(&pet(), "Owner").unwrap();
        assert_eq!(key, "owner");
        assert!(matches!(value, FieldValue::Nested(None)));
    }

    #[test]
    fn test_unknown_and_write_only_fields_not_found() {
        for name in ["Age", "Secret"] {
            let err = resolve_field(&pet(), name).unwrap_err();
            assert!(
                matches!(err, SaveError::FieldNotFound { ref field, .. } if field == name),
                "{name}: {err}"
            );
        }
    }

    #[test]
    fn test_kind_mismatch() {
        let err = resolve_field(&pet(), "Broken").unwrap_err();
        assert!(matches!(
            err,
            SaveError::FieldKindMismatch {
                declared: FieldKind::Scalar,
                actual: FieldKind::Enum,
                ..
            }
        ));
    }
}
