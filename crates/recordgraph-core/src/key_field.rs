//! Key field lookup.

use crate::error::{SaveError, SaveResult};
use crate::schema::{FieldDescriptor, FieldKind, TypeSchema};

/// The single field of `schema` marked as key.
///
/// The key must be a scalar or an enumeration, since records are matched
/// on it with an equality filter.
pub fn find_key_field(schema: &TypeSchema) -> SaveResult<&'static FieldDescriptor> {
    let keys: Vec<&'static FieldDescriptor> = schema.key_fields().collect();
    let key = match keys.as_slice() {
        [] => {
            return Err(SaveError::NoKeyFieldDefined {
                type_name: schema.type_name,
            })
        }
        [key] => *key,
        many => {
            return Err(SaveError::AmbiguousKeyField {
                type_name: schema.type_name,
                fields: many.iter().map(|f| f.name).collect(),
            })
        }
    };

    match key.kind {
        FieldKind::Scalar | FieldKind::Enum => Ok(key),
        kind => Err(SaveError::UnsupportedKeyField {
            type_name: schema.type_name,
            field: key.name,
            kind,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_KEY: TypeSchema = TypeSchema::new("Loose", &[FieldDescriptor::scalar("Name")]);

    const ONE_KEY: TypeSchema = TypeSchema::new(
        "Tag",
        &[
            FieldDescriptor::scalar("Label"),
            FieldDescriptor::enumeration("Colour").key(),
        ],
    );

    const TWO_KEYS: TypeSchema = TypeSchema::new(
        "Pair",
        &[
            FieldDescriptor::scalar("Left").key(),
            FieldDescriptor::scalar("Right").key(),
        ],
    );

    const NESTED_KEY: TypeSchema =
        TypeSchema::new("Wrapper", &[FieldDescriptor::nested("Inner").key()]);

    #[test]
    fn test_single_key() {
        assert_eq!(find_key_field(&ONE_KEY).unwrap().name, "Colour");
    }

    #[test]
    fn test_no_key() {
        let err = find_key_field(&NO_KEY).unwrap_err();
        assert!(matches!(err, SaveError::NoKeyFieldDefined { type_name: "Loose" }));
    }

    #[test]
    fn test_ambiguous_key_lists_fields() {
        match find_key_field(&TWO_KEYS).unwrap_err() {
            SaveError::AmbiguousKeyField { fields, .. } => assert_eq!(fields, vec!["Left", "Right"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_nested_key_unsupported() {
        let err = find_key_field(&NESTED_KEY).unwrap_err();
        assert!(matches!(
            err,
            SaveError::UnsupportedKeyField {
                kind: FieldKind::Nested,
                ..
            }
        ));
    }
}
