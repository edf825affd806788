//! Save error taxonomy.

use recordgraph_state::StoreError;

use crate::schema::FieldKind;

/// Errors that abort a save.
///
/// Non-storable field values are not errors; they are skipped.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("{type_name} has no field marked as key; define exactly one key field")]
    NoKeyFieldDefined { type_name: &'static str },

    #[error("{type_name} has more than one key field: {fields:?}")]
    AmbiguousKeyField {
        type_name: &'static str,
        fields: Vec<&'static str>,
    },

    #[error("key field {type_name}.{field} is {kind:?}; key fields must be scalar or enum")]
    UnsupportedKeyField {
        type_name: &'static str,
        field: &'static str,
        kind: FieldKind,
    },

    #[error("field not found: {type_name}.{field}")]
    FieldNotFound {
        type_name: &'static str,
        field: String,
    },

    #[error("field {type_name}.{field} is declared {declared:?} but produced {actual:?}")]
    FieldKindMismatch {
        type_name: &'static str,
        field: &'static str,
        declared: FieldKind,
        actual: FieldKind,
    },

    #[error("no session attached to {type_name}")]
    MissingSession { type_name: &'static str },

    #[error("remote operation failed: {0}")]
    RemoteOperationFailed(#[from] StoreError),
}

/// Result type for save operations.
pub type SaveResult<T> = std::result::Result<T, SaveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_key_field_display() {
        let err = SaveError::NoKeyFieldDefined {
            type_name: "Author",
        };
        assert!(err.to_string().contains("Author has no field marked as key"));
    }

    #[test]
    fn test_store_error_converts() {
        let err: SaveError = StoreError::Backend("boom".to_string()).into();
        assert!(matches!(err, SaveError::RemoteOperationFailed(_)));
        assert!(err.to_string().contains("boom"));
    }
}
