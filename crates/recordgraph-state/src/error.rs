//! Error types for recordgraph-state

use thiserror::Error;

/// Errors returned by record stores and sessions.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Backend connection or authentication error
    #[error("Store connection failed: {0}")]
    Connection(String),

    /// Backend query or write error
    #[error("Store backend error: {0}")]
    Backend(String),

    /// Encoding or decoding of record payloads failed
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Schema setup error
    #[error("Schema setup failed: {0}")]
    SchemaSetup(String),

    /// No record with the given identity exists
    #[error("record not found: {class_name}/{object_id}")]
    RecordNotFound {
        class_name: String,
        object_id: String,
    },

    /// A live reference was encoded before its target had an object id
    #[error("reference to unsaved {class_name} record cannot be encoded")]
    UnsavedReference { class_name: String },

    /// Unsaved records reference each other in a loop and none can be written first
    #[error("circular reference between unsaved records at {class_name}")]
    CircularUnsavedReference { class_name: String },

    /// Field name rejected by the store
    #[error("invalid field name: {name:?}")]
    InvalidFieldName { name: String },

    /// Failure injected by a test fake
    #[error("injected failure for {class_name}: {operation}")]
    Injected {
        class_name: String,
        operation: String,
    },
}

impl From<surrealdb::Error> for StoreError {
    fn from(err: surrealdb::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_not_found_display() {
        let err = StoreError::RecordNotFound {
            class_name: "Author".to_string(),
            object_id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "record not found: Author/abc");
    }

    #[test]
    fn test_serde_error_converts() {
        let bad = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: StoreError = bad.into();
        assert!(matches!(err, StoreError::Serialization(_)));
    }
}
