//! SurrealDB schema initialization
//!
//! Sets up the single `records` table backing every record class.

use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::storage_traits::StorageResult;

/// Initialize the `records` table.
///
/// Safe to call multiple times (idempotent).
///
/// Schema:
/// ```text
/// TABLE records {
///   class_name:  STRING (indexed)
///   object_id:   STRING (unique)
///   fields:      OBJECT (encoded payload, relations included)
///   created_at:  DATETIME (indexed)
///   updated_at:  DATETIME
/// }
/// ```
pub async fn init_schema(db: &Surreal<Any>) -> StorageResult<()> {
    debug!("Initializing records table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS records SCHEMALESS;

        -- Object ids are globally unique
        DEFINE INDEX IF NOT EXISTS idx_object_id ON TABLE records COLUMNS object_id UNIQUE;

        -- Queries always filter on class
        DEFINE INDEX IF NOT EXISTS idx_class_name ON TABLE records COLUMNS class_name;

        -- Results are returned in creation order
        DEFINE INDEX IF NOT EXISTS idx_class_created ON TABLE records COLUMNS class_name, created_at;
    "#;

    db.query(sql)
        .await
        .map_err(|e| StoreError::SchemaSetup(e.to_string()))?
        .check()
        .map_err(|e| StoreError::SchemaSetup(e.to_string()))?;

    info!("records table initialized");
    Ok(())
}
