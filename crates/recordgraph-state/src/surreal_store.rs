//! SurrealDB-backed RecordStore implementation
//!
//! Every record class lives in the single `records` table; the encoded
//! payload is kept as an object in the `fields` column so equality lookups
//! can address `fields.<name>` directly.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::{Database, Root};
use surrealdb::sql::Datetime as SurrealDatetime;
use surrealdb::Surreal;
use tracing::{debug, info, instrument};

use crate::config::{CloudConfig, StoreConfig};
use crate::error::StoreError;
use crate::migrations;
use crate::query::Query;
use crate::storage_traits::{new_object_id, JsonMap, RecordStore, StorageResult, StoredRecord};

/// Serialize chrono DateTime as a SurrealDB datetime
mod surreal_datetime {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let sd = SurrealDatetime::from(*date);
        serde::Serialize::serialize(&sd, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = SurrealDatetime::deserialize(deserializer)?;
        Ok(DateTime::from(sd))
    }
}

/// Row of the `records` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DbRecordRow {
    class_name: String,
    object_id: String,
    fields: serde_json::Value,
    #[serde(with = "surreal_datetime")]
    created_at: DateTime<Utc>,
    #[serde(with = "surreal_datetime")]
    updated_at: DateTime<Utc>,
}

impl DbRecordRow {
    fn into_stored(self) -> StorageResult<StoredRecord> {
        let fields = match self.fields {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => JsonMap::new(),
            other => {
                return Err(StoreError::Backend(format!(
                    "record {} has non-object payload: {other}",
                    self.object_id
                )))
            }
        };
        Ok(StoredRecord {
            class_name: self.class_name,
            object_id: self.object_id,
            fields,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn backend(e: surrealdb::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

/// SurrealDB-backed implementation of [`RecordStore`].
pub struct SurrealRecordStore {
    db: Surreal<Any>,
}

impl SurrealRecordStore {
    /// Create an in-memory instance for testing.
    pub async fn in_memory() -> StorageResult<Self> {
        Self::connect(&StoreConfig::in_memory()).await
    }

    /// Create from environment variables (see [`StoreConfig::from_env`]).
    pub async fn from_env() -> StorageResult<Self> {
        Self::connect(&StoreConfig::from_env()).await
    }

    /// Connect, authenticate if needed, select namespace/database and run
    /// `init_schema`.
    #[instrument(skip_all, fields(endpoint = %config.endpoint()))]
    pub async fn connect(config: &StoreConfig) -> StorageResult<Self> {
        let db = match config {
            StoreConfig::Cloud(cloud) => Self::connect_cloud(cloud).await?,
            StoreConfig::Url {
                url,
                namespace,
                database,
            } => {
                let db = surrealdb::engine::any::connect(url.as_str())
                    .await
                    .map_err(|e| {
                        StoreError::Connection(format!("Failed to connect to {}: {}", url, e))
                    })?;
                db.use_ns(namespace.as_str())
                    .use_db(database.as_str())
                    .await
                    .map_err(|e| StoreError::Connection(e.to_string()))?;
                db
            }
        };

        migrations::init_schema(&db).await?;
        info!("SurrealRecordStore connected ({})", config.endpoint());
        Ok(Self { db })
    }

    async fn connect_cloud(config: &CloudConfig) -> StorageResult<Surreal<Any>> {
        let db = surrealdb::engine::any::connect(config.endpoint.as_str())
            .await
            .map_err(|e| {
                StoreError::Connection(format!("Failed to connect to {}: {}", config.endpoint, e))
            })?;

        if config.is_root {
            db.signin(Root {
                username: &config.username,
                password: &config.password,
            })
            .await
            .map_err(|e| StoreError::Connection(format!("Root auth failed: {e}")))?;
        } else {
            db.signin(Database {
                namespace: &config.namespace,
                database: &config.database,
                username: &config.username,
                password: &config.password,
            })
            .await
            .map_err(|e| StoreError::Connection(format!("DB auth failed: {e}")))?;
        }

        db.use_ns(config.namespace.as_str())
            .use_db(config.database.as_str())
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        Ok(db)
    }

    async fn select_one(&self, class_name: &str, object_id: &str) -> StorageResult<DbRecordRow> {
        let mut res = self
            .db
            .query("SELECT * FROM records WHERE class_name = $class AND object_id = $oid")
            .bind(("class", class_name.to_string()))
            .bind(("oid", object_id.to_string()))
            .await
            .map_err(backend)?;

        let rows: Vec<DbRecordRow> = res.take(0).map_err(backend)?;
        rows.into_iter()
            .next()
            .ok_or_else(|| StoreError::RecordNotFound {
                class_name: class_name.to_string(),
                object_id: object_id.to_string(),
            })
    }
}

#[async_trait]
impl RecordStore for SurrealRecordStore {
    async fn insert(&self, class_name: &str, fields: JsonMap) -> StorageResult<StoredRecord> {
        let now = Utc::now();
        let row = DbRecordRow {
            class_name: class_name.to_string(),
            object_id: new_object_id(),
            fields: serde_json::Value::Object(fields),
            created_at: now,
            updated_at: now,
        };

        debug!(class = %class_name, object_id = %row.object_id, "inserting record");

        let _created: Option<DbRecordRow> = self
            .db
            .create("records")
            .content(row.clone())
            .await
            .map_err(backend)?;

        row.into_stored()
    }

    async fn update(
        &self,
        class_name: &str,
        object_id: &str,
        fields: JsonMap,
    ) -> StorageResult<StoredRecord> {
        let existing = self.select_one(class_name, object_id).await?;
        let updated = DbRecordRow {
            fields: serde_json::Value::Object(fields),
            updated_at: Utc::now(),
            ..existing
        };

        debug!(class = %class_name, object_id = %object_id, "updating record");

        self.db
            .query(
                "UPDATE records SET fields = $fields, updated_at = $updated_at \
                 WHERE class_name = $class AND object_id = $oid",
            )
            .bind(("fields", updated.fields.clone()))
            .bind(("updated_at", SurrealDatetime::from(updated.updated_at)))
            .bind(("class", class_name.to_string()))
            .bind(("oid", object_id.to_string()))
            .await
            .map_err(backend)?
            .check()
            .map_err(backend)?;

        updated.into_stored()
    }

    async fn get(&self, class_name: &str, object_id: &str) -> StorageResult<StoredRecord> {
        self.select_one(class_name, object_id).await?.into_stored()
    }

    async fn find(&self, query: &Query) -> StorageResult<Vec<StoredRecord>> {
        let constraints = query.encoded_constraints()?;

        let mut sql = String::from("SELECT * FROM records WHERE class_name = $class");
        for i in 0..constraints.len() {
            sql.push_str(&format!(" AND type::field($f{i}) = $v{i}"));
        }
        sql.push_str(" ORDER BY created_at ASC");
        if let Some(limit) = query.max_results() {
            sql.push_str(&format!(" LIMIT {limit}"));
        }

        let mut request = self
            .db
            .query(sql)
            .bind(("class", query.class_name().to_string()));
        for (i, (field, value)) in constraints.into_iter().enumerate() {
            request = request
                .bind((format!("f{i}"), format!("fields.{field}")))
                .bind((format!("v{i}"), value));
        }

        let mut res = request.await.map_err(backend)?;
        let rows: Vec<DbRecordRow> = res.take(0).map_err(backend)?;
        rows.into_iter().map(DbRecordRow::into_stored).collect()
    }

    async fn delete(&self, class_name: &str, object_id: &str) -> StorageResult<()> {
        self.db
            .query("DELETE records WHERE class_name = $class AND object_id = $oid")
            .bind(("class", class_name.to_string()))
            .bind(("oid", object_id.to_string()))
            .await
            .map_err(backend)?
            .check()
            .map_err(backend)?;
        Ok(())
    }
}
