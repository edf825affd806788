//! RecordGraph State: the remote record store boundary
//!
//! This crate provides the generic record model and the persistence layer
//! the RecordGraph save engine writes through.
//!
//! ## Key Components
//!
//! - `Record` / `RecordHandle`: dynamically typed key/value records
//! - `Relation`: ordered references from one record field to other records
//! - `Query`: equality lookups (`where_equal_to`, first-or-default)
//! - `Session`: create-empty / commit / lookup against a `RecordStore`
//! - `SurrealRecordStore`: SurrealDB backend; `fakes::MemoryRecordStore` for tests

mod config;
pub mod encoding;
mod error;
pub mod fakes;
pub mod migrations;
mod query;
mod record;
mod session;
pub mod storable;
pub mod storage_traits;
pub mod surreal_store;
mod value;

pub use config::{CloudConfig, StoreConfig, DEFAULT_DATABASE, DEFAULT_NAMESPACE};
pub use error::StoreError;
pub use query::{Constraint, Query};
pub use record::{Record, RecordHandle, Relation, RelationMember, RelationRef};
pub use session::Session;
pub use storage_traits::{JsonMap, RecordStore, StorageResult, StoredRecord};
pub use surreal_store::SurrealRecordStore;
pub use value::{Pointer, Value};
