//! A relational system catalog.
//!
//! Relations and their attributes are described by two ordinary tables,
//! `relcat` and `attrcat`, stored through the same [`Storage`] interface as
//! user data. [`Database`] opens storage, bootstraps the catalogs and hands
//! out the [`RelationLifecycle`] and [`SchemaInspector`] that operate on them.

pub mod catalog;
pub mod common;
pub(crate) mod core;
pub mod db;
pub mod storage;

pub use catalog::{
    AttributeCatalog, AttributeDescriptor, AttributeSpec, CatalogReport, RelationCatalog,
    RelationDescriptor, RelationLifecycle, RelationReport, RelationSummary, SchemaInspector,
};
pub use common::error::{CatalogError, CatalogResult};
pub use crate::core::types::AttrType;
pub use db::{config::DatabaseConfig, database::Database};
pub use storage::{
    HeapStorage, RecordId, RecordInserter, ScanCursor, ScanPredicate, Storage, StorageError,
};
