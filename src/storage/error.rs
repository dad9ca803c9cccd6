//! Storage layer errors.

use std::io;

use miette::Diagnostic;
use thiserror::Error;

use super::page::{ItemId, PageId};

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised by a [`Storage`](super::Storage) implementation.
///
/// Reaching the end of a scan is not an error; `scan_next` reports it as
/// `Ok(None)`.
#[derive(Debug, Error, Diagnostic)]
pub enum StorageError {
    #[error("table `{table}` does not exist")]
    #[diagnostic(code(storage::table_not_found))]
    TableNotFound { table: String },

    #[error("table `{table}` already exists")]
    #[diagnostic(code(storage::table_exists))]
    TableExists { table: String },

    #[error("`{table}` cannot be used as a table name")]
    #[diagnostic(
        code(storage::invalid_table_name),
        help("table names become file names and may not contain path separators")
    )]
    InvalidTableName { table: String },

    #[error("record of {size} bytes does not fit a page of table `{table}` (max {max})")]
    #[diagnostic(code(storage::record_too_large))]
    RecordTooLarge {
        table: String,
        size: usize,
        max: usize,
    },

    #[error("page {page_id} has no room for another record")]
    #[diagnostic(code(storage::page_full))]
    PageFull { page_id: PageId },

    /// `record` or `delete_record` was called without a current record.
    #[error("scan cursor is not positioned on a record")]
    #[diagnostic(code(storage::no_current_record))]
    NoCurrentRecord,

    #[error("item {item_id} does not exist on page {page_id}")]
    #[diagnostic(code(storage::item_not_found))]
    ItemNotFound { page_id: PageId, item_id: ItemId },

    #[error("item {item_id} on page {page_id} is deleted")]
    #[diagnostic(code(storage::record_deleted))]
    RecordDeleted { page_id: PageId, item_id: ItemId },

    #[error("invalid scan predicate: {reason}")]
    #[diagnostic(code(storage::invalid_predicate))]
    InvalidPredicate { reason: String },

    #[error("table `{table}` is corrupt: {reason}")]
    #[diagnostic(code(storage::corrupt))]
    Corrupt { table: String, reason: String },

    #[error("I/O error: {source}")]
    #[diagnostic(code(storage::io))]
    Io {
        #[from]
        source: io::Error,
    },
}
