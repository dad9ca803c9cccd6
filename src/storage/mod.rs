//! The storage interface the catalog is built on, and a heap-file
//! implementation of it.
//!
//! The catalog never touches pages directly. It opens scans with at most one
//! predicate, reads and deletes through the scan cursor, and appends through
//! an insert handle. Handles borrow the storage and are released when they
//! are dropped, so every exit path closes them.

use std::fmt;

pub mod error;
pub mod heap;
pub mod page;
pub mod scan;

pub use error::{StorageError, StorageResult};
pub use heap::HeapStorage;
pub use page::{ItemId, PageId};
pub use scan::{CompareOp, ScanPredicate};

/// Physical location of a record: page and slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId {
    pub page_id: PageId,
    pub slot: ItemId,
}

impl RecordId {
    pub fn new(page_id: PageId, slot: ItemId) -> Self {
        Self { page_id, slot }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.page_id, self.slot)
    }
}

/// A named-table record store.
pub trait Storage {
    type Scan<'a>: ScanCursor
    where
        Self: 'a;

    type Inserter<'a>: RecordInserter
    where
        Self: 'a;

    /// Opens a scan over `table`, restricted to records matching
    /// `predicate` when one is given.
    fn open_scan(
        &mut self,
        table: &str,
        predicate: Option<ScanPredicate>,
    ) -> StorageResult<Self::Scan<'_>>;

    /// Opens an append handle on `table`.
    fn open_insert(&mut self, table: &str) -> StorageResult<Self::Inserter<'_>>;

    /// Creates the physical file for a new, empty table.
    fn create_table(&mut self, name: &str) -> StorageResult<()>;

    /// Destroys a table and its physical file.
    fn destroy_table(&mut self, name: &str) -> StorageResult<()>;

    fn table_exists(&self, name: &str) -> bool;
}

/// A cursor over the records of one table.
pub trait ScanCursor {
    /// Advances to the next matching record. `Ok(None)` is end of data.
    fn scan_next(&mut self) -> StorageResult<Option<RecordId>>;

    /// Raw bytes of the record the cursor is positioned on.
    fn record(&self) -> StorageResult<&[u8]>;

    /// Deletes the record the cursor is positioned on.
    ///
    /// The cursor stays valid and continues from the next slot.
    fn delete_record(&mut self) -> StorageResult<()>;

    /// Ends the scan. Dropping the cursor has the same effect.
    fn close(self)
    where
        Self: Sized,
    {
        drop(self);
    }
}

/// An append handle on one table.
pub trait RecordInserter {
    fn insert_record(&mut self, record: &[u8]) -> StorageResult<RecordId>;
}
