use std::{
    collections::BTreeMap,
    fs::{self, OpenOptions},
    io::{ErrorKind, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use tracing::{debug, trace};

use super::{
    RecordId, RecordInserter, ScanCursor, Storage,
    error::{StorageError, StorageResult},
    page::{ItemId, PAGE_SIZE, Page, PageId},
    scan::ScanPredicate,
};

const TABLE_EXTENSION: &str = "table";

/// The pages of one table, in page-id order.
#[derive(Debug, Default)]
struct HeapFile {
    pages: Vec<Page>,
}

impl HeapFile {
    fn record_count(&self) -> usize {
        self.pages
            .iter()
            .map(|page| page.header.item_count as usize)
            .sum()
    }
}

/// Heap-file storage made of slotted pages.
///
/// Pages live in memory. When a data directory is configured every table is
/// backed by `<dir>/<table>.table` and each page mutation is written through
/// to it, so reopening the directory restores every table.
#[derive(Debug, Default)]
pub struct HeapStorage {
    tables: BTreeMap<String, HeapFile>,

    /// Directory holding the table files, `None` when purely in memory.
    data_directory: Option<PathBuf>,

    /// Scan cursors currently alive.
    open_scans: usize,
}

impl HeapStorage {
    /// Creates an empty storage that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens (creating if needed) a data directory and loads every table
    /// file found in it.
    pub fn open<P: AsRef<Path>>(data_directory: P) -> StorageResult<Self> {
        let data_dir = data_directory.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir)?;

        let mut tables = BTreeMap::new();
        for entry in fs::read_dir(&data_dir)? {
            let path = entry?.path();

            if path.extension().and_then(|s| s.to_str()) != Some(TABLE_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let file = Self::load_table(name, &path)?;
            tables.insert(name.to_owned(), file);
        }

        debug!(dir = %data_dir.display(), tables = tables.len(), "opened heap storage");

        Ok(Self {
            tables,
            data_directory: Some(data_dir),
            open_scans: 0,
        })
    }

    pub fn data_directory(&self) -> Option<&Path> {
        self.data_directory.as_deref()
    }

    /// Number of scan cursors that have been opened and not yet released.
    pub fn open_scans(&self) -> usize {
        self.open_scans
    }

    /// Number of live records in `table`.
    pub fn record_count(&self, table: &str) -> StorageResult<usize> {
        self.tables
            .get(table)
            .map(HeapFile::record_count)
            .ok_or_else(|| StorageError::TableNotFound {
                table: table.to_owned(),
            })
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    fn load_table(name: &str, path: &Path) -> StorageResult<HeapFile> {
        let bytes = fs::read(path)?;
        if bytes.len() % PAGE_SIZE != 0 {
            return Err(StorageError::Corrupt {
                table: name.to_owned(),
                reason: format!("file length {} is not a whole number of pages", bytes.len()),
            });
        }

        let mut pages = Vec::with_capacity(bytes.len() / PAGE_SIZE);
        for (i, chunk) in bytes.chunks_exact(PAGE_SIZE).enumerate() {
            let page = Page::from_bytes(name, chunk)?;
            if page.page_id() as usize != i {
                return Err(StorageError::Corrupt {
                    table: name.to_owned(),
                    reason: format!("page {i} carries id {}", page.page_id()),
                });
            }
            pages.push(page);
        }

        trace!(table = name, pages = pages.len(), "loaded table");
        Ok(HeapFile { pages })
    }

    fn table_path(dir: &Path, name: &str) -> PathBuf {
        dir.join(format!("{name}.{TABLE_EXTENSION}"))
    }

    fn validate_name(name: &str) -> StorageResult<()> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\', '\0']) {
            return Err(StorageError::InvalidTableName {
                table: name.to_owned(),
            });
        }
        Ok(())
    }
}

/// Writes one page image at its position in the table file.
fn write_page(path: Option<&Path>, page: &Page) -> StorageResult<()> {
    let Some(path) = path else {
        return Ok(());
    };

    let mut file = OpenOptions::new().write(true).open(path)?;
    file.seek(SeekFrom::Start(page.page_id() as u64 * PAGE_SIZE as u64))?;
    file.write_all(&page.to_bytes())?;

    Ok(())
}

impl Storage for HeapStorage {
    type Scan<'a>
        = HeapScan<'a>
    where
        Self: 'a;

    type Inserter<'a>
        = HeapInserter<'a>
    where
        Self: 'a;

    fn open_scan(
        &mut self,
        table: &str,
        predicate: Option<ScanPredicate>,
    ) -> StorageResult<HeapScan<'_>> {
        let Self {
            tables,
            data_directory,
            open_scans,
        } = self;

        let file = tables
            .get_mut(table)
            .ok_or_else(|| StorageError::TableNotFound {
                table: table.to_owned(),
            })?;

        *open_scans += 1;
        trace!(table, open_scans = *open_scans, "opened scan");

        Ok(HeapScan {
            file,
            path: data_directory
                .as_deref()
                .map(|dir| Self::table_path(dir, table)),
            predicate,
            page_index: 0,
            next_slot: 0,
            current: None,
            open_scans,
        })
    }

    fn open_insert(&mut self, table: &str) -> StorageResult<HeapInserter<'_>> {
        let path = self
            .data_directory
            .as_deref()
            .map(|dir| Self::table_path(dir, table));

        let file = self
            .tables
            .get_mut(table)
            .ok_or_else(|| StorageError::TableNotFound {
                table: table.to_owned(),
            })?;

        Ok(HeapInserter {
            table: table.to_owned(),
            file,
            path,
        })
    }

    fn create_table(&mut self, name: &str) -> StorageResult<()> {
        Self::validate_name(name)?;

        if self.tables.contains_key(name) {
            return Err(StorageError::TableExists {
                table: name.to_owned(),
            });
        }

        if let Some(dir) = &self.data_directory {
            let path = Self::table_path(dir, name);
            OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .map_err(|e| match e.kind() {
                    ErrorKind::AlreadyExists => StorageError::TableExists {
                        table: name.to_owned(),
                    },
                    _ => e.into(),
                })?;
        }

        self.tables.insert(name.to_owned(), HeapFile::default());
        debug!(table = name, "created table");

        Ok(())
    }

    fn destroy_table(&mut self, name: &str) -> StorageResult<()> {
        if self.tables.remove(name).is_none() {
            return Err(StorageError::TableNotFound {
                table: name.to_owned(),
            });
        }

        if let Some(dir) = &self.data_directory {
            match fs::remove_file(Self::table_path(dir, name)) {
                Err(e) if e.kind() != ErrorKind::NotFound => return Err(e.into()),
                _ => {}
            }
        }

        debug!(table = name, "destroyed table");
        Ok(())
    }

    fn table_exists(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }
}

/// Scan cursor over a [`HeapStorage`] table.
///
/// Walks pages in order and slots in order, skipping deleted items and
/// records the predicate rejects.
#[derive(Debug)]
pub struct HeapScan<'a> {
    file: &'a mut HeapFile,
    path: Option<PathBuf>,
    predicate: Option<ScanPredicate>,
    page_index: usize,
    next_slot: usize,
    current: Option<RecordId>,
    open_scans: &'a mut usize,
}

impl ScanCursor for HeapScan<'_> {
    fn scan_next(&mut self) -> StorageResult<Option<RecordId>> {
        while let Some(page) = self.file.pages.get(self.page_index) {
            while self.next_slot < page.slot_count() {
                let slot = self.next_slot as ItemId;
                self.next_slot += 1;

                if !page.is_live(slot) {
                    continue;
                }

                let record = page.get_item(slot)?;
                if self.predicate.as_ref().is_none_or(|p| p.matches(record)) {
                    let rid = RecordId::new(page.page_id(), slot);
                    self.current = Some(rid);
                    return Ok(Some(rid));
                }
            }

            self.page_index += 1;
            self.next_slot = 0;
        }

        self.current = None;
        Ok(None)
    }

    fn record(&self) -> StorageResult<&[u8]> {
        let rid = self.current.ok_or(StorageError::NoCurrentRecord)?;
        self.file.pages[rid.page_id as usize].get_item(rid.slot)
    }

    fn delete_record(&mut self) -> StorageResult<()> {
        let rid = self.current.take().ok_or(StorageError::NoCurrentRecord)?;

        let stored = &mut self.file.pages[rid.page_id as usize];
        let mut page = stored.clone();
        page.delete_item(rid.slot)?;
        write_page(self.path.as_deref(), &page)?;
        *stored = page;

        trace!(%rid, "deleted record");
        Ok(())
    }
}

impl Drop for HeapScan<'_> {
    fn drop(&mut self) {
        *self.open_scans -= 1;
    }
}

/// Append handle on a [`HeapStorage`] table.
#[derive(Debug)]
pub struct HeapInserter<'a> {
    table: String,
    file: &'a mut HeapFile,
    path: Option<PathBuf>,
}

impl RecordInserter for HeapInserter<'_> {
    fn insert_record(&mut self, record: &[u8]) -> StorageResult<RecordId> {
        if record.len() > Page::MAX_RECORD_SIZE {
            return Err(StorageError::RecordTooLarge {
                table: self.table.clone(),
                size: record.len(),
                max: Page::MAX_RECORD_SIZE,
            });
        }

        // Changes are staged on a copy and kept only once written through.
        let pages = &mut self.file.pages;
        let mut page = match pages.last() {
            Some(last) if last.fits(record.len()) => last.clone(),
            _ => Page::new(pages.len() as PageId),
        };

        let slot = page.add_data(record)?;
        write_page(self.path.as_deref(), &page)?;

        let rid = RecordId::new(page.page_id(), slot);
        match pages.get_mut(page.page_id() as usize) {
            Some(existing) => *existing = page,
            None => pages.push(page),
        }
        trace!(table = %self.table, %rid, "inserted record");

        Ok(rid)
    }
}
