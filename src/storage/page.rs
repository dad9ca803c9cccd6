use super::error::{StorageError, StorageResult};

pub const PAGE_SIZE: usize = 8192;

pub type PageId = u32;
pub type ItemId = u16;

#[derive(Debug, Clone, PartialEq)]
pub struct PageHeader {
    pub page_id: PageId,  // Position of the page in its table file
    pub lower: u16,       // End of item pointers
    pub upper: u16,       // Start of tuple data
    pub item_count: u16,  // Count of live items
    pub slot_count: u16,  // Count of item pointers, live or deleted
}

impl PageHeader {
    // Follow Postgres Size
    pub const SIZE: usize = 24;

    pub fn new(page_id: PageId) -> Self {
        Self {
            page_id,
            lower: Self::SIZE as u16,
            upper: PAGE_SIZE as u16,
            item_count: 0,
            slot_count: 0,
        }
    }

    fn write_to(&self, bytes: &mut [u8]) {
        bytes[0..4].copy_from_slice(&self.page_id.to_le_bytes());
        bytes[4..6].copy_from_slice(&self.lower.to_le_bytes());
        bytes[6..8].copy_from_slice(&self.upper.to_le_bytes());
        bytes[8..10].copy_from_slice(&self.item_count.to_le_bytes());
        bytes[10..12].copy_from_slice(&self.slot_count.to_le_bytes());
    }

    fn read_from(bytes: &[u8]) -> Self {
        let u16_at = |at: usize| u16::from_le_bytes([bytes[at], bytes[at + 1]]);
        Self {
            page_id: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            lower: u16_at(4),
            upper: u16_at(6),
            item_count: u16_at(8),
            slot_count: u16_at(10),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemPointer {
    pub offset: u16, // Offset from start of page
    pub length: u16, // Length of tuple
    pub flags: u8,   // Status flags (live/dead)
}

impl ItemPointer {
    /// On-page width: offset, length, flags.
    pub const SIZE: usize = 5;

    const DELETED_FLAG: u8 = 0b0000_0001; // Bit 0

    pub fn is_deleted(&self) -> bool {
        self.flags & Self::DELETED_FLAG != 0
    }

    pub fn mark_deleted(&mut self) {
        self.flags |= Self::DELETED_FLAG;
    }
}

/// A slotted heap page.
///
/// Item pointers grow up from the header, tuple data grows down from the end
/// of the page. Deleting an item only flags its pointer, so item ids stay
/// stable for the lifetime of the page.
#[derive(Debug, Clone)]
pub struct Page {
    pub header: PageHeader,
    pub item_pointers: Vec<ItemPointer>,
    pub data: [u8; PAGE_SIZE - PageHeader::SIZE],
}

impl Page {
    /// The largest record a single empty page can hold.
    pub const MAX_RECORD_SIZE: usize = PAGE_SIZE - PageHeader::SIZE - ItemPointer::SIZE;

    pub fn new(page_id: PageId) -> Self {
        Self {
            header: PageHeader::new(page_id),
            item_pointers: Vec::new(),
            data: [0; PAGE_SIZE - PageHeader::SIZE],
        }
    }

    pub fn page_id(&self) -> PageId {
        self.header.page_id
    }

    pub fn free_space(&self) -> usize {
        (self.header.upper - self.header.lower) as usize
    }

    /// Whether a record of `len` bytes, plus its item pointer, fits.
    pub fn fits(&self, len: usize) -> bool {
        self.free_space() >= len + ItemPointer::SIZE
    }

    pub fn add_data(&mut self, data: &[u8]) -> StorageResult<ItemId> {
        if !self.fits(data.len()) {
            return Err(StorageError::PageFull {
                page_id: self.page_id(),
            });
        }

        self.header.upper -= data.len() as u16;
        let data_offset = self.header.upper as usize - PageHeader::SIZE;
        self.data[data_offset..data_offset + data.len()].copy_from_slice(data);

        self.item_pointers.push(ItemPointer {
            offset: self.header.upper,
            length: data.len() as u16,
            flags: 0,
        });

        let item_id = self.header.slot_count;

        self.header.lower += ItemPointer::SIZE as u16;
        self.header.slot_count += 1;
        self.header.item_count += 1;

        Ok(item_id)
    }

    /// Number of slots, including deleted ones.
    pub fn slot_count(&self) -> usize {
        self.item_pointers.len()
    }

    pub fn is_live(&self, item_id: ItemId) -> bool {
        self.item_pointers
            .get(item_id as usize)
            .is_some_and(|pointer| !pointer.is_deleted())
    }

    pub fn get_item(&self, item_id: ItemId) -> StorageResult<&[u8]> {
        let pointer = self.live_pointer(item_id)?;

        let start = pointer.offset as usize - PageHeader::SIZE;
        let end = start + pointer.length as usize;

        Ok(&self.data[start..end])
    }

    pub fn delete_item(&mut self, item_id: ItemId) -> StorageResult<()> {
        self.live_pointer(item_id)?;

        self.item_pointers[item_id as usize].mark_deleted();
        self.header.item_count -= 1;

        Ok(())
    }

    fn live_pointer(&self, item_id: ItemId) -> StorageResult<ItemPointer> {
        let page_id = self.page_id();
        let pointer = self
            .item_pointers
            .get(item_id as usize)
            .copied()
            .ok_or(StorageError::ItemNotFound { page_id, item_id })?;

        if pointer.is_deleted() {
            return Err(StorageError::RecordDeleted { page_id, item_id });
        }

        Ok(pointer)
    }

    /// Serializes the page into its on-disk image.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; PAGE_SIZE];
        self.header.write_to(&mut bytes[..PageHeader::SIZE]);
        bytes[PageHeader::SIZE..].copy_from_slice(&self.data);

        for (i, pointer) in self.item_pointers.iter().enumerate() {
            let at = PageHeader::SIZE + i * ItemPointer::SIZE;
            bytes[at..at + 2].copy_from_slice(&pointer.offset.to_le_bytes());
            bytes[at + 2..at + 4].copy_from_slice(&pointer.length.to_le_bytes());
            bytes[at + 4] = pointer.flags;
        }

        bytes
    }

    /// Rebuilds a page from its on-disk image.
    ///
    /// `table` only labels the error when the image is malformed.
    pub fn from_bytes(table: &str, bytes: &[u8]) -> StorageResult<Self> {
        let corrupt = |reason: String| StorageError::Corrupt {
            table: table.to_owned(),
            reason,
        };

        if bytes.len() != PAGE_SIZE {
            return Err(corrupt(format!(
                "page image is {} bytes, expected {PAGE_SIZE}",
                bytes.len()
            )));
        }

        let header = PageHeader::read_from(&bytes[..PageHeader::SIZE]);
        let slots = header.slot_count as usize;
        let expected_lower = PageHeader::SIZE + slots * ItemPointer::SIZE;
        if header.lower as usize != expected_lower
            || header.upper < header.lower
            || header.upper as usize > PAGE_SIZE
        {
            return Err(corrupt(format!(
                "page {} has an invalid layout (lower {}, upper {}, slots {slots})",
                header.page_id, header.lower, header.upper
            )));
        }

        let mut item_pointers = Vec::with_capacity(slots);
        for i in 0..slots {
            let at = PageHeader::SIZE + i * ItemPointer::SIZE;
            let pointer = ItemPointer {
                offset: u16::from_le_bytes([bytes[at], bytes[at + 1]]),
                length: u16::from_le_bytes([bytes[at + 2], bytes[at + 3]]),
                flags: bytes[at + 4],
            };
            if (pointer.offset as usize) < header.upper as usize
                || pointer.offset as usize + pointer.length as usize > PAGE_SIZE
            {
                return Err(corrupt(format!(
                    "item {i} on page {} points outside the tuple area",
                    header.page_id
                )));
            }
            item_pointers.push(pointer);
        }

        let live = item_pointers.iter().filter(|p| !p.is_deleted()).count();
        if live != header.item_count as usize {
            return Err(corrupt(format!(
                "page {} counts {} live item(s) but holds {live}",
                header.page_id, header.item_count
            )));
        }

        let mut page = Page::new(header.page_id);
        page.data.copy_from_slice(&bytes[PageHeader::SIZE..]);
        // The in-memory data area does not carry the slot directory.
        page.data[..slots * ItemPointer::SIZE].fill(0);
        page.header = header;
        page.item_pointers = item_pointers;

        Ok(page)
    }
}
