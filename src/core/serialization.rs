use crate::storage::{StorageError, StorageResult};

/// Internal trait for serializing fixed-size tuples to bytes.
///
/// Catalog descriptors are stored as fixed-layout records, so every
/// implementor knows its exact width at compile time.
pub(crate) trait Serializable<const N: usize>: Sized {
    /// Convert this value to a fixed-size byte array.
    fn to_bytes(&self) -> [u8; N];

    /// Reconstruct this value from a fixed-size byte array.
    ///
    /// Fails when the bytes do not describe a valid value, e.g. an unknown
    /// type code.
    fn from_bytes(data: &[u8; N]) -> StorageResult<Self>;

    /// Reconstruct this value from a record of unchecked length.
    fn from_record(table: &str, record: &[u8]) -> StorageResult<Self> {
        let data: &[u8; N] = record.try_into().map_err(|_| StorageError::Corrupt {
            table: table.to_owned(),
            reason: format!("expected a {N}-byte tuple, found {} bytes", record.len()),
        })?;
        Self::from_bytes(data)
    }
}

/// Reads a little-endian `i32` at `offset`.
pub(crate) fn read_i32(data: &[u8], offset: usize) -> i32 {
    let mut bytes = [0u8; 4];
    bytes.copy_from_slice(&data[offset..offset + 4]);
    i32::from_le_bytes(bytes)
}

/// Writes a little-endian `i32` at `offset`.
pub(crate) fn write_i32(data: &mut [u8], offset: usize, value: i32) {
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}
