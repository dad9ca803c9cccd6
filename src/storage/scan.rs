use std::cmp::Ordering;

use strum::Display;

use super::error::{StorageError, StorageResult};
use crate::core::types::AttrType;

/// Comparison applied by a [`ScanPredicate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum CompareOp {
    #[strum(to_string = "=")]
    Eq,
    #[strum(to_string = "!=")]
    Ne,
    #[strum(to_string = "<")]
    Lt,
    #[strum(to_string = "<=")]
    Lte,
    #[strum(to_string = ">")]
    Gt,
    #[strum(to_string = ">=")]
    Gte,
}

impl CompareOp {
    /// Whether a field comparing to the target as `ordering` passes.
    pub fn accepts(self, ordering: Ordering) -> bool {
        match self {
            CompareOp::Eq => ordering == Ordering::Equal,
            CompareOp::Ne => ordering != Ordering::Equal,
            CompareOp::Lt => ordering == Ordering::Less,
            CompareOp::Lte => ordering != Ordering::Greater,
            CompareOp::Gt => ordering == Ordering::Greater,
            CompareOp::Gte => ordering != Ordering::Less,
        }
    }
}

/// A single-field filter evaluated by the storage layer during a scan.
///
/// The field is the byte range `offset..offset + length` of each record,
/// interpreted as `attr_type` and compared against `value`. Only one
/// predicate is supported per scan; conjunctions are left to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanPredicate {
    offset: usize,
    length: usize,
    attr_type: AttrType,
    value: Vec<u8>,
    op: CompareOp,
}

impl ScanPredicate {
    pub fn new(
        offset: usize,
        attr_type: AttrType,
        value: impl Into<Vec<u8>>,
        op: CompareOp,
    ) -> StorageResult<Self> {
        let value = value.into();
        let length = value.len();

        if length == 0 {
            return Err(StorageError::InvalidPredicate {
                reason: "predicate value is empty".to_string(),
            });
        }
        if matches!(attr_type, AttrType::Integer | AttrType::Float) && length != 4 {
            return Err(StorageError::InvalidPredicate {
                reason: format!("{attr_type} predicates compare 4 bytes, got {length}"),
            });
        }
        if offset.checked_add(length).is_none() {
            return Err(StorageError::InvalidPredicate {
                reason: format!("field at offset {offset} overflows"),
            });
        }

        Ok(Self {
            offset,
            length,
            attr_type,
            value,
            op,
        })
    }

    /// Equality on the field at `offset`, the common case.
    pub fn equals(
        offset: usize,
        attr_type: AttrType,
        value: impl Into<Vec<u8>>,
    ) -> StorageResult<Self> {
        Self::new(offset, attr_type, value, CompareOp::Eq)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn op(&self) -> CompareOp {
        self.op
    }

    /// Evaluates the predicate against a raw record.
    ///
    /// Records too short to contain the field never match. A float field
    /// that is NaN matches nothing.
    pub fn matches(&self, record: &[u8]) -> bool {
        let Some(field) = record.get(self.offset..self.offset + self.length) else {
            return false;
        };

        let ordering = match self.attr_type {
            AttrType::String => Some(field.cmp(self.value.as_slice())),
            AttrType::Integer => Some(Self::as_i32(field).cmp(&Self::as_i32(&self.value))),
            AttrType::Float => Self::as_f32(field).partial_cmp(&Self::as_f32(&self.value)),
        };

        ordering.is_some_and(|ordering| self.op.accepts(ordering))
    }

    fn as_i32(bytes: &[u8]) -> i32 {
        i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }

    fn as_f32(bytes: &[u8]) -> f32 {
        f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn record(id: i32, score: f32, tag: &[u8; 4]) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&id.to_le_bytes());
        bytes.extend_from_slice(&score.to_le_bytes());
        bytes.extend_from_slice(tag);
        bytes
    }

    #[test]
    fn test_string_equality_is_bytewise() {
        let pred = ScanPredicate::equals(8, AttrType::String, b"abcd".to_vec()).unwrap();
        assert_eq!((pred.offset(), pred.length(), pred.op()), (8, 4, CompareOp::Eq));
        assert!(pred.matches(&record(1, 0.0, b"abcd")));
        assert!(!pred.matches(&record(1, 0.0, b"abcD")));
    }

    #[test]
    fn test_integer_ordering_is_numeric() {
        let pred = ScanPredicate::new(0, AttrType::Integer, 10i32.to_le_bytes(), CompareOp::Gt)
            .unwrap();
        assert!(pred.matches(&record(256, 0.0, b"....")));
        assert!(!pred.matches(&record(-5, 0.0, b"....")));
        assert!(!pred.matches(&record(10, 0.0, b"....")));

        let pred = ScanPredicate::new(0, AttrType::Integer, 10i32.to_le_bytes(), CompareOp::Lte)
            .unwrap();
        assert!(pred.matches(&record(-5, 0.0, b"....")));
        assert!(pred.matches(&record(10, 0.0, b"....")));
    }

    #[test]
    fn test_float_comparison() {
        let pred = ScanPredicate::new(4, AttrType::Float, 1.5f32.to_le_bytes(), CompareOp::Ne)
            .unwrap();
        assert!(pred.matches(&record(0, 2.0, b"....")));
        assert!(!pred.matches(&record(0, 1.5, b"....")));
        assert!(!pred.matches(&record(0, f32::NAN, b"....")));
    }

    #[test]
    fn test_short_record_never_matches() {
        let pred = ScanPredicate::equals(8, AttrType::String, b"abcd".to_vec()).unwrap();
        assert!(!pred.matches(&[0u8; 10]));
    }

    #[test]
    fn test_invalid_predicates() {
        assert!(matches!(
            ScanPredicate::equals(0, AttrType::String, Vec::new()),
            Err(StorageError::InvalidPredicate { .. })
        ));
        assert!(matches!(
            ScanPredicate::equals(0, AttrType::Integer, vec![1, 2]),
            Err(StorageError::InvalidPredicate { .. })
        ));
    }

    #[test]
    fn test_operator_symbols() {
        assert_eq!(CompareOp::Eq.to_string(), "=");
        assert_eq!(CompareOp::Gte.to_string(), ">=");
    }
}
