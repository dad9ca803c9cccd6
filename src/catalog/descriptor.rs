use crate::{
    common::error::{CatalogError, CatalogResult},
    core::{
        serialization::{Serializable, read_i32, write_i32},
        types::AttrType,
    },
    storage::{StorageError, StorageResult},
};

/// Width of the fixed name field in catalog tuples.
///
/// Names are NUL padded, so the longest storable name is one byte shorter.
pub const MAX_NAME: usize = 32;

/// Reserved name of the relation catalog table.
pub const RELCAT_NAME: &str = "relcat";

/// Reserved name of the attribute catalog table.
pub const ATTRCAT_NAME: &str = "attrcat";

/// Validates a relation or attribute name and returns its padded field
/// image.
///
/// `kind` only labels the error ("relation", "attribute").
pub(crate) fn name_field(kind: &str, name: &str) -> CatalogResult<[u8; MAX_NAME]> {
    if name.is_empty() {
        return Err(CatalogError::invalid(format!("{kind} name is empty")));
    }
    if name.contains('\0') {
        return Err(CatalogError::invalid(format!(
            "{kind} name {name:?} contains a NUL byte"
        )));
    }
    if name.len() >= MAX_NAME {
        return Err(CatalogError::NameTooLong {
            name: name.to_owned(),
            len: name.len(),
            max: MAX_NAME - 1,
        });
    }

    let mut field = [0u8; MAX_NAME];
    field[..name.len()].copy_from_slice(name.as_bytes());
    Ok(field)
}

fn write_name(data: &mut [u8], offset: usize, name: &str) {
    let len = name.len().min(MAX_NAME - 1);
    data[offset..offset + len].copy_from_slice(&name.as_bytes()[..len]);
}

fn read_name(table: &str, data: &[u8], offset: usize) -> StorageResult<String> {
    let field = &data[offset..offset + MAX_NAME];
    let len = field.iter().position(|&b| b == 0).unwrap_or(MAX_NAME);

    std::str::from_utf8(&field[..len])
        .map(str::to_owned)
        .map_err(|e| StorageError::Corrupt {
            table: table.to_owned(),
            reason: format!("name field at offset {offset} is not UTF-8: {e}"),
        })
}

fn read_count(table: &str, data: &[u8], offset: usize, field: &str) -> StorageResult<usize> {
    let value = read_i32(data, offset);
    usize::try_from(value).map_err(|_| StorageError::Corrupt {
        table: table.to_owned(),
        reason: format!("{field} is negative ({value})"),
    })
}

/// One tuple of the relation catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDescriptor {
    /// Relation name, unique and case-sensitive.
    pub name: String,

    /// Number of attribute tuples describing this relation.
    pub attribute_count: usize,
}

impl RelationDescriptor {
    pub const SIZE: usize = 36;
    pub const NAME_OFFSET: usize = 0;
    pub const ATTRIBUTE_COUNT_OFFSET: usize = 32;

    pub fn new(name: &str, attribute_count: usize) -> Self {
        Self {
            name: name.to_owned(),
            attribute_count,
        }
    }

    /// The relation catalog's own schema, as registered at bootstrap.
    pub fn catalog_schema() -> Vec<AttributeSpec> {
        vec![
            AttributeSpec::new("relName", AttrType::String, MAX_NAME),
            AttributeSpec::new("attrCnt", AttrType::Integer, 4),
        ]
    }
}

impl Serializable<{ RelationDescriptor::SIZE }> for RelationDescriptor {
    fn to_bytes(&self) -> [u8; RelationDescriptor::SIZE] {
        let mut data = [0u8; Self::SIZE];
        write_name(&mut data, Self::NAME_OFFSET, &self.name);
        write_i32(
            &mut data,
            Self::ATTRIBUTE_COUNT_OFFSET,
            self.attribute_count as i32,
        );
        data
    }

    fn from_bytes(data: &[u8; RelationDescriptor::SIZE]) -> StorageResult<Self> {
        Ok(Self {
            name: read_name(RELCAT_NAME, data, Self::NAME_OFFSET)?,
            attribute_count: read_count(
                RELCAT_NAME,
                data,
                Self::ATTRIBUTE_COUNT_OFFSET,
                "attrCnt",
            )?,
        })
    }
}

/// One tuple of the attribute catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeDescriptor {
    /// Owning relation.
    pub relation_name: String,

    /// Attribute name, unique within the relation.
    pub attribute_name: String,

    /// Byte offset of the attribute inside a tuple of the relation.
    pub offset: usize,

    pub attr_type: AttrType,

    /// Encoded byte length of the attribute.
    pub length: usize,
}

impl AttributeDescriptor {
    pub const SIZE: usize = 76;
    pub const RELATION_NAME_OFFSET: usize = 0;
    pub const ATTRIBUTE_NAME_OFFSET: usize = 32;
    pub const OFFSET_OFFSET: usize = 64;
    pub const TYPE_OFFSET: usize = 68;
    pub const LENGTH_OFFSET: usize = 72;

    /// The attribute catalog's own schema, as registered at bootstrap.
    pub fn catalog_schema() -> Vec<AttributeSpec> {
        vec![
            AttributeSpec::new("relName", AttrType::String, MAX_NAME),
            AttributeSpec::new("attrName", AttrType::String, MAX_NAME),
            AttributeSpec::new("attrOffset", AttrType::Integer, 4),
            AttributeSpec::new("attrType", AttrType::Integer, 4),
            AttributeSpec::new("attrLen", AttrType::Integer, 4),
        ]
    }

    /// Byte range this attribute occupies in a tuple of its relation.
    pub fn byte_range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.length
    }
}

impl Serializable<{ AttributeDescriptor::SIZE }> for AttributeDescriptor {
    fn to_bytes(&self) -> [u8; AttributeDescriptor::SIZE] {
        let mut data = [0u8; Self::SIZE];
        write_name(&mut data, Self::RELATION_NAME_OFFSET, &self.relation_name);
        write_name(&mut data, Self::ATTRIBUTE_NAME_OFFSET, &self.attribute_name);
        write_i32(&mut data, Self::OFFSET_OFFSET, self.offset as i32);
        write_i32(&mut data, Self::TYPE_OFFSET, self.attr_type.code());
        write_i32(&mut data, Self::LENGTH_OFFSET, self.length as i32);
        data
    }

    fn from_bytes(data: &[u8; AttributeDescriptor::SIZE]) -> StorageResult<Self> {
        let code = read_i32(data, Self::TYPE_OFFSET);
        let attr_type = AttrType::from_code(code).ok_or_else(|| StorageError::Corrupt {
            table: ATTRCAT_NAME.to_owned(),
            reason: format!("unknown attribute type code {code}"),
        })?;

        Ok(Self {
            relation_name: read_name(ATTRCAT_NAME, data, Self::RELATION_NAME_OFFSET)?,
            attribute_name: read_name(ATTRCAT_NAME, data, Self::ATTRIBUTE_NAME_OFFSET)?,
            offset: read_count(ATTRCAT_NAME, data, Self::OFFSET_OFFSET, "attrOffset")?,
            attr_type,
            length: read_count(ATTRCAT_NAME, data, Self::LENGTH_OFFSET, "attrLen")?,
        })
    }
}

/// An attribute as declared by the caller of `create_relation`.
///
/// Offsets are never supplied; they follow from declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSpec {
    pub name: String,
    pub attr_type: AttrType,
    pub length: usize,
}

impl AttributeSpec {
    pub fn new(name: &str, attr_type: AttrType, length: usize) -> Self {
        Self {
            name: name.to_owned(),
            attr_type,
            length,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_relation_tuple_layout() {
        let desc = RelationDescriptor::new("Employee", 3);
        let bytes = desc.to_bytes();

        assert_eq!(&bytes[..8], b"Employee");
        assert!(bytes[8..MAX_NAME].iter().all(|&b| b == 0));
        assert_eq!(read_i32(&bytes, RelationDescriptor::ATTRIBUTE_COUNT_OFFSET), 3);
        assert_eq!(RelationDescriptor::from_bytes(&bytes).unwrap(), desc);
    }

    #[test]
    fn test_attribute_tuple_layout() {
        let desc = AttributeDescriptor {
            relation_name: "Employee".to_string(),
            attribute_name: "salary".to_string(),
            offset: 24,
            attr_type: AttrType::Float,
            length: 4,
        };
        let bytes = desc.to_bytes();

        assert_eq!(&bytes[32..38], b"salary");
        assert_eq!(read_i32(&bytes, AttributeDescriptor::OFFSET_OFFSET), 24);
        assert_eq!(read_i32(&bytes, AttributeDescriptor::TYPE_OFFSET), 2);
        assert_eq!(read_i32(&bytes, AttributeDescriptor::LENGTH_OFFSET), 4);
        assert_eq!(AttributeDescriptor::from_bytes(&bytes).unwrap(), desc);
        assert_eq!(desc.byte_range(), 24..28);
    }

    #[test]
    fn test_unknown_type_code_is_corrupt() {
        let mut bytes = [0u8; AttributeDescriptor::SIZE];
        write_i32(&mut bytes, AttributeDescriptor::TYPE_OFFSET, 7);
        assert!(matches!(
            AttributeDescriptor::from_bytes(&bytes),
            Err(StorageError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_wrong_width_record_is_corrupt() {
        assert!(matches!(
            RelationDescriptor::from_record(RELCAT_NAME, &[0u8; 12]),
            Err(StorageError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_name_field_bounds() {
        let longest = "x".repeat(MAX_NAME - 1);
        assert!(name_field("relation", &longest).is_ok());

        let too_long = "x".repeat(MAX_NAME);
        assert!(matches!(
            name_field("relation", &too_long),
            Err(CatalogError::NameTooLong { len: 32, max: 31, .. })
        ));
        assert!(matches!(
            name_field("relation", ""),
            Err(CatalogError::InvalidParameter { .. })
        ));
        assert!(matches!(
            name_field("attribute", "a\0b"),
            Err(CatalogError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_catalog_schemas_match_tuple_layout() {
        let widths: usize = AttributeDescriptor::catalog_schema()
            .iter()
            .map(|spec| spec.length)
            .sum();
        assert_eq!(widths, AttributeDescriptor::SIZE);

        let widths: usize = RelationDescriptor::catalog_schema()
            .iter()
            .map(|spec| spec.length)
            .sum();
        assert_eq!(widths, RelationDescriptor::SIZE);
    }
}
