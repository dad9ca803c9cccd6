use strum::{Display, EnumString, FromRepr};

/// Attribute types the catalog can describe.
///
/// The discriminant is the type code persisted in the `attrType` field of an
/// attribute tuple. `Display` gives the human label used in schema reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, FromRepr)]
#[strum(ascii_case_insensitive)]
#[repr(i32)]
pub enum AttrType {
    /// Fixed-width byte string, compared bytewise.
    String = 0,

    /// 32-bit signed integer, little-endian.
    Integer = 1,

    /// 32-bit IEEE float, little-endian.
    Float = 2,
}

impl AttrType {
    /// The code stored on disk for this type.
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Looks up a type by its on-disk code.
    pub fn from_code(code: i32) -> Option<Self> {
        Self::from_repr(code)
    }
}

#[cfg(test)]
mod test {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(AttrType::String.code(), 0);
        assert_eq!(AttrType::Integer.code(), 1);
        assert_eq!(AttrType::Float.code(), 2);
        assert_eq!(AttrType::from_code(2), Some(AttrType::Float));
        assert_eq!(AttrType::from_code(3), None);
        assert_eq!(AttrType::from_code(-1), None);
    }

    #[test]
    fn test_labels() {
        assert_eq!(AttrType::String.to_string(), "String");
        assert_eq!(AttrType::Integer.to_string(), "Integer");
        assert_eq!(AttrType::Float.to_string(), "Float");
        assert_eq!(AttrType::from_str("integer").unwrap(), AttrType::Integer);
        assert_eq!(AttrType::from_str("FLOAT").unwrap(), AttrType::Float);
        assert!(AttrType::from_str("Boolean").is_err());
    }
}
