use miette::Diagnostic;
use thiserror::Error;

use crate::storage::StorageError;

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors surfaced by the relation catalog, the attribute catalog and the
/// relation lifecycle.
///
/// Every variant names the relation (and attribute, where there is one) that
/// caused it. Storage failures are carried through unchanged.
#[derive(Debug, Error, Diagnostic)]
pub enum CatalogError {
    /// An empty name, a non-positive count or length, or any other argument
    /// the catalog refuses before touching storage.
    #[error("invalid catalog parameter: {reason}")]
    #[diagnostic(code(catalog::invalid_parameter))]
    InvalidParameter { reason: String },

    /// A relation or attribute name that does not fit the fixed name field.
    #[error("name `{name}` is {len} bytes, the limit is {max}")]
    #[diagnostic(
        code(catalog::name_too_long),
        help("relation and attribute names are stored in a fixed-width field")
    )]
    NameTooLong { name: String, len: usize, max: usize },

    #[error("relation `{relation}` not found")]
    #[diagnostic(code(catalog::relation_not_found))]
    RelationNotFound { relation: String },

    #[error("attribute `{attribute}` not found in relation `{relation}`")]
    #[diagnostic(code(catalog::attribute_not_found))]
    AttributeNotFound { relation: String, attribute: String },

    #[error("relation `{relation}` already exists")]
    #[diagnostic(
        code(catalog::duplicate_relation),
        help("destroy the existing relation first, creation is not idempotent")
    )]
    DuplicateRelation { relation: String },

    /// The relation catalog and the attribute catalog disagree about how many
    /// attributes a relation has.
    #[error(
        "catalog inconsistency for relation `{relation}`: relcat records {expected} attribute(s), attrcat holds {found}"
    )]
    #[diagnostic(code(catalog::inconsistency))]
    CatalogInconsistency {
        relation: String,
        expected: usize,
        found: usize,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Storage(#[from] StorageError),
}

impl CatalogError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            reason: reason.into(),
        }
    }

    pub(crate) fn relation_not_found(relation: &str) -> Self {
        Self::RelationNotFound {
            relation: relation.to_owned(),
        }
    }

    pub(crate) fn attribute_not_found(relation: &str, attribute: &str) -> Self {
        Self::AttributeNotFound {
            relation: relation.to_owned(),
            attribute: attribute.to_owned(),
        }
    }

    /// True for both "relation not found" and "attribute not found".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::RelationNotFound { .. } | Self::AttributeNotFound { .. }
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        assert!(CatalogError::relation_not_found("Employee").is_not_found());
        assert!(CatalogError::attribute_not_found("Employee", "id").is_not_found());
        assert!(!CatalogError::invalid("empty relation name").is_not_found());
    }

    #[test]
    fn test_messages_name_the_offender() {
        let err = CatalogError::attribute_not_found("Employee", "missing");
        assert_eq!(
            err.to_string(),
            "attribute `missing` not found in relation `Employee`"
        );

        let err = CatalogError::CatalogInconsistency {
            relation: "Employee".to_string(),
            expected: 3,
            found: 2,
        };
        assert!(err.to_string().contains("relcat records 3"));
    }

    #[test]
    fn test_storage_error_is_transparent() {
        let err: CatalogError = StorageError::TableNotFound {
            table: "ghost".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "table `ghost` does not exist");
        assert!(!err.is_not_found());
    }
}
