use std::fmt;

use super::{
    attribute_catalog::AttributeCatalog,
    descriptor::{AttributeDescriptor, MAX_NAME},
    relation_catalog::RelationCatalog,
};
use crate::{common::error::CatalogResult, storage::Storage};

/// One line of a [`CatalogReport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationSummary {
    pub name: String,
    pub attribute_count: usize,
}

/// Every relation known to the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogReport {
    pub relations: Vec<RelationSummary>,
}

impl fmt::Display for CatalogReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = MAX_NAME;
        writeln!(f, "{:<width$} attrCnt", "relName")?;
        writeln!(f, "{} -------", "-".repeat(width))?;
        for relation in &self.relations {
            writeln!(f, "{:<width$} {}", relation.name, relation.attribute_count)?;
        }
        write!(f, "{} relation(s)", self.relations.len())
    }
}

/// The attributes of one relation, in catalog order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationReport {
    pub relation: String,
    pub attributes: Vec<AttributeDescriptor>,
}

impl RelationReport {
    /// Width in bytes of one tuple of the relation.
    pub fn record_width(&self) -> usize {
        self.attributes.iter().map(|a| a.length).sum()
    }
}

impl fmt::Display for RelationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Relation Name: {}", self.relation)?;
        for attribute in &self.attributes {
            writeln!(f, "    Attribute Name: {}", attribute.attribute_name)?;
            writeln!(f, "    Attribute Type: {}", attribute.attr_type)?;
            writeln!(f, "    Attribute Length: {}", attribute.length)?;
            writeln!(f, "    Attribute Offset: {}", attribute.offset)?;
        }
        write!(f, "Record Width: {}", self.record_width())
    }
}

/// Read-only reporting over both catalogs.
pub struct SchemaInspector<'a, S: Storage> {
    storage: &'a mut S,
    relations: &'a RelationCatalog,
    attributes: &'a AttributeCatalog,
}

impl<'a, S: Storage> SchemaInspector<'a, S> {
    pub fn new(
        storage: &'a mut S,
        relations: &'a RelationCatalog,
        attributes: &'a AttributeCatalog,
    ) -> Self {
        Self {
            storage,
            relations,
            attributes,
        }
    }

    /// Lists every relation with its attribute count.
    pub fn describe_all(&mut self) -> CatalogResult<CatalogReport> {
        let relations = self
            .relations
            .scan_all(self.storage)?
            .into_iter()
            .map(|desc| RelationSummary {
                name: desc.name,
                attribute_count: desc.attribute_count,
            })
            .collect();

        Ok(CatalogReport { relations })
    }

    /// Lists the attributes of `relation`, which must exist.
    pub fn describe(&mut self, relation: &str) -> CatalogResult<RelationReport> {
        self.relations.lookup(self.storage, relation)?;
        let attributes = self.attributes.list_for_relation(self.storage, relation)?;

        Ok(RelationReport {
            relation: relation.to_owned(),
            attributes,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::types::AttrType;

    #[test]
    fn test_relation_report_rendering() {
        let report = RelationReport {
            relation: "Dept".to_string(),
            attributes: vec![AttributeDescriptor {
                relation_name: "Dept".to_string(),
                attribute_name: "id".to_string(),
                offset: 0,
                attr_type: AttrType::Integer,
                length: 4,
            }],
        };

        let expected = "Relation Name: Dept\n\
                        \x20   Attribute Name: id\n\
                        \x20   Attribute Type: Integer\n\
                        \x20   Attribute Length: 4\n\
                        \x20   Attribute Offset: 0\n\
                        Record Width: 4";
        assert_eq!(report.to_string(), expected);
    }

    #[test]
    fn test_catalog_report_rendering() {
        let report = CatalogReport {
            relations: vec![RelationSummary {
                name: "Dept".to_string(),
                attribute_count: 1,
            }],
        };

        let rendered = report.to_string();
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("relName"));
        assert!(lines[0].ends_with("attrCnt"));
        assert!(lines[2].starts_with("Dept "));
        assert!(lines[2].ends_with(" 1"));
        assert_eq!(lines[3], "1 relation(s)");
    }
}
