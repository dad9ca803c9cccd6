use std::collections::HashSet;

use tracing::{error, info, warn};

use super::{
    attribute_catalog::AttributeCatalog,
    descriptor::{
        ATTRCAT_NAME, AttributeDescriptor, AttributeSpec, RELCAT_NAME, RelationDescriptor,
        name_field,
    },
    relation_catalog::RelationCatalog,
};
use crate::{
    common::error::{CatalogError, CatalogResult},
    storage::Storage,
};

/// Validates a relation's declared attributes and lays them out.
///
/// Offsets are the running sum of the lengths declared before each
/// attribute, starting at 0.
pub(crate) fn layout(
    relation: &str,
    attributes: &[AttributeSpec],
) -> CatalogResult<Vec<AttributeDescriptor>> {
    name_field("relation", relation)?;

    if attributes.is_empty() {
        return Err(CatalogError::invalid(format!(
            "relation `{relation}` needs at least one attribute"
        )));
    }

    let mut seen = HashSet::with_capacity(attributes.len());
    let mut descriptors = Vec::with_capacity(attributes.len());
    let mut offset: usize = 0;

    for spec in attributes {
        name_field("attribute", &spec.name)?;

        if !seen.insert(spec.name.as_str()) {
            return Err(CatalogError::invalid(format!(
                "attribute `{}` is declared twice in relation `{relation}`",
                spec.name
            )));
        }
        if spec.length == 0 {
            return Err(CatalogError::invalid(format!(
                "attribute `{}` of relation `{relation}` has zero length",
                spec.name
            )));
        }

        descriptors.push(AttributeDescriptor {
            relation_name: relation.to_owned(),
            attribute_name: spec.name.clone(),
            offset,
            attr_type: spec.attr_type,
            length: spec.length,
        });

        offset = offset
            .checked_add(spec.length)
            .filter(|end| i32::try_from(*end).is_ok())
            .ok_or_else(|| {
                CatalogError::invalid(format!("tuples of relation `{relation}` are too wide"))
            })?;
    }

    Ok(descriptors)
}

/// Rows a creation has inserted so far, so they can be taken back out.
#[derive(Debug, Default)]
struct Inserted {
    relation: bool,
    attributes: Vec<String>,
}

/// Creates and destroys relations across both catalogs and the data file.
///
/// Built from explicit references to the storage and the two catalog
/// handles, usually through [`Database::lifecycle`](crate::Database::lifecycle).
pub struct RelationLifecycle<'a, S: Storage> {
    storage: &'a mut S,
    relations: &'a RelationCatalog,
    attributes: &'a AttributeCatalog,
}

impl<'a, S: Storage> RelationLifecycle<'a, S> {
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

    /// Creates relation `name` with `attributes` in declaration order.
    ///
    /// Writes the relation tuple, then one attribute tuple per attribute,
    /// then asks storage for the data file. If any of those steps fails the
    /// tuples already written are deleted again and the original error is
    /// returned.
    pub fn create_relation(
        &mut self,
        name: &str,
        attributes: &[AttributeSpec],
    ) -> CatalogResult<()> {
        let descriptors = layout(name, attributes)?;

        match self.relations.lookup(self.storage, name) {
            Ok(_) => {
                return Err(CatalogError::DuplicateRelation {
                    relation: name.to_owned(),
                });
            }
            Err(CatalogError::RelationNotFound { .. }) => {}
            Err(e) => return Err(e),
        }

        let relation = RelationDescriptor::new(name, descriptors.len());
        let mut inserted = Inserted::default();

        if let Err(err) = self.apply_creation(&relation, &descriptors, &mut inserted) {
            warn!(
                relation = name,
                error = %err,
                attributes = inserted.attributes.len(),
                "relation creation failed, removing partial catalog rows"
            );
            if let Err(undo) = self.compensate(name, &inserted) {
                error!(
                    relation = name,
                    error = %undo,
                    "could not remove partial catalog rows"
                );
            }
            return Err(err);
        }

        info!(relation = name, attributes = descriptors.len(), "created relation");
        Ok(())
    }

    fn apply_creation(
        &mut self,
        relation: &RelationDescriptor,
        descriptors: &[AttributeDescriptor],
        inserted: &mut Inserted,
    ) -> CatalogResult<()> {
        self.relations.insert(self.storage, relation)?;
        inserted.relation = true;

        for descriptor in descriptors {
            self.attributes.insert(self.storage, descriptor)?;
            inserted.attributes.push(descriptor.attribute_name.clone());
        }

        self.storage.create_table(&relation.name)?;
        Ok(())
    }

    /// Deletes the rows a failed creation wrote, attributes first.
    fn compensate(&mut self, name: &str, inserted: &Inserted) -> CatalogResult<()> {
        for attribute in inserted.attributes.iter().rev() {
            self.attributes.remove(self.storage, name, attribute)?;
        }
        if inserted.relation {
            self.relations.remove(self.storage, name)?;
        }
        Ok(())
    }

    /// Destroys relation `name`: its attribute tuples, then its relation
    /// tuple, then its data file.
    ///
    /// If the attribute tuples cannot be enumerated or removed the relation
    /// tuple is left in place. An unknown relation is `RelationNotFound`
    /// with nothing removed. The catalogs themselves cannot be destroyed.
    pub fn destroy_relation(&mut self, name: &str) -> CatalogResult<()> {
        if name.is_empty() {
            return Err(CatalogError::invalid("relation name is empty"));
        }
        if name == RELCAT_NAME || name == ATTRCAT_NAME {
            return Err(CatalogError::invalid(format!(
                "catalog table `{name}` cannot be destroyed"
            )));
        }

        let removed = self.attributes.drop_relation(self.storage, name)?;
        self.relations.remove(self.storage, name)?;
        self.storage.destroy_table(name)?;

        info!(relation = name, attributes = removed, "destroyed relation");
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::types::AttrType;

    fn employee() -> Vec<AttributeSpec> {
        vec![
            AttributeSpec::new("id", AttrType::Integer, 4),
            AttributeSpec::new("name", AttrType::String, 20),
            AttributeSpec::new("salary", AttrType::Float, 4),
        ]
    }

    #[test]
    fn test_layout_tiles_offsets() {
        let descriptors = layout("Employee", &employee()).unwrap();

        let offsets: Vec<_> = descriptors.iter().map(|d| d.offset).collect();
        assert_eq!(offsets, vec![0, 4, 24]);
        assert!(descriptors.iter().all(|d| d.relation_name == "Employee"));
    }

    #[test]
    fn test_layout_rejects_bad_declarations() {
        assert!(matches!(
            layout("Employee", &[]),
            Err(CatalogError::InvalidParameter { .. })
        ));
        assert!(matches!(
            layout("", &employee()),
            Err(CatalogError::InvalidParameter { .. })
        ));
        assert!(matches!(
            layout(&"r".repeat(32), &employee()),
            Err(CatalogError::NameTooLong { .. })
        ));

        let mut twice = employee();
        twice.push(AttributeSpec::new("id", AttrType::Integer, 4));
        assert!(matches!(
            layout("Employee", &twice),
            Err(CatalogError::InvalidParameter { .. })
        ));

        let zero = vec![AttributeSpec::new("id", AttrType::Integer, 0)];
        assert!(matches!(
            layout("Employee", &zero),
            Err(CatalogError::InvalidParameter { .. })
        ));

        let wide = vec![
            AttributeSpec::new("a", AttrType::String, i32::MAX as usize),
            AttributeSpec::new("b", AttrType::String, 1),
        ];
        assert!(matches!(
            layout("Wide", &wide),
            Err(CatalogError::InvalidParameter { .. })
        ));
    }
}
