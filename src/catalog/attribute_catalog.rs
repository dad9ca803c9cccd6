use tracing::debug;

use super::{
    descriptor::{ATTRCAT_NAME, AttributeDescriptor, name_field},
    relation_catalog::RelationCatalog,
};
use crate::{
    common::error::{CatalogError, CatalogResult},
    core::{serialization::Serializable, types::AttrType},
    storage::{RecordId, RecordInserter, ScanCursor, ScanPredicate, Storage},
};

/// What to do with the tuple a two-stage lookup lands on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnMatch {
    Read,
    Delete,
}

/// Handle on the attribute catalog table (`attrcat`).
///
/// Maps (relation, attribute) to an [`AttributeDescriptor`] and a relation
/// to its full attribute list.
///
/// The storage layer evaluates a single predicate per scan, so every lookup
/// keyed on both names is a two-stage filter: the scan selects the tuples of
/// one relation and the attribute name is compared in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeCatalog {
    table: &'static str,
    relations: RelationCatalog,
}

impl AttributeCatalog {
    /// Creates the handle. `relations` is consulted for attribute counts.
    pub fn new(relations: RelationCatalog) -> Self {
        Self {
            table: ATTRCAT_NAME,
            relations,
        }
    }

    pub fn table_name(&self) -> &'static str {
        self.table
    }

    /// Equality predicate on the `relName` field.
    fn relation_predicate(relation: &str) -> CatalogResult<ScanPredicate> {
        let key = name_field("relation", relation)?;
        Ok(ScanPredicate::equals(
            AttributeDescriptor::RELATION_NAME_OFFSET,
            AttrType::String,
            key.to_vec(),
        )?)
    }

    /// Scans the tuples of `relation` and returns the first one accepted by
    /// `residual`, deleting it through the cursor when asked to.
    ///
    /// Returns `None` only once the scan is exhausted.
    fn find_by<S, F>(
        &self,
        storage: &mut S,
        relation: &str,
        residual: F,
        on_match: OnMatch,
    ) -> CatalogResult<Option<AttributeDescriptor>>
    where
        S: Storage,
        F: Fn(&AttributeDescriptor) -> bool,
    {
        let predicate = Self::relation_predicate(relation)?;
        let mut scan = storage.open_scan(self.table, Some(predicate))?;

        while let Some(rid) = scan.scan_next()? {
            let candidate = AttributeDescriptor::from_record(self.table, scan.record()?)?;
            if !residual(&candidate) {
                continue;
            }

            if on_match == OnMatch::Delete {
                scan.delete_record()?;
                debug!(
                    relation,
                    attribute = %candidate.attribute_name,
                    %rid,
                    "removed attribute descriptor"
                );
            }
            return Ok(Some(candidate));
        }

        Ok(None)
    }

    /// Returns the descriptor of `attribute` in `relation`.
    pub fn lookup<S: Storage>(
        &self,
        storage: &mut S,
        relation: &str,
        attribute: &str,
    ) -> CatalogResult<AttributeDescriptor> {
        name_field("attribute", attribute)?;

        self.find_by(
            storage,
            relation,
            |candidate| candidate.attribute_name == attribute,
            OnMatch::Read,
        )?
        .ok_or_else(|| CatalogError::attribute_not_found(relation, attribute))
    }

    /// Appends a descriptor.
    ///
    /// No check is made against existing (relation, attribute) pairs; the
    /// caller guarantees there is no duplicate.
    pub fn insert<S: Storage>(
        &self,
        storage: &mut S,
        descriptor: &AttributeDescriptor,
    ) -> CatalogResult<RecordId> {
        name_field("relation", &descriptor.relation_name)?;
        name_field("attribute", &descriptor.attribute_name)?;
        if descriptor.length == 0 {
            return Err(CatalogError::invalid(format!(
                "attribute `{}` of `{}` has zero length",
                descriptor.attribute_name, descriptor.relation_name
            )));
        }
        let end = descriptor.offset.checked_add(descriptor.length);
        if end.and_then(|end| i32::try_from(end).ok()).is_none() {
            return Err(CatalogError::invalid(format!(
                "attribute `{}` of `{}` ends past the largest storable offset",
                descriptor.attribute_name, descriptor.relation_name
            )));
        }

        let mut inserter = storage.open_insert(self.table)?;
        let rid = inserter.insert_record(&descriptor.to_bytes())?;

        debug!(
            relation = %descriptor.relation_name,
            attribute = %descriptor.attribute_name,
            %rid,
            "inserted attribute descriptor"
        );
        Ok(rid)
    }

    /// Deletes the descriptor of `attribute` in `relation`.
    pub fn remove<S: Storage>(
        &self,
        storage: &mut S,
        relation: &str,
        attribute: &str,
    ) -> CatalogResult<()> {
        name_field("attribute", attribute)?;

        self.find_by(
            storage,
            relation,
            |candidate| candidate.attribute_name == attribute,
            OnMatch::Delete,
        )?
        .map(|_| ())
        .ok_or_else(|| CatalogError::attribute_not_found(relation, attribute))
    }

    /// All attribute descriptors of `relation`, in storage order.
    ///
    /// The relation catalog's attribute count sizes the result and is checked
    /// against what the scan finds: fewer or more tuples than recorded is a
    /// [`CatalogError::CatalogInconsistency`]. A relation the relation catalog
    /// does not know expects no tuples, so it lists as empty.
    pub fn list_for_relation<S: Storage>(
        &self,
        storage: &mut S,
        relation: &str,
    ) -> CatalogResult<Vec<AttributeDescriptor>> {
        let expected = match self.relations.lookup(storage, relation) {
            Ok(descriptor) => descriptor.attribute_count,
            Err(CatalogError::RelationNotFound { .. }) => 0,
            Err(e) => return Err(e),
        };

        let predicate = Self::relation_predicate(relation)?;
        let mut scan = storage.open_scan(self.table, Some(predicate))?;

        let mut attributes = Vec::with_capacity(expected);
        let mut found = 0;
        while scan.scan_next()?.is_some() {
            found += 1;
            if found <= expected {
                attributes.push(AttributeDescriptor::from_record(self.table, scan.record()?)?);
            }
        }

        if found != expected {
            return Err(CatalogError::CatalogInconsistency {
                relation: relation.to_owned(),
                expected,
                found,
            });
        }

        Ok(attributes)
    }

    /// Every attribute tuple naming `relation`, without consulting the
    /// relation catalog.
    pub fn list_orphans<S: Storage>(
        &self,
        storage: &mut S,
        relation: &str,
    ) -> CatalogResult<Vec<AttributeDescriptor>> {
        let predicate = Self::relation_predicate(relation)?;
        let mut scan = storage.open_scan(self.table, Some(predicate))?;

        let mut attributes = Vec::new();
        while scan.scan_next()?.is_some() {
            attributes.push(AttributeDescriptor::from_record(self.table, scan.record()?)?);
        }

        Ok(attributes)
    }

    /// Removes every attribute tuple of `relation` and returns how many were
    /// removed.
    ///
    /// The tuples are enumerated with [`Self::list_for_relation`] first, so a
    /// count mismatch aborts before anything is deleted.
    pub fn drop_relation<S: Storage>(
        &self,
        storage: &mut S,
        relation: &str,
    ) -> CatalogResult<usize> {
        let attributes = self.list_for_relation(storage, relation)?;

        for attribute in &attributes {
            self.remove(storage, relation, &attribute.attribute_name)?;
        }

        debug!(relation, removed = attributes.len(), "dropped attribute descriptors");
        Ok(attributes.len())
    }
}
