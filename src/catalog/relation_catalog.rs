use tracing::debug;

use super::descriptor::{RELCAT_NAME, RelationDescriptor, name_field};
use crate::{
    common::error::{CatalogError, CatalogResult},
    core::{serialization::Serializable, types::AttrType},
    storage::{RecordId, RecordInserter, ScanCursor, ScanPredicate, Storage},
};

/// Handle on the relation catalog table (`relcat`).
///
/// Maps a relation name to its [`RelationDescriptor`]. The handle holds no
/// storage of its own; every operation runs against the storage it is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationCatalog {
    table: &'static str,
}

impl Default for RelationCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl RelationCatalog {
    pub fn new() -> Self {
        Self { table: RELCAT_NAME }
    }

    /// Name of the table holding the relation tuples.
    pub fn table_name(&self) -> &'static str {
        self.table
    }

    /// Equality predicate on the `relName` field.
    fn name_predicate(name: &str) -> CatalogResult<ScanPredicate> {
        let key = name_field("relation", name)?;
        Ok(ScanPredicate::equals(
            RelationDescriptor::NAME_OFFSET,
            AttrType::String,
            key.to_vec(),
        )?)
    }

    /// Returns the descriptor of relation `name`.
    pub fn lookup<S: Storage>(
        &self,
        storage: &mut S,
        name: &str,
    ) -> CatalogResult<RelationDescriptor> {
        let predicate = Self::name_predicate(name)?;
        let mut scan = storage.open_scan(self.table, Some(predicate))?;

        match scan.scan_next()? {
            Some(rid) => {
                let descriptor = RelationDescriptor::from_record(self.table, scan.record()?)?;
                debug!(relation = name, %rid, "found relation descriptor");
                Ok(descriptor)
            }
            None => Err(CatalogError::relation_not_found(name)),
        }
    }

    /// Appends a descriptor.
    ///
    /// The caller is responsible for making sure no descriptor with the same
    /// name exists.
    pub fn insert<S: Storage>(
        &self,
        storage: &mut S,
        descriptor: &RelationDescriptor,
    ) -> CatalogResult<RecordId> {
        name_field("relation", &descriptor.name)?;
        if descriptor.attribute_count == 0 || i32::try_from(descriptor.attribute_count).is_err() {
            return Err(CatalogError::invalid(format!(
                "relation `{}` cannot have {} attributes",
                descriptor.name, descriptor.attribute_count
            )));
        }

        let mut inserter = storage.open_insert(self.table)?;
        let rid = inserter.insert_record(&descriptor.to_bytes())?;

        debug!(relation = %descriptor.name, %rid, "inserted relation descriptor");
        Ok(rid)
    }

    /// Deletes the descriptor of relation `name`.
    pub fn remove<S: Storage>(&self, storage: &mut S, name: &str) -> CatalogResult<()> {
        let predicate = Self::name_predicate(name)?;
        let mut scan = storage.open_scan(self.table, Some(predicate))?;

        match scan.scan_next()? {
            Some(rid) => {
                scan.delete_record()?;
                debug!(relation = name, %rid, "removed relation descriptor");
                Ok(())
            }
            None => Err(CatalogError::relation_not_found(name)),
        }
    }

    /// Every relation descriptor, in storage order.
    pub fn scan_all<S: Storage>(&self, storage: &mut S) -> CatalogResult<Vec<RelationDescriptor>> {
        let mut scan = storage.open_scan(self.table, None)?;

        let mut relations = Vec::new();
        while scan.scan_next()?.is_some() {
            relations.push(RelationDescriptor::from_record(self.table, scan.record()?)?);
        }

        Ok(relations)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::storage::HeapStorage;

    fn setup() -> (HeapStorage, RelationCatalog) {
        let mut storage = HeapStorage::in_memory();
        storage.create_table(RELCAT_NAME).unwrap();
        (storage, RelationCatalog::new())
    }

    #[test]
    fn test_insert_then_lookup_round_trips() {
        let (mut storage, relcat) = setup();
        let desc = RelationDescriptor::new("Employee", 3);

        relcat.insert(&mut storage, &desc).unwrap();

        assert_eq!(relcat.lookup(&mut storage, "Employee").unwrap(), desc);
        assert_eq!(storage.open_scans(), 0);
    }

    #[test]
    fn test_lookup_matches_the_whole_name() {
        let (mut storage, relcat) = setup();
        relcat
            .insert(&mut storage, &RelationDescriptor::new("Employee", 3))
            .unwrap();

        assert!(matches!(
            relcat.lookup(&mut storage, "Emp"),
            Err(CatalogError::RelationNotFound { .. })
        ));
        assert!(matches!(
            relcat.lookup(&mut storage, "employee"),
            Err(CatalogError::RelationNotFound { .. })
        ));
    }

    #[test]
    fn test_lookup_rejects_empty_name() {
        let (mut storage, relcat) = setup();
        assert!(matches!(
            relcat.lookup(&mut storage, ""),
            Err(CatalogError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_remove_deletes_exactly_one() {
        let (mut storage, relcat) = setup();
        relcat
            .insert(&mut storage, &RelationDescriptor::new("A", 1))
            .unwrap();
        relcat
            .insert(&mut storage, &RelationDescriptor::new("B", 2))
            .unwrap();

        relcat.remove(&mut storage, "A").unwrap();

        assert!(relcat.lookup(&mut storage, "A").unwrap_err().is_not_found());
        assert_eq!(relcat.lookup(&mut storage, "B").unwrap().attribute_count, 2);
        assert!(relcat.remove(&mut storage, "A").unwrap_err().is_not_found());
        assert_eq!(storage.open_scans(), 0);
    }

    #[test]
    fn test_insert_rejects_zero_attributes() {
        let (mut storage, relcat) = setup();
        assert!(matches!(
            relcat.insert(&mut storage, &RelationDescriptor::new("Empty", 0)),
            Err(CatalogError::InvalidParameter { .. })
        ));
        assert_eq!(relcat.table_name(), RELCAT_NAME);
        assert_eq!(storage.record_count(relcat.table_name()).unwrap(), 0);
    }

    #[test]
    fn test_scan_all_lists_in_insertion_order() {
        let (mut storage, relcat) = setup();
        for (name, count) in [("A", 1), ("B", 2), ("C", 3)] {
            relcat
                .insert(&mut storage, &RelationDescriptor::new(name, count))
                .unwrap();
        }
        relcat.remove(&mut storage, "B").unwrap();

        let names: Vec<_> = relcat
            .scan_all(&mut storage)
            .unwrap()
            .into_iter()
            .map(|desc| desc.name)
            .collect();
        assert_eq!(names, vec!["A", "C"]);
    }
}
