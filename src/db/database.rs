use tracing::{debug, error, info, warn};

use super::config::DatabaseConfig;
use crate::{
    catalog::{
        ATTRCAT_NAME, AttributeCatalog, AttributeDescriptor, AttributeSpec, CatalogReport,
        RELCAT_NAME, RelationCatalog, RelationDescriptor, RelationLifecycle, RelationReport,
        SchemaInspector, lifecycle::layout,
    },
    common::error::{CatalogError, CatalogResult},
    storage::{HeapStorage, Storage, StorageError},
};

/// The main database handle.
///
/// `Database` owns the storage and both catalog handles. Opening it
/// initializes storage and, when needed, bootstraps the catalogs: `relcat`
/// and `attrcat` are created and registered in themselves, so the catalog
/// describes its own tables like any other relation.
///
/// Schema changes go through [`Database::lifecycle`], reporting through
/// [`Database::inspector`]; both borrow the storage and the two catalogs
/// explicitly for the duration of the call.
#[derive(Debug)]
pub struct Database<S: Storage = HeapStorage> {
    storage: S,
    relations: RelationCatalog,
    attributes: AttributeCatalog,
}

impl Database<HeapStorage> {
    /// Opens a database as described by `config`.
    pub fn open(config: &DatabaseConfig) -> CatalogResult<Self> {
        config.validate()?;

        let storage = match config.data_directory() {
            Some(dir) => HeapStorage::open(dir)?,
            None => HeapStorage::in_memory(),
        };

        Self::with_storage(storage, config.create_if_missing)
    }

    /// Opens a fresh in-memory database.
    pub fn in_memory() -> CatalogResult<Self> {
        Self::open(&DatabaseConfig::in_memory())
    }
}

impl<S: Storage> Database<S> {
    /// Wraps existing storage, bootstrapping the catalogs if
    /// `create_if_missing` allows it.
    pub fn with_storage(storage: S, create_if_missing: bool) -> CatalogResult<Self> {
        let relations = RelationCatalog::new();
        let mut db = Self {
            storage,
            relations,
            attributes: AttributeCatalog::new(relations),
        };

        db.initialize(create_if_missing)?;
        Ok(db)
    }

    fn initialize(&mut self, create_if_missing: bool) -> CatalogResult<()> {
        let has_relcat = self.storage.table_exists(RELCAT_NAME);
        let has_attrcat = self.storage.table_exists(ATTRCAT_NAME);

        match (has_relcat, has_attrcat) {
            (true, true) => {
                debug!("catalogs present");
                Ok(())
            }
            (false, false) if create_if_missing => self.bootstrap(),
            (false, false) => Err(CatalogError::invalid(
                "storage holds no catalog tables and bootstrapping is disabled",
            )),
            (present, _) => {
                let (found, missing) = if present {
                    (RELCAT_NAME, ATTRCAT_NAME)
                } else {
                    (ATTRCAT_NAME, RELCAT_NAME)
                };
                Err(StorageError::Corrupt {
                    table: missing.to_owned(),
                    reason: format!("catalog table is missing while `{found}` exists"),
                }
                .into())
            }
        }
    }

    /// Creates both catalog tables and registers them in themselves.
    ///
    /// A bootstrap that fails partway destroys whatever catalog table it
    /// created, so the storage is left without catalogs rather than with
    /// half-registered ones.
    fn bootstrap(&mut self) -> CatalogResult<()> {
        if let Err(err) = self.register_catalogs() {
            warn!(error = %err, "catalog bootstrap failed, removing catalog tables");
            for table in [ATTRCAT_NAME, RELCAT_NAME] {
                if !self.storage.table_exists(table) {
                    continue;
                }
                if let Err(undo) = self.storage.destroy_table(table) {
                    error!(table, error = %undo, "could not remove catalog table");
                }
            }
            return Err(err);
        }

        info!("bootstrapped system catalogs");
        Ok(())
    }

    fn register_catalogs(&mut self) -> CatalogResult<()> {
        self.storage.create_table(RELCAT_NAME)?;
        self.storage.create_table(ATTRCAT_NAME)?;

        let catalogs = [
            (RELCAT_NAME, RelationDescriptor::catalog_schema()),
            (ATTRCAT_NAME, AttributeDescriptor::catalog_schema()),
        ];
        for (name, schema) in catalogs {
            let descriptors = layout(name, &schema)?;
            self.relations.insert(
                &mut self.storage,
                &RelationDescriptor::new(name, descriptors.len()),
            )?;
            for descriptor in &descriptors {
                self.attributes.insert(&mut self.storage, descriptor)?;
            }
        }

        Ok(())
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn relation_catalog(&self) -> &RelationCatalog {
        &self.relations
    }

    pub fn attribute_catalog(&self) -> &AttributeCatalog {
        &self.attributes
    }

    /// Borrows the storage and both catalogs for relation creation and
    /// destruction.
    pub fn lifecycle(&mut self) -> RelationLifecycle<'_, S> {
        RelationLifecycle::new(&mut self.storage, &self.relations, &self.attributes)
    }

    /// Borrows the storage and both catalogs for reporting.
    pub fn inspector(&mut self) -> SchemaInspector<'_, S> {
        SchemaInspector::new(&mut self.storage, &self.relations, &self.attributes)
    }

    /// Creates a relation. See [`RelationLifecycle::create_relation`].
    pub fn create_relation(
        &mut self,
        name: &str,
        attributes: &[AttributeSpec],
    ) -> CatalogResult<()> {
        self.lifecycle().create_relation(name, attributes)
    }

    /// Destroys a relation. See [`RelationLifecycle::destroy_relation`].
    pub fn destroy_relation(&mut self, name: &str) -> CatalogResult<()> {
        self.lifecycle().destroy_relation(name)
    }

    pub fn describe_all(&mut self) -> CatalogResult<CatalogReport> {
        self.inspector().describe_all()
    }

    pub fn describe(&mut self, relation: &str) -> CatalogResult<RelationReport> {
        self.inspector().describe(relation)
    }

    /// The relation catalog entry for `name`.
    pub fn relation(&mut self, name: &str) -> CatalogResult<RelationDescriptor> {
        self.relations.lookup(&mut self.storage, name)
    }

    /// The attribute catalog entry for (`relation`, `attribute`).
    pub fn attribute(
        &mut self,
        relation: &str,
        attribute: &str,
    ) -> CatalogResult<AttributeDescriptor> {
        self.attributes.lookup(&mut self.storage, relation, attribute)
    }

    /// The attributes of `relation`, checked against its attribute count.
    pub fn attributes_of(&mut self, relation: &str) -> CatalogResult<Vec<AttributeDescriptor>> {
        self.attributes.list_for_relation(&mut self.storage, relation)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::types::AttrType;

    #[test]
    fn test_bootstrap_registers_catalogs() {
        let mut db = Database::in_memory().unwrap();

        assert_eq!(db.relation(RELCAT_NAME).unwrap().attribute_count, 2);
        assert_eq!(db.relation(ATTRCAT_NAME).unwrap().attribute_count, 5);

        let report = db.describe(ATTRCAT_NAME).unwrap();
        assert_eq!(report.record_width(), AttributeDescriptor::SIZE);

        let offset = db.attribute(ATTRCAT_NAME, "attrType").unwrap();
        assert_eq!(offset.offset, AttributeDescriptor::TYPE_OFFSET);
        assert_eq!(offset.attr_type, AttrType::Integer);

        let count = db.attribute(RELCAT_NAME, "attrCnt").unwrap();
        assert_eq!(count.offset, RelationDescriptor::ATTRIBUTE_COUNT_OFFSET);
    }

    #[test]
    fn test_catalogs_cannot_be_recreated() {
        let mut db = Database::in_memory().unwrap();
        let attrs = [AttributeSpec::new("x", AttrType::Integer, 4)];

        assert!(matches!(
            db.create_relation(RELCAT_NAME, &attrs),
            Err(CatalogError::DuplicateRelation { .. })
        ));
    }

    #[test]
    fn test_refuses_storage_without_catalogs() {
        let res = Database::with_storage(HeapStorage::in_memory(), false);
        assert!(matches!(res, Err(CatalogError::InvalidParameter { .. })));
    }

    #[test]
    fn test_half_bootstrapped_storage_is_corrupt() {
        let mut storage = HeapStorage::in_memory();
        storage.create_table(RELCAT_NAME).unwrap();

        let res = Database::with_storage(storage, true);
        assert!(matches!(
            res,
            Err(CatalogError::Storage(StorageError::Corrupt { ref table, .. }))
                if table == ATTRCAT_NAME
        ));
    }
}
