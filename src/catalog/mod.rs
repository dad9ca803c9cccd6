//! The system catalog.
//!
//! Two ordinary tables describe every relation: `relcat` holds one
//! [`RelationDescriptor`] per relation and `attrcat` one
//! [`AttributeDescriptor`] per attribute. [`RelationLifecycle`] keeps them and
//! the relation's data file consistent; [`SchemaInspector`] reports on them.

pub mod attribute_catalog;
pub mod descriptor;
pub mod inspector;
pub mod lifecycle;
pub mod relation_catalog;

pub use attribute_catalog::AttributeCatalog;
pub use descriptor::{
    ATTRCAT_NAME, AttributeDescriptor, AttributeSpec, MAX_NAME, RELCAT_NAME, RelationDescriptor,
};
pub use inspector::{CatalogReport, RelationReport, RelationSummary, SchemaInspector};
pub use lifecycle::RelationLifecycle;
pub use relation_catalog::RelationCatalog;
