//! Database configuration.

use std::path::{Path, PathBuf};

use crate::common::error::{CatalogError, CatalogResult};

/// Configuration for opening a [`Database`](super::database::Database).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    /// Directory holding one file per table. `None` keeps everything in
    /// memory.
    pub data_directory: Option<PathBuf>,

    /// Create and register the catalog tables when they are absent.
    ///
    /// When false, opening storage without catalogs is an error.
    pub create_if_missing: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            data_directory: None,
            create_if_missing: true,
        }
    }
}

impl DatabaseConfig {
    /// A configuration backed by `data_directory`.
    pub fn new(data_directory: impl Into<PathBuf>) -> Self {
        Self {
            data_directory: Some(data_directory.into()),
            ..Default::default()
        }
    }

    /// A configuration that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_directory(mut self, data_directory: impl Into<PathBuf>) -> Self {
        self.data_directory = Some(data_directory.into());
        self
    }

    /// Sets whether missing catalogs are bootstrapped.
    #[must_use]
    pub fn with_create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    pub fn data_directory(&self) -> Option<&Path> {
        self.data_directory.as_deref()
    }

    /// Validates the configuration.
    pub fn validate(&self) -> CatalogResult<()> {
        let Some(dir) = &self.data_directory else {
            return Ok(());
        };

        if dir.as_os_str().is_empty() {
            return Err(CatalogError::invalid("data directory path is empty"));
        }
        if dir.exists() && !dir.is_dir() {
            return Err(CatalogError::invalid(format!(
                "data directory {} is not a directory",
                dir.display()
            )));
        }
        if !dir.exists() && !self.create_if_missing {
            return Err(CatalogError::invalid(format!(
                "data directory {} does not exist",
                dir.display()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_defaults_are_in_memory() {
        let config = DatabaseConfig::default();
        assert!(config.data_directory().is_none());
        assert!(config.create_if_missing);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = DatabaseConfig::in_memory()
            .with_data_directory("/tmp/scuttle")
            .with_create_if_missing(false);
        assert_eq!(config.data_directory(), Some(Path::new("/tmp/scuttle")));
        assert!(!config.create_if_missing);
    }

    #[test]
    fn test_validate_rejects_bad_directories() {
        assert!(DatabaseConfig::new("").validate().is_err());

        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(DatabaseConfig::new(file.path()).validate().is_err());

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        assert!(DatabaseConfig::new(&missing).validate().is_ok());
        assert!(
            DatabaseConfig::new(&missing)
                .with_create_if_missing(false)
                .validate()
                .is_err()
        );
    }
}
