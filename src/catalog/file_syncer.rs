use super::object::ObjectDescription;
use super::syncer::CatalogSyncer;
use crate::constants::CATALOG_FILE_EXTENSION;
use crate::error::{ErrorCode, MigrationError};
use crate::render::is_valid_identifier;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Catalog stored as one JSON file per object
#[derive(Debug, Clone)]
pub struct FileCatalogSyncer {
    directory: PathBuf,
}

impl FileCatalogSyncer {
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self> {
        let directory = directory.into();
        fs::create_dir_all(&directory).with_context(|| {
            format!("Failed to create catalog directory {}", directory.display())
        })?;
        Ok(Self { directory })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Names outside the identifier rule never map onto a file
    fn path_for(&self, name: &str) -> Option<PathBuf> {
        is_valid_identifier(name).then(|| {
            self.directory
                .join(format!("{}.{}", name, CATALOG_FILE_EXTENSION))
        })
    }

    fn required_path(&self, name: &str) -> Result<PathBuf> {
        self.path_for(name).ok_or_else(|| {
            MigrationError::invalid(format!("Invalid object name '{}'", name)).into()
        })
    }

    fn read(path: &Path) -> Result<ObjectDescription> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog file {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse catalog file {}", path.display()))
    }

    fn write(&self, object: &ObjectDescription) -> Result<()> {
        let path = self.required_path(&object.name)?;
        let contents = serde_json::to_string_pretty(object)?;
        fs::write(&path, contents)
            .with_context(|| format!("Failed to write catalog file {}", path.display()))?;
        debug!("Wrote catalog entry {}", path.display());
        Ok(())
    }
}

impl CatalogSyncer for FileCatalogSyncer {
    fn get(&self, name: &str) -> Result<Option<ObjectDescription>> {
        let Some(path) = self.path_for(name) else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        Self::read(&path).map(Some)
    }

    fn list(&self) -> Result<Vec<ObjectDescription>> {
        let pattern = self
            .directory
            .join(format!("*.{}", CATALOG_FILE_EXTENSION));
        let pattern = pattern.to_string_lossy();

        let mut objects = Vec::new();
        for entry in glob::glob(&pattern)
            .with_context(|| format!("Invalid catalog directory pattern {}", pattern))?
        {
            let path = entry?;
            objects.push(Self::read(&path)?);
        }
        objects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(objects)
    }

    fn create(&self, object: &ObjectDescription) -> Result<()> {
        if self.required_path(&object.name)?.exists() {
            return Err(MigrationError::validation(
                ErrorCode::Duplicated,
                format!("Object '{}' already exists", object.name),
            )
            .into());
        }
        self.write(object)
    }

    fn update(&self, name: &str, object: &ObjectDescription) -> Result<()> {
        let path = self.required_path(name)?;
        if !path.exists() {
            return Err(MigrationError::validation(
                ErrorCode::ObjectNotFound,
                format!("Object '{}' does not exist", name),
            )
            .into());
        }
        if name != object.name {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove catalog file {}", path.display()))?;
        }
        self.write(object)
    }

    fn remove(&self, name: &str) -> Result<bool> {
        let Some(path) = self.path_for(name) else {
            return Ok(false);
        };
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path)
            .with_context(|| format!("Failed to remove catalog file {}", path.display()))?;
        Ok(true)
    }
}
