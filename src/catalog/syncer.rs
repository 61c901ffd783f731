use super::object::ObjectDescription;
use crate::error::{ErrorCode, MigrationError};
use anyhow::Result;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// Storage for object descriptions, atomic per object.
///
/// Implementations only need single-object atomicity; multi-object
/// consistency is provided by [`super::CatalogTransaction`].
pub trait CatalogSyncer {
    fn get(&self, name: &str) -> Result<Option<ObjectDescription>>;
    fn list(&self) -> Result<Vec<ObjectDescription>>;
    fn create(&self, object: &ObjectDescription) -> Result<()>;
    fn update(&self, name: &str, object: &ObjectDescription) -> Result<()>;
    /// Returns false when nothing was stored under `name`
    fn remove(&self, name: &str) -> Result<bool>;

    /// Fetch an object that must exist
    fn get_required(&self, name: &str) -> Result<ObjectDescription> {
        self.get(name)?.ok_or_else(|| {
            MigrationError::validation(
                ErrorCode::ObjectNotFound,
                format!("Object '{}' does not exist", name),
            )
            .into()
        })
    }
}

impl<T: CatalogSyncer + ?Sized> CatalogSyncer for &T {
    fn get(&self, name: &str) -> Result<Option<ObjectDescription>> {
        (**self).get(name)
    }

    fn list(&self) -> Result<Vec<ObjectDescription>> {
        (**self).list()
    }

    fn create(&self, object: &ObjectDescription) -> Result<()> {
        (**self).create(object)
    }

    fn update(&self, name: &str, object: &ObjectDescription) -> Result<()> {
        (**self).update(name, object)
    }

    fn remove(&self, name: &str) -> Result<bool> {
        (**self).remove(name)
    }
}

/// Catalog kept in process memory
#[derive(Debug, Default)]
pub struct InMemoryCatalogSyncer {
    objects: Mutex<BTreeMap<String, ObjectDescription>>,
}

impl InMemoryCatalogSyncer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_objects(objects: Vec<ObjectDescription>) -> Self {
        let syncer = Self::new();
        {
            let mut map = syncer.lock();
            for object in objects {
                map.insert(object.name.clone(), object);
            }
        }
        syncer
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, ObjectDescription>> {
        // A poisoned map is still structurally valid
        self.objects.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl CatalogSyncer for InMemoryCatalogSyncer {
    fn get(&self, name: &str) -> Result<Option<ObjectDescription>> {
        Ok(self.lock().get(name).cloned())
    }

    fn list(&self) -> Result<Vec<ObjectDescription>> {
        Ok(self.lock().values().cloned().collect())
    }

    fn create(&self, object: &ObjectDescription) -> Result<()> {
        let mut map = self.lock();
        if map.contains_key(&object.name) {
            return Err(MigrationError::validation(
                ErrorCode::Duplicated,
                format!("Object '{}' already exists", object.name),
            )
            .into());
        }
        map.insert(object.name.clone(), object.clone());
        Ok(())
    }

    fn update(&self, name: &str, object: &ObjectDescription) -> Result<()> {
        let mut map = self.lock();
        if map.remove(name).is_none() {
            return Err(MigrationError::validation(
                ErrorCode::ObjectNotFound,
                format!("Object '{}' does not exist", name),
            )
            .into());
        }
        map.insert(object.name.clone(), object.clone());
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<bool> {
        Ok(self.lock().remove(name).is_some())
    }
}
