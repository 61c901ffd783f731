//! Migration manager.
//!
//! Applies migration documents inside one global transaction made of a
//! catalog transaction and a database transaction, records history, spawns
//! the companion migrations that keep reverse links in step, and rolls
//! migrations back by running their inverse operations.

use super::cascade;
use super::constructor;
use super::description::{MigrationDescription, MigrationObjectDescription};
use super::factory::{self, Migration};
use super::generate_migration_id;
use super::history::{HistoryRecord, calculate_checksum};
use super::operations::Operation;
use super::reversion;
use crate::catalog::{CatalogSyncer, CatalogTransaction, ObjectDescription};
use crate::db::{Database, DbTransaction};
use crate::error::{ErrorCode, MigrationError};
use anyhow::Result;
use std::future::Future;
use std::pin::Pin;
use tracing::{debug, info, warn};

/// Where a run of operations left its object
struct RunOutcome {
    name: Option<String>,
    state: Option<ObjectDescription>,
}

pub struct MigrationManager<C, D> {
    catalog: C,
    database: D,
}

impl<C: CatalogSyncer, D: Database> MigrationManager<C, D> {
    pub fn new(catalog: C, database: D) -> Self {
        Self { catalog, database }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn database(&self) -> &D {
        &self.database
    }

    /// Apply a migration document. In fake mode the catalog and history are
    /// updated but no DDL runs. Returns the document as recorded, with its
    /// generated id if it had none.
    pub async fn apply(
        &self,
        mut description: MigrationDescription,
        fake: bool,
    ) -> Result<MigrationDescription> {
        if description.id.is_empty() {
            description.id = generate_migration_id();
        }

        if self.database.find_history(&description.id).await?.is_some() {
            return Err(MigrationError::consistency(
                ErrorCode::AlreadyApplied,
                format!("Migration '{}' has already been applied", description.id),
            )
            .into());
        }
        self.check_parents(&description).await?;

        let migration = factory::build_migration(&description, &self.catalog)?;

        info!(
            "Applying migration {} to {}{}",
            description.id,
            description.object_name().unwrap_or_default(),
            if fake { " (fake)" } else { "" }
        );

        let mut catalog_tx = CatalogTransaction::begin(&self.catalog)?;
        let mut db_tx = self.database.begin().await?;
        let result = self
            .apply_in(&description, &migration, fake, &mut catalog_tx, &mut db_tx)
            .await;
        self.finish(result, catalog_tx, db_tx).await?;

        info!("Migration {} applied", description.id);
        Ok(description)
    }

    /// Roll back the latest migration of an object. Returns the id the
    /// object's history now ends with.
    pub async fn rollback(
        &self,
        description: &MigrationDescription,
        fake: bool,
    ) -> Result<Option<String>> {
        let record = self.find(&description.id).await?;
        self.ensure_latest(&record).await?;

        if calculate_checksum(&description.operations)? != record.checksum {
            warn!(
                "Operations of migration {} differ from the recorded ones, rolling back the recorded operations",
                record.id
            );
        }

        info!(
            "Rolling back migration {} of {}{}",
            record.id,
            record.apply_to,
            if fake { " (fake)" } else { "" }
        );

        let mut catalog_tx = CatalogTransaction::begin(&self.catalog)?;
        let mut db_tx = self.database.begin().await?;
        let result = self
            .rollback_in(&record, fake, &mut catalog_tx, &mut db_tx)
            .await;
        self.finish(result, catalog_tx, db_tx).await?;

        info!("Migration {} rolled back", record.id);
        Ok(record.parent().map(str::to_string))
    }

    /// Roll back every migration applied after `id`, newest first.
    /// Returns the ids rolled back.
    pub async fn rollback_to(&self, id: &str, fake: bool) -> Result<Vec<String>> {
        let target = self.find(id).await?;
        let later: Vec<HistoryRecord> = self
            .database
            .list_history(None)
            .await?
            .into_iter()
            .filter(|r| r.order > target.order)
            .rev()
            .collect();

        let mut rolled_back = Vec::with_capacity(later.len());
        for record in later {
            self.rollback(&record.to_description(), fake).await?;
            rolled_back.push(record.id);
        }
        Ok(rolled_back)
    }

    /// Build the migration taking the stored object to `desired`.
    ///
    /// The stored object is looked up as `object`, falling back to the name
    /// `desired` evolves. Without `desired` the object is deleted.
    pub async fn construct(
        &self,
        object: Option<&str>,
        desired: Option<&MigrationObjectDescription>,
    ) -> Result<MigrationDescription> {
        let name = object.or_else(|| desired.map(MigrationObjectDescription::match_name));
        let current = match name {
            Some(name) => self.catalog.get(name)?,
            None => None,
        };

        let latest = match &current {
            Some(current) => self.database.latest_history(&current.name).await?,
            None => None,
        };

        constructor::construct(
            current.as_ref(),
            desired,
            latest.as_ref().map(|r| r.id.as_str()),
        )
    }

    /// Recorded migrations in application order
    pub async fn history(&self, object: Option<&str>) -> Result<Vec<HistoryRecord>> {
        self.database.list_history(object).await
    }

    /// Records of `object` sharing the predecessor of its latest migration
    pub async fn preceding_migrations(&self, object: &str) -> Result<Vec<HistoryRecord>> {
        let Some(latest) = self.database.latest_history(object).await? else {
            return Ok(Vec::new());
        };
        Ok(self
            .database
            .list_history(Some(object))
            .await?
            .into_iter()
            .filter(|r| r.parent() == latest.parent())
            .collect())
    }

    /// A recorded migration
    pub async fn find(&self, id: &str) -> Result<HistoryRecord> {
        self.database.find_history(id).await?.ok_or_else(|| {
            MigrationError::consistency(
                ErrorCode::ObjectNotFound,
                format!("Migration '{}' has not been applied", id),
            )
            .into()
        })
    }

    async fn check_parents(&self, description: &MigrationDescription) -> Result<()> {
        // Each object's history is a single chain
        if description.depends_on.len() > 1 {
            return Err(MigrationError::invalid(format!(
                "Migration '{}' depends on {} migrations, at most one parent is allowed",
                description.id,
                description.depends_on.len()
            ))
            .into());
        }
        if description.apply_to.is_empty() {
            return Ok(());
        }

        let latest = self.database.latest_history(&description.apply_to).await?;
        let latest_id = latest.as_ref().map(|r| r.id.as_str());
        let expected = description.depends_on.first().map(String::as_str);

        if latest_id != expected {
            return Err(MigrationError::consistency(
                ErrorCode::ParentsChanged,
                format!(
                    "Migration '{}' depends on {} but the latest migration of '{}' is {}",
                    description.id,
                    expected.unwrap_or("nothing"),
                    description.apply_to,
                    latest_id.unwrap_or("none"),
                ),
            )
            .into());
        }
        Ok(())
    }

    async fn ensure_latest(&self, record: &HistoryRecord) -> Result<()> {
        let latest = self.database.latest_history(&record.apply_to).await?;
        match latest {
            Some(latest) if latest.id == record.id => Ok(()),
            Some(latest) => Err(MigrationError::consistency(
                ErrorCode::NotLatestMigration,
                format!(
                    "Migration '{}' is not the latest for '{}', '{}' must be rolled back first",
                    record.id, record.apply_to, latest.id
                ),
            )
            .into()),
            None => Err(MigrationError::consistency(
                ErrorCode::NotLatestMigration,
                format!("'{}' has no recorded migrations", record.apply_to),
            )
            .into()),
        }
    }

    async fn apply_in(
        &self,
        description: &MigrationDescription,
        migration: &Migration,
        fake: bool,
        catalog_tx: &mut CatalogTransaction,
        db_tx: &mut D::Transaction,
    ) -> Result<()> {
        let start = (!migration.apply_to.is_empty()).then(|| migration.apply_to.clone());
        let outcome = self
            .run_operations(start, &migration.operations, fake, catalog_tx, db_tx)
            .await?;

        let apply_to = outcome.name.unwrap_or_else(|| migration.apply_to.clone());
        let record = HistoryRecord::new(
            description,
            &apply_to,
            migration.previous_state.clone(),
            outcome.state,
        )?;
        db_tx.record_history(&record).await
    }

    async fn rollback_in(
        &self,
        record: &HistoryRecord,
        fake: bool,
        catalog_tx: &mut CatalogTransaction,
        db_tx: &mut D::Transaction,
    ) -> Result<()> {
        if !fake {
            let inverses =
                reversion::inverse_operations(record.previous_state.as_ref(), &record.operations)?;
            self.run_operations(
                Some(record.apply_to.clone()),
                &inverses,
                false,
                catalog_tx,
                db_tx,
            )
            .await?;

            if let Some(previous) = &record.previous_state {
                self.restore(previous, catalog_tx)?;
            }
        }

        if !db_tx.remove_history(&record.id).await? {
            return Err(MigrationError::consistency(
                ErrorCode::ObjectNotFound,
                format!("Migration '{}' disappeared from history", record.id),
            )
            .into());
        }
        Ok(())
    }

    /// Write back the recorded description. Reverse links added since by
    /// other objects are kept.
    fn restore(&self, previous: &ObjectDescription, catalog_tx: &mut CatalogTransaction) -> Result<()> {
        let Some(current) = self.catalog.get(&previous.name)? else {
            return Ok(());
        };

        let mut restored = previous.clone();
        for field in current.fields.iter().filter(|f| f.is_outer_link()) {
            if restored.find_field(&field.name).is_none() {
                restored.fields.push(field.clone());
            }
        }

        if restored != current {
            catalog_tx.update(&self.catalog, &previous.name, &restored)?;
        }
        Ok(())
    }

    fn current_state(&self, name: Option<&str>) -> Result<Option<ObjectDescription>> {
        match name {
            Some(name) => self.catalog.get(name),
            None => Ok(None),
        }
    }

    /// Run operations against the object named `name` (`None` when the first
    /// operation creates it), cascades included
    async fn run_operations(
        &self,
        mut name: Option<String>,
        operations: &[Operation],
        fake: bool,
        catalog_tx: &mut CatalogTransaction,
        db_tx: &mut D::Transaction,
    ) -> Result<RunOutcome> {
        for operation in operations {
            let mut current = self.current_state(name.as_deref())?;

            let before = cascade::run_before(operation, current.as_ref(), &self.catalog)?;
            if !before.is_empty() {
                for spawned in &before {
                    self.run_spawned(spawned, fake, catalog_tx, db_tx).await?;
                }
                current = self.current_state(name.as_deref())?;
            }

            debug!(
                "Running {} on {}",
                operation.kind(),
                name.as_deref().unwrap_or("<new object>")
            );
            let updated =
                operation.sync_meta_description(current.as_ref(), catalog_tx, &self.catalog)?;
            if !fake {
                operation
                    .sync_db_description(current.as_ref(), updated.as_ref(), db_tx, &self.catalog)
                    .await?;
            }

            for spawned in cascade::run_after(operation, current.as_ref(), updated.as_ref(), &self.catalog)? {
                self.run_spawned(&spawned, fake, catalog_tx, db_tx).await?;
            }

            if let Some(updated) = updated {
                name = Some(updated.name);
            }
        }

        let state = self.current_state(name.as_deref())?;
        Ok(RunOutcome { name, state })
    }

    /// Companion migrations run in the caller's transaction and are not
    /// recorded
    fn run_spawned<'a>(
        &'a self,
        description: &'a MigrationDescription,
        fake: bool,
        catalog_tx: &'a mut CatalogTransaction,
        db_tx: &'a mut D::Transaction,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + 'a>> {
        Box::pin(async move {
            debug!(
                "Cascading {} to {}",
                description
                    .operations
                    .iter()
                    .map(|op| op.kind())
                    .collect::<Vec<_>>()
                    .join(", "),
                description.apply_to
            );
            let migration = factory::build_migration(description, &self.catalog)?;
            let start = (!migration.apply_to.is_empty()).then(|| migration.apply_to.clone());
            self.run_operations(
                start,
                &migration.operations,
                fake,
                catalog_tx,
                db_tx,
            )
            .await?;
            Ok(())
        })
    }

    async fn finish(
        &self,
        result: Result<()>,
        mut catalog_tx: CatalogTransaction,
        mut db_tx: D::Transaction,
    ) -> Result<()> {
        let result = match result {
            Ok(()) => db_tx.commit().await,
            Err(e) => {
                if let Err(rollback_err) = db_tx.rollback().await {
                    warn!("Failed to roll back database transaction: {:#}", rollback_err);
                }
                Err(e)
            }
        };

        match result {
            Ok(()) => catalog_tx.commit(),
            Err(e) => {
                if let Err(rollback_err) = catalog_tx.rollback(&self.catalog) {
                    warn!("Failed to restore catalog: {:#}", rollback_err);
                }
                Err(e)
            }
        }
    }
}
