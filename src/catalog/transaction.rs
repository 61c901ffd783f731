//! Catalog side of the global transaction.
//!
//! The catalog store has no native undo, so rollback replays the snapshot
//! taken at `begin`: objects created since then are removed and every
//! snapshotted object is written back. This is compensation, not a durable
//! log; a crash between the two stores leaves them out of step.

use super::object::ObjectDescription;
use super::syncer::CatalogSyncer;
use crate::error::MigrationError;
use anyhow::Result;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Pending,
    Committed,
    RolledBack,
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionState::Pending => f.write_str("pending"),
            TransactionState::Committed => f.write_str("committed"),
            TransactionState::RolledBack => f.write_str("rolled back"),
        }
    }
}

#[derive(Debug)]
pub struct CatalogTransaction {
    snapshot: Vec<ObjectDescription>,
    created: Vec<String>,
    state: TransactionState,
}

impl CatalogTransaction {
    pub fn begin(syncer: &impl CatalogSyncer) -> Result<Self> {
        let snapshot = syncer.list()?;
        debug!("Catalog transaction started with {} objects", snapshot.len());
        Ok(Self {
            snapshot,
            created: Vec::new(),
            state: TransactionState::Pending,
        })
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Create an object and remember it for rollback
    pub fn create(&mut self, syncer: &impl CatalogSyncer, object: &ObjectDescription) -> Result<()> {
        self.ensure_pending("write to")?;
        syncer.create(object)?;
        self.created.push(object.name.clone());
        Ok(())
    }

    pub fn update(
        &mut self,
        syncer: &impl CatalogSyncer,
        name: &str,
        object: &ObjectDescription,
    ) -> Result<()> {
        self.ensure_pending("write to")?;
        syncer.update(name, object)
    }

    pub fn remove(&mut self, syncer: &impl CatalogSyncer, name: &str) -> Result<bool> {
        self.ensure_pending("write to")?;
        syncer.remove(name)
    }

    pub fn commit(&mut self) -> Result<()> {
        self.ensure_pending("commit")?;
        self.state = TransactionState::Committed;
        Ok(())
    }

    pub fn rollback(&mut self, syncer: &impl CatalogSyncer) -> Result<()> {
        self.ensure_pending("roll back")?;

        for name in self.created.iter().rev() {
            syncer.remove(name)?;
        }

        // Objects renamed during the transaction show up under names the
        // snapshot does not know.
        let known: BTreeSet<&str> = self.snapshot.iter().map(|o| o.name.as_str()).collect();
        for object in syncer.list()? {
            if !known.contains(object.name.as_str()) {
                warn!("Removing catalog entry '{}' left by a failed migration", object.name);
                syncer.remove(&object.name)?;
            }
        }

        for object in &self.snapshot {
            if syncer.get(&object.name)?.is_some() {
                syncer.update(&object.name, object)?;
            } else {
                syncer.create(object)?;
            }
        }

        self.state = TransactionState::RolledBack;
        debug!("Catalog transaction rolled back");
        Ok(())
    }

    fn ensure_pending(&self, action: &str) -> Result<()> {
        if self.state != TransactionState::Pending {
            return Err(MigrationError::transaction(action, self.state.to_string()).into());
        }
        Ok(())
    }
}
