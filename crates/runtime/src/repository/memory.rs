//! In-memory contribution log.

use std::sync::RwLock;

use war_core::{Contribution, WarId};

use super::{ContributionRepository, RepositoryError, Result};

/// In-memory contribution log for tests and ephemeral engines.
///
/// Thread-safe but not persistent across process restarts.
#[derive(Debug, Default)]
pub struct InMemoryContributionLog {
    entries: RwLock<Vec<Contribution>>,
}

impl InMemoryContributionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all entries (for testing/debugging).
    pub fn get_all(&self) -> Result<Vec<Contribution>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(entries.clone())
    }
}

impl ContributionRepository for InMemoryContributionLog {
    fn append(&self, contribution: &Contribution) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        entries.push(contribution.clone());
        Ok(())
    }

    fn load_war(&self, war: WarId) -> Result<Vec<Contribution>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(entries
            .iter()
            .filter(|entry| entry.war_id == war)
            .cloned()
            .collect())
    }

    fn len(&self) -> Result<usize> {
        let entries = self
            .entries
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(entries.len())
    }
}
