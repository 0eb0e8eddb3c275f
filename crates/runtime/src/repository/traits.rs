//! Repository contracts for the durable contribution audit log.

use war_core::{Contribution, WarId};

use super::Result;

/// Append-only audit log of accepted contributions.
///
/// A fight is committed to its war only after its contribution was
/// appended here. When `append` fails the fight is discarded, so the log
/// and the in-memory [`war_core::ParticipantLedger`] never disagree.
pub trait ContributionRepository: Send + Sync {
    /// Appends one contribution.
    fn append(&self, contribution: &Contribution) -> Result<()>;

    /// All contributions of `war`, in append order.
    fn load_war(&self, war: WarId) -> Result<Vec<Contribution>>;

    /// Total number of entries across all wars.
    fn len(&self) -> Result<usize>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Forces buffered entries to durable storage.
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}
