//! Durable audit storage for accepted contributions.
//!
//! - [`InMemoryContributionLog`] backs tests and ephemeral engines.
//! - [`FileContributionLog`] appends JSON lines to a file on disk.
mod error;
mod file;
mod memory;
mod traits;

pub use error::{RepositoryError, Result};
pub use file::FileContributionLog;
pub use memory::InMemoryContributionLog;
pub use traits::ContributionRepository;
