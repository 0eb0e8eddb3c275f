//! Adapters for the external profile service.
//!
//! The engine never owns a user's strength: it is read from a
//! [`ProfileOracle`] before each fight, outside of any war lock.
mod profile;

pub use profile::{OracleError, ProfileOracle, StaticProfileOracle};
