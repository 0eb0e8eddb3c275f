//! Unified error types surfaced by the runtime API.
//!
//! Wraps failures from the core reducer, the profile service and the audit
//! log so callers get one error type with a severity, a stable code and a
//! user-facing reason.
use thiserror::Error;
use war_core::{ConflictError, ErrorSeverity, ExecuteError, Side, UserId, WarId};

pub use crate::oracle::OracleError;
pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("{0} not found")]
    WarNotFound(WarId),

    #[error("{0} is closed")]
    WarClosed(WarId),

    #[error("invalid side '{requested}' for {user} in {war}")]
    InvalidSide {
        war: WarId,
        user: UserId,
        requested: String,
        /// Side the user already committed to, when that is the conflict.
        existing: Option<Side>,
    },

    #[error("strength of {user} unavailable after {attempts} attempt(s)")]
    DependencyUnavailable {
        user: UserId,
        attempts: u32,
        #[source]
        source: OracleError,
    },

    #[error("{0} already exists")]
    WarAlreadyExists(WarId),

    #[error("invalid war: {0}")]
    InvalidWar(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] war_core::ConfigError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("{0} lock was poisoned")]
    LockPoisoned(&'static str),

    #[error("war transition failed: {0}")]
    Transition(#[source] ExecuteError),

    #[error("engine requires a profile oracle before building")]
    MissingOracle,

    #[error("background worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),
}

impl RuntimeError {
    /// A single, definite message suitable for showing to the player.
    pub fn reason(&self) -> String {
        match self {
            RuntimeError::WarNotFound(_) => "This war does not exist.".to_string(),
            RuntimeError::WarClosed(_) => "This war has already ended.".to_string(),
            RuntimeError::InvalidSide {
                existing: Some(side),
                ..
            } => format!("You already fight for the {side} in this war."),
            RuntimeError::InvalidSide { requested, .. } => {
                format!("'{requested}' is not a side. Choose attacker or defender.")
            }
            RuntimeError::DependencyUnavailable { .. } => {
                "Your profile could not be loaded. Please try again.".to_string()
            }
            RuntimeError::WarAlreadyExists(_) => "A war with this id already exists.".to_string(),
            RuntimeError::InvalidWar(reason) => format!("This war cannot be created: {reason}."),
            RuntimeError::Config(_)
            | RuntimeError::Repository(_)
            | RuntimeError::LockPoisoned(_)
            | RuntimeError::Transition(_)
            | RuntimeError::MissingOracle
            | RuntimeError::WorkerJoin(_) => "Something went wrong on our side.".to_string(),
        }
    }
}

impl ConflictError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            RuntimeError::WarNotFound(_)
            | RuntimeError::WarClosed(_)
            | RuntimeError::InvalidSide { .. }
            | RuntimeError::WarAlreadyExists(_)
            | RuntimeError::InvalidWar(_)
            | RuntimeError::Config(_) => ErrorSeverity::Validation,
            RuntimeError::DependencyUnavailable { .. } => ErrorSeverity::Recoverable,
            RuntimeError::Repository(_)
            | RuntimeError::LockPoisoned(_)
            | RuntimeError::MissingOracle
            | RuntimeError::WorkerJoin(_) => ErrorSeverity::Internal,
            RuntimeError::Transition(inner) => inner.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            RuntimeError::WarNotFound(_) => "WAR_NOT_FOUND",
            RuntimeError::WarClosed(_) => "WAR_CLOSED",
            RuntimeError::InvalidSide { .. } => "INVALID_SIDE",
            RuntimeError::DependencyUnavailable { .. } => "DEPENDENCY_UNAVAILABLE",
            RuntimeError::WarAlreadyExists(_) => "WAR_ALREADY_EXISTS",
            RuntimeError::InvalidWar(_) => "INVALID_WAR",
            RuntimeError::Config(_) => "INVALID_CONFIG",
            RuntimeError::Repository(_) => "REPOSITORY_FAILURE",
            RuntimeError::LockPoisoned(_) => "LOCK_POISONED",
            RuntimeError::Transition(inner) => inner.error_code(),
            RuntimeError::MissingOracle => "MISSING_ORACLE",
            RuntimeError::WorkerJoin(_) => "WORKER_JOIN",
        }
    }
}
