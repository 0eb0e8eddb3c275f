//! Error types for the war transition pipeline.
use crate::error::{ConflictError, ErrorSeverity};
use crate::ledger::LedgerError;
use crate::types::{Side, UserId, WarId};

/// Identifies which stage of the transition pipeline produced an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransitionPhase {
    PreValidate,
    Apply,
    PostValidate,
}

impl TransitionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionPhase::PreValidate => "pre_validate",
            TransitionPhase::Apply => "apply",
            TransitionPhase::PostValidate => "post_validate",
        }
    }
}

/// Associates a transition phase with the underlying error.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TransitionPhaseError<E> {
    pub phase: TransitionPhase,
    pub error: E,
}

impl<E> TransitionPhaseError<E> {
    pub fn new(phase: TransitionPhase, error: E) -> Self {
        Self { phase, error }
    }
}

impl<E: core::fmt::Display> core::fmt::Display for TransitionPhaseError<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} failed: {}", self.phase.as_str(), self.error)
    }
}

impl<E: core::fmt::Display + core::fmt::Debug> std::error::Error for TransitionPhaseError<E> {}

/// Running state disagrees with what the ledger says it should be.
///
/// Always a bug; never caused by caller input.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InvariantViolation {
    #[error("running totals {running:?} differ from ledger replay {replayed:?} in {war}")]
    TotalsDiverged {
        war: WarId,
        running: (u64, u64),
        replayed: (u64, u64),
    },

    #[error("round damage sums to {rounds:?} but running totals are {running:?} in {war}")]
    RoundSumDiverged {
        war: WarId,
        rounds: (u64, u64),
        running: (u64, u64),
    },

    #[error("{war} has {closed} closed rounds, more than the limit of {limit}")]
    TooManyRounds {
        war: WarId,
        closed: usize,
        limit: usize,
    },

    #[error("{war} is terminated but its ledger still accepts contributions")]
    UnsealedLedger { war: WarId },

    #[error("{war} is open but has no open round")]
    MissingOpenRound { war: WarId },
}

impl ConflictError for InvariantViolation {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Internal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::TotalsDiverged { .. } => "INVARIANT_TOTALS_DIVERGED",
            Self::RoundSumDiverged { .. } => "INVARIANT_ROUND_SUM_DIVERGED",
            Self::TooManyRounds { .. } => "INVARIANT_TOO_MANY_ROUNDS",
            Self::UnsealedLedger { .. } => "INVARIANT_UNSEALED_LEDGER",
            Self::MissingOpenRound { .. } => "INVARIANT_MISSING_OPEN_ROUND",
        }
    }
}

/// Errors raised by a fight action.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FightError {
    #[error("{war} is over")]
    WarClosed { war: WarId },

    #[error("{user} already fights for the {existing} in {war}, cannot join the {requested}")]
    SideConflict {
        war: WarId,
        user: UserId,
        existing: Side,
        requested: Side,
    },

    #[error("a fight must deal at least one point of damage")]
    ZeroDamage,

    #[error(transparent)]
    Invariant(#[from] InvariantViolation),
}

impl From<LedgerError> for FightError {
    fn from(error: LedgerError) -> Self {
        match error {
            LedgerError::Sealed { war } => Self::WarClosed { war },
            LedgerError::SideConflict {
                war,
                user,
                existing,
                requested,
            } => Self::SideConflict {
                war,
                user,
                existing,
                requested,
            },
        }
    }
}

impl ConflictError for FightError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::WarClosed { .. } | Self::SideConflict { .. } | Self::ZeroDamage => {
                ErrorSeverity::Validation
            }
            Self::Invariant(inner) => inner.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::WarClosed { .. } => "FIGHT_WAR_CLOSED",
            Self::SideConflict { .. } => "FIGHT_SIDE_CONFLICT",
            Self::ZeroDamage => "FIGHT_ZERO_DAMAGE",
            Self::Invariant(inner) => inner.error_code(),
        }
    }
}

/// Errors surfaced while executing a transition through the war engine.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ExecuteError {
    #[error("fight failed: {0}")]
    Fight(TransitionPhaseError<FightError>),

    #[error("tick failed: {0}")]
    Tick(TransitionPhaseError<InvariantViolation>),

    #[error("force close failed: {0}")]
    ForceClose(TransitionPhaseError<InvariantViolation>),
}

impl ExecuteError {
    pub fn phase(&self) -> TransitionPhase {
        match self {
            Self::Fight(inner) => inner.phase,
            Self::Tick(inner) | Self::ForceClose(inner) => inner.phase,
        }
    }
}

impl ConflictError for ExecuteError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Fight(inner) => inner.error.severity(),
            Self::Tick(inner) | Self::ForceClose(inner) => inner.error.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Fight(inner) => inner.error.error_code(),
            Self::Tick(inner) | Self::ForceClose(inner) => inner.error.error_code(),
        }
    }
}
