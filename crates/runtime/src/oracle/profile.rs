use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use thiserror::Error;
use war_core::UserId;

/// Errors raised by a profile service.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum OracleError {
    /// The service could not answer; the same request may succeed later.
    #[error("profile service unavailable: {0}")]
    Unavailable(String),

    #[error("{0} has no profile")]
    UnknownUser(UserId),
}

impl OracleError {
    /// Whether retrying the same lookup can help.
    pub fn is_transient(&self) -> bool {
        matches!(self, OracleError::Unavailable(_))
    }
}

/// Read access to user profiles owned by another service.
#[async_trait]
pub trait ProfileOracle: Send + Sync {
    /// Current strength used to roll a fight's damage.
    async fn current_strength(&self, user: UserId) -> Result<u32, OracleError>;

    /// Rank shown by the profile service, if it keeps its own.
    async fn user_rank(&self, _user: UserId) -> Result<Option<String>, OracleError> {
        Ok(None)
    }

    /// Medal count shown by the profile service, if it keeps its own.
    async fn user_medals(&self, _user: UserId) -> Result<Option<u32>, OracleError> {
        Ok(None)
    }
}

/// Fixed in-memory profiles.
///
/// Unknown users fall back to `default_strength` when one is set.
#[derive(Debug, Default)]
pub struct StaticProfileOracle {
    strengths: RwLock<HashMap<UserId, u32>>,
    default_strength: Option<u32>,
}

impl StaticProfileOracle {
    /// Strength every account starts with.
    pub const DEFAULT_STRENGTH: u32 = 100;

    pub fn new() -> Self {
        Self::default()
    }

    /// Every unknown user gets `strength`.
    pub fn with_default_strength(strength: u32) -> Self {
        Self {
            strengths: RwLock::default(),
            default_strength: Some(strength),
        }
    }

    pub fn with_user(self, user: UserId, strength: u32) -> Self {
        self.set_strength(user, strength);
        self
    }

    pub fn set_strength(&self, user: UserId, strength: u32) {
        match self.strengths.write() {
            Ok(mut strengths) => {
                strengths.insert(user, strength);
            }
            Err(poisoned) => {
                poisoned.into_inner().insert(user, strength);
            }
        }
    }
}

#[async_trait]
impl ProfileOracle for StaticProfileOracle {
    async fn current_strength(&self, user: UserId) -> Result<u32, OracleError> {
        let strengths = self
            .strengths
            .read()
            .map_err(|_| OracleError::Unavailable("profile table lock poisoned".into()))?;
        strengths
            .get(&user)
            .copied()
            .or(self.default_strength)
            .ok_or(OracleError::UnknownUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_oracle_falls_back_to_default() {
        let oracle = StaticProfileOracle::with_default_strength(100).with_user(UserId(1), 250);
        assert_eq!(oracle.current_strength(UserId(1)).await, Ok(250));
        assert_eq!(oracle.current_strength(UserId(2)).await, Ok(100));
        assert_eq!(oracle.user_rank(UserId(1)).await, Ok(None));
    }

    #[tokio::test]
    async fn unknown_user_without_default_is_not_transient() {
        let oracle = StaticProfileOracle::new();
        let err = oracle.current_strength(UserId(9)).await.unwrap_err();
        assert_eq!(err, OracleError::UnknownUser(UserId(9)));
        assert!(!err.is_transient());
    }
}
