//! War configuration constants and tunable parameters.
use core::time::Duration;

/// Errors raised while validating a [`WarConfig`] or building a [`RankTable`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("round damage threshold must be positive")]
    ZeroRoundThreshold,

    #[error("round duration must be positive")]
    ZeroRoundDuration,

    #[error("war duration ({war:?}) is shorter than one round ({round:?})")]
    WarShorterThanRound { war: Duration, round: Duration },

    #[error("decisive share must be in 51..=100, got {0}")]
    DecisiveShareOutOfRange(u8),

    #[error("damage per strength must be positive")]
    ZeroDamagePerStrength,

    #[error("damage variance must be below 100%, got {0}%")]
    VarianceTooLarge(u32),

    #[error("rank table is empty")]
    EmptyRankTable,

    #[error("rank table must start at threshold 0, got {0}")]
    RankTableMissingBase(u64),

    #[error("rank thresholds must be strictly increasing ({previous} then {next})")]
    RankTableNotMonotonic { previous: u64, next: u64 },
}

/// Ordered `(threshold, rank name)` pairs mapping a rank score to a title.
///
/// Thresholds are strictly increasing and the first one is 0, so every
/// score maps to exactly one rank and a higher score never maps to a lower
/// rank.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankTable {
    tiers: Vec<(u64, String)>,
}

impl RankTable {
    pub fn new<I, S>(tiers: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (u64, S)>,
        S: Into<String>,
    {
        let tiers: Vec<(u64, String)> = tiers
            .into_iter()
            .map(|(threshold, name)| (threshold, name.into()))
            .collect();

        let Some(&(first, _)) = tiers.first() else {
            return Err(ConfigError::EmptyRankTable);
        };
        if first != 0 {
            return Err(ConfigError::RankTableMissingBase(first));
        }
        for pair in tiers.windows(2) {
            if pair[1].0 <= pair[0].0 {
                return Err(ConfigError::RankTableNotMonotonic {
                    previous: pair[0].0,
                    next: pair[1].0,
                });
            }
        }
        Ok(Self { tiers })
    }

    /// Returns the highest rank whose threshold does not exceed `score`.
    pub fn rank_for(&self, score: u64) -> &str {
        self.tiers
            .iter()
            .rev()
            .find(|(threshold, _)| *threshold <= score)
            .or_else(|| self.tiers.first())
            .map(|(_, name)| name.as_str())
            .unwrap_or_default()
    }

    /// The rank every new account starts with.
    pub fn base_rank(&self) -> &str {
        self.rank_for(0)
    }

    pub fn tiers(&self) -> &[(u64, String)] {
        &self.tiers
    }
}

impl Default for RankTable {
    fn default() -> Self {
        Self {
            tiers: [
                (0, "Private"),
                (10_000, "Corporal"),
                (50_000, "Sergeant"),
                (150_000, "Lieutenant"),
                (400_000, "Captain"),
                (1_000_000, "Major"),
                (2_500_000, "Colonel"),
                (6_000_000, "General"),
            ]
            .into_iter()
            .map(|(threshold, name)| (threshold, name.to_string()))
            .collect(),
        }
    }
}

/// War configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WarConfig {
    /// Combined damage (attacker + defender) that closes the open round.
    pub round_damage_threshold: u64,
    /// Time slice after which an open round closes regardless of damage.
    pub round_duration: Duration,
    /// Time budget of a whole war, measured from its creation.
    pub war_duration: Duration,
    /// Share (in percent) of cumulative damage held by one side that ends
    /// the war at a round boundary. `None` disables early decisions.
    pub decisive_share_percent: Option<u8>,
    /// Number of closed rounds required before a decisive share counts.
    pub min_rounds_before_decisive: usize,
    /// Mean damage dealt per point of strength.
    pub damage_per_strength: u64,
    /// Uniform variance around the mean, in percent.
    pub damage_variance_percent: u32,
    /// Rank score credited per medal on top of lifetime damage.
    pub medal_weight: u64,
    pub rank_table: RankTable,
}

impl WarConfig {
    // ===== structural constants =====
    /// A war never has more than this many rounds.
    pub const MAX_ROUNDS: usize = 11;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_ROUND_DAMAGE_THRESHOLD: u64 = 100_000;
    pub const DEFAULT_ROUND_DURATION: Duration = Duration::from_secs(30 * 60);
    pub const DEFAULT_WAR_DURATION: Duration = Duration::from_secs(6 * 60 * 60);
    pub const DEFAULT_DECISIVE_SHARE_PERCENT: u8 = 90;
    pub const DEFAULT_MIN_ROUNDS_BEFORE_DECISIVE: usize = 6;
    pub const DEFAULT_DAMAGE_PER_STRENGTH: u64 = 10;
    pub const DEFAULT_DAMAGE_VARIANCE_PERCENT: u32 = 20;
    pub const DEFAULT_MEDAL_WEIGHT: u64 = 25_000;

    pub fn new() -> Self {
        Self {
            round_damage_threshold: Self::DEFAULT_ROUND_DAMAGE_THRESHOLD,
            round_duration: Self::DEFAULT_ROUND_DURATION,
            war_duration: Self::DEFAULT_WAR_DURATION,
            decisive_share_percent: Some(Self::DEFAULT_DECISIVE_SHARE_PERCENT),
            min_rounds_before_decisive: Self::DEFAULT_MIN_ROUNDS_BEFORE_DECISIVE,
            damage_per_strength: Self::DEFAULT_DAMAGE_PER_STRENGTH,
            damage_variance_percent: Self::DEFAULT_DAMAGE_VARIANCE_PERCENT,
            medal_weight: Self::DEFAULT_MEDAL_WEIGHT,
            rank_table: RankTable::default(),
        }
    }

    pub fn with_round_damage_threshold(mut self, threshold: u64) -> Self {
        self.round_damage_threshold = threshold;
        self
    }

    pub fn with_round_duration(mut self, duration: Duration) -> Self {
        self.round_duration = duration;
        self
    }

    pub fn with_war_duration(mut self, duration: Duration) -> Self {
        self.war_duration = duration;
        self
    }

    pub fn with_decisive_share(mut self, percent: Option<u8>) -> Self {
        self.decisive_share_percent = percent;
        self
    }

    pub fn with_damage_variance(mut self, percent: u32) -> Self {
        self.damage_variance_percent = percent;
        self
    }

    pub fn with_rank_table(mut self, table: RankTable) -> Self {
        self.rank_table = table;
        self
    }

    /// Validate configuration for internal consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.round_damage_threshold == 0 {
            return Err(ConfigError::ZeroRoundThreshold);
        }
        if self.round_duration.is_zero() {
            return Err(ConfigError::ZeroRoundDuration);
        }
        if self.war_duration < self.round_duration {
            return Err(ConfigError::WarShorterThanRound {
                war: self.war_duration,
                round: self.round_duration,
            });
        }
        if let Some(share) = self.decisive_share_percent
            && !(51..=100).contains(&share)
        {
            return Err(ConfigError::DecisiveShareOutOfRange(share));
        }
        if self.damage_per_strength == 0 {
            return Err(ConfigError::ZeroDamagePerStrength);
        }
        if self.damage_variance_percent >= 100 {
            return Err(ConfigError::VarianceTooLarge(self.damage_variance_percent));
        }
        Ok(())
    }
}

impl Default for WarConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(WarConfig::default().validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_inconsistent_values() {
        let config = WarConfig::default().with_round_damage_threshold(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroRoundThreshold));

        let config = WarConfig::default().with_decisive_share(Some(50));
        assert_eq!(
            config.validate(),
            Err(ConfigError::DecisiveShareOutOfRange(50))
        );

        let config = WarConfig::default()
            .with_round_duration(Duration::from_secs(60))
            .with_war_duration(Duration::from_secs(30));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::WarShorterThanRound { .. })
        ));
    }

    #[test]
    fn rank_table_requires_monotonic_thresholds() {
        assert_eq!(
            RankTable::new(Vec::<(u64, &str)>::new()),
            Err(ConfigError::EmptyRankTable)
        );
        assert_eq!(
            RankTable::new([(5, "Recruit")]),
            Err(ConfigError::RankTableMissingBase(5))
        );
        assert_eq!(
            RankTable::new([(0, "Recruit"), (10, "Veteran"), (10, "Hero")]),
            Err(ConfigError::RankTableNotMonotonic {
                previous: 10,
                next: 10
            })
        );
    }

    #[test]
    fn rank_for_picks_highest_reached_tier() {
        let table = RankTable::new([(0, "Recruit"), (100, "Veteran"), (1_000, "Hero")]).unwrap();
        assert_eq!(table.rank_for(0), "Recruit");
        assert_eq!(table.rank_for(99), "Recruit");
        assert_eq!(table.rank_for(100), "Veteran");
        assert_eq!(table.rank_for(u64::MAX), "Hero");
        assert_eq!(table.base_rank(), "Recruit");
        assert_eq!(RankTable::default().base_rank(), "Private");
    }
}
