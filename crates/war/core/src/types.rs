//! Identifiers, sides, timestamps and status tiers.
use core::fmt;
use core::time::Duration;

/// Unique identifier of a war.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WarId(pub u64);

impl fmt::Display for WarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "war-{}", self.0)
    }
}

/// Unique identifier of a player account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user-{}", self.0)
    }
}

/// Sequence number of a contribution within a single war's ledger.
///
/// Allocated monotonically starting at 1; never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContributionId(pub u64);

impl fmt::Display for ContributionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Milliseconds since the UNIX epoch.
///
/// The core never reads a clock; the runtime stamps every transition.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp(pub u64);

impl Timestamp {
    pub const EPOCH: Self = Self(0);

    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Returns `self + duration`, saturating at the end of time.
    pub fn saturating_add(self, duration: Duration) -> Self {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(millis))
    }

    /// Elapsed time since `earlier`, or zero if `earlier` is in the future.
    pub fn saturating_duration_since(self, earlier: Self) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }
}

/// The two belligerent sides of a war.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Side {
    Attacker,
    Defender,
}

impl Side {
    pub const fn opposite(self) -> Self {
        match self {
            Side::Attacker => Side::Defender,
            Side::Defender => Side::Attacker,
        }
    }
}

/// Coarse balance-of-power classification derived from the attacker's share
/// of total damage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum WarStatus {
    /// Attacker share above 70%.
    Overwhelming,
    /// Attacker share above 55%, up to 70%.
    Advantage,
    /// Attacker share above 45%, up to 55%.
    Balanced,
    /// Attacker share of 45% or less.
    Defensive,
}

impl WarStatus {
    pub const OVERWHELMING_ABOVE: u64 = 70;
    pub const ADVANTAGE_ABOVE: u64 = 55;
    pub const BALANCED_ABOVE: u64 = 45;

    /// Classifies an attacker percentage in `[0, 100]`.
    ///
    /// Boundary values belong to the lower tier: exactly 70% is
    /// `Advantage`, exactly 55% is `Balanced`, exactly 45% is `Defensive`.
    pub fn from_percentage(attacker_percentage: f64) -> Self {
        if attacker_percentage > Self::OVERWHELMING_ABOVE as f64 {
            WarStatus::Overwhelming
        } else if attacker_percentage > Self::ADVANTAGE_ABOVE as f64 {
            WarStatus::Advantage
        } else if attacker_percentage > Self::BALANCED_ABOVE as f64 {
            WarStatus::Balanced
        } else {
            WarStatus::Defensive
        }
    }

    /// Classifies raw damage totals without going through floating point.
    ///
    /// Zero total damage is `Balanced`.
    pub fn from_damage(attacker: u64, total: u64) -> Self {
        if total == 0 {
            return WarStatus::Balanced;
        }
        let scaled = u128::from(attacker) * 100;
        let above = |percent: u64| scaled > u128::from(percent) * u128::from(total);

        if above(Self::OVERWHELMING_ABOVE) {
            WarStatus::Overwhelming
        } else if above(Self::ADVANTAGE_ABOVE) {
            WarStatus::Advantage
        } else if above(Self::BALANCED_ABOVE) {
            WarStatus::Balanced
        } else {
            WarStatus::Defensive
        }
    }
}
