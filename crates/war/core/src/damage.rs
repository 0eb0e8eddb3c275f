//! Per-side damage counters.
use crate::types::{Side, WarStatus};

/// Damage attributed to each side of a war or a round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageTotals {
    pub attacker: u64,
    pub defender: u64,
}

impl DamageTotals {
    pub const ZERO: Self = Self {
        attacker: 0,
        defender: 0,
    };

    pub const fn new(attacker: u64, defender: u64) -> Self {
        Self { attacker, defender }
    }

    pub fn add(&mut self, side: Side, damage: u64) {
        match side {
            Side::Attacker => self.attacker = self.attacker.saturating_add(damage),
            Side::Defender => self.defender = self.defender.saturating_add(damage),
        }
    }

    pub const fn of(&self, side: Side) -> u64 {
        match side {
            Side::Attacker => self.attacker,
            Side::Defender => self.defender,
        }
    }

    pub const fn total(&self) -> u64 {
        self.attacker.saturating_add(self.defender)
    }

    pub const fn is_zero(&self) -> bool {
        self.attacker == 0 && self.defender == 0
    }

    /// Side with strictly more damage; an exact tie goes to the defender.
    pub const fn leader(&self) -> Side {
        if self.attacker > self.defender {
            Side::Attacker
        } else {
            Side::Defender
        }
    }

    /// Attacker share of total damage in percent. Zero damage reads as 50/50.
    pub fn attacker_percentage(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 50.0;
        }
        (self.attacker as f64 * 100.0) / total as f64
    }

    /// Returns true if either side holds at least `percent` of the damage.
    pub fn has_share_at_least(&self, percent: u8) -> bool {
        let total = u128::from(self.total());
        if total == 0 {
            return false;
        }
        let bar = u128::from(percent) * total;
        u128::from(self.attacker) * 100 >= bar || u128::from(self.defender) * 100 >= bar
    }

    pub fn status(&self) -> WarStatus {
        WarStatus::from_damage(self.attacker, self.total())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tie_goes_to_defender() {
        assert_eq!(DamageTotals::new(800, 800).leader(), Side::Defender);
        assert_eq!(DamageTotals::ZERO.leader(), Side::Defender);
        assert_eq!(DamageTotals::new(801, 800).leader(), Side::Attacker);
    }

    #[test]
    fn zero_damage_is_even_and_balanced() {
        let totals = DamageTotals::ZERO;
        assert_eq!(totals.attacker_percentage(), 50.0);
        assert_eq!(totals.status(), WarStatus::Balanced);
        assert!(!totals.has_share_at_least(90));
    }

    #[test]
    fn percentage_and_share() {
        let mut totals = DamageTotals::ZERO;
        totals.add(Side::Attacker, 900);
        totals.add(Side::Defender, 100);
        assert_eq!(totals.total(), 1_000);
        assert_eq!(totals.attacker_percentage(), 90.0);
        assert!(totals.has_share_at_least(90));
        assert!(!totals.has_share_at_least(91));
        assert_eq!(totals.status(), WarStatus::Overwhelming);
    }
}
