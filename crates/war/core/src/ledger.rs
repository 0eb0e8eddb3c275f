//! Append-only participant ledger of a single war.
//!
//! Every accepted fight action becomes one immutable [`Contribution`]. The
//! running counters kept by [`crate::War`] are a cache over this log:
//! [`ParticipantLedger::replay_totals`] recomputes them from scratch and the
//! engine post-validates every transition against that replay.
use std::collections::HashMap;

use crate::damage::DamageTotals;
use crate::error::{ConflictError, ErrorSeverity};
use crate::types::{ContributionId, Side, Timestamp, UserId, WarId};

/// One user's single fight action and the damage it dealt.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Contribution {
    pub id: ContributionId,
    pub war_id: WarId,
    pub user_id: UserId,
    pub side: Side,
    pub damage: u64,
    /// 1-based index of the round this contribution landed in.
    pub round: u8,
    pub recorded_at: Timestamp,
}

/// Errors raised when appending to the ledger.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LedgerError {
    #[error("{war} is closed; the ledger no longer accepts contributions")]
    Sealed { war: WarId },

    #[error("{user} already fights for the {existing} in {war}, cannot join the {requested}")]
    SideConflict {
        war: WarId,
        user: UserId,
        existing: Side,
        requested: Side,
    },
}

impl ConflictError for LedgerError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            LedgerError::Sealed { .. } => "LEDGER_SEALED",
            LedgerError::SideConflict { .. } => "LEDGER_SIDE_CONFLICT",
        }
    }
}

/// Append-only record of every contribution made to one war.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParticipantLedger {
    war_id: WarId,
    entries: Vec<Contribution>,
    /// Side each user committed to on their first contribution.
    sides: HashMap<UserId, Side>,
    /// Users in order of their first contribution.
    roster: Vec<UserId>,
    sealed: bool,
}

impl ParticipantLedger {
    pub fn new(war_id: WarId) -> Self {
        Self {
            war_id,
            entries: Vec::new(),
            sides: HashMap::new(),
            roster: Vec::new(),
            sealed: false,
        }
    }

    pub fn war_id(&self) -> WarId {
        self.war_id
    }

    /// Checks whether `user` may contribute for `side` without appending.
    pub fn check(&self, user: UserId, side: Side) -> Result<(), LedgerError> {
        if self.sealed {
            return Err(LedgerError::Sealed { war: self.war_id });
        }
        match self.sides.get(&user) {
            Some(&existing) if existing != side => Err(LedgerError::SideConflict {
                war: self.war_id,
                user,
                existing,
                requested: side,
            }),
            _ => Ok(()),
        }
    }

    /// Appends one contribution.
    ///
    /// Timestamps are clamped so they never go backwards; ordering by
    /// timestamp is therefore the same as append order.
    pub fn record(
        &mut self,
        user: UserId,
        side: Side,
        damage: u64,
        round: u8,
        now: Timestamp,
    ) -> Result<&Contribution, LedgerError> {
        self.check(user, side)?;

        let recorded_at = self
            .entries
            .last()
            .map_or(now, |last| last.recorded_at.max(now));
        let id = ContributionId(self.entries.len() as u64 + 1);

        if self.sides.insert(user, side).is_none() {
            self.roster.push(user);
        }
        self.entries.push(Contribution {
            id,
            war_id: self.war_id,
            user_id: user,
            side,
            damage,
            round,
            recorded_at,
        });

        let entry = &self.entries[self.entries.len() - 1];
        Ok(entry)
    }

    /// Stops accepting contributions. Idempotent.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Contributions that landed in `round`, ordered by timestamp.
    ///
    /// The returned iterator is lazy, finite and can be cloned to restart
    /// the traversal.
    pub fn contributions_for_round(&self, round: u8) -> RoundContributions<'_> {
        RoundContributions {
            entries: self.entries.iter(),
            round,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Contribution> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn side_of(&self, user: UserId) -> Option<Side> {
        self.sides.get(&user).copied()
    }

    /// Distinct participants with their committed side, in order of first
    /// contribution.
    pub fn participants(&self) -> impl Iterator<Item = (UserId, Side)> + '_ {
        self.roster
            .iter()
            .filter_map(|user| self.sides.get(user).map(|side| (*user, *side)))
    }

    pub fn participant_count(&self) -> usize {
        self.roster.len()
    }

    /// Damage dealt by each participant over the whole war, in roster order.
    pub fn damage_by_participant(&self) -> Vec<(UserId, Side, u64)> {
        let mut dealt: HashMap<UserId, u64> = HashMap::with_capacity(self.roster.len());
        for entry in &self.entries {
            *dealt.entry(entry.user_id).or_default() += entry.damage;
        }
        self.participants()
            .map(|(user, side)| (user, side, dealt.get(&user).copied().unwrap_or(0)))
            .collect()
    }

    /// Recomputes per-side totals from the log.
    pub fn replay_totals(&self) -> DamageTotals {
        self.entries
            .iter()
            .fold(DamageTotals::ZERO, |mut totals, entry| {
                totals.add(entry.side, entry.damage);
                totals
            })
    }

    /// Recomputes one round's per-side totals from the log.
    pub fn replay_round(&self, round: u8) -> DamageTotals {
        self.contributions_for_round(round)
            .fold(DamageTotals::ZERO, |mut totals, entry| {
                totals.add(entry.side, entry.damage);
                totals
            })
    }
}

/// Lazy view over the contributions of a single round.
#[derive(Clone, Debug)]
pub struct RoundContributions<'a> {
    entries: std::slice::Iter<'a, Contribution>,
    round: u8,
}

impl<'a> Iterator for RoundContributions<'a> {
    type Item = &'a Contribution;

    fn next(&mut self) -> Option<Self::Item> {
        let round = self.round;
        self.entries.by_ref().find(|entry| entry.round == round)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.entries.size_hint().1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAR: WarId = WarId(1);
    const ALICE: UserId = UserId(10);
    const BOB: UserId = UserId(11);

    #[test]
    fn record_assigns_sequential_ids_and_fixes_side() {
        let mut ledger = ParticipantLedger::new(WAR);
        let first = ledger
            .record(ALICE, Side::Attacker, 500, 1, Timestamp(10))
            .unwrap()
            .id;
        let second = ledger
            .record(ALICE, Side::Attacker, 300, 1, Timestamp(20))
            .unwrap()
            .id;

        assert_eq!(first, ContributionId(1));
        assert_eq!(second, ContributionId(2));
        assert_eq!(ledger.side_of(ALICE), Some(Side::Attacker));
        assert_eq!(ledger.participant_count(), 1);
    }

    #[test]
    fn switching_sides_is_rejected_without_appending() {
        let mut ledger = ParticipantLedger::new(WAR);
        ledger
            .record(ALICE, Side::Attacker, 500, 1, Timestamp(10))
            .unwrap();

        let err = ledger
            .record(ALICE, Side::Defender, 500, 1, Timestamp(20))
            .unwrap_err();

        assert_eq!(
            err,
            LedgerError::SideConflict {
                war: WAR,
                user: ALICE,
                existing: Side::Attacker,
                requested: Side::Defender,
            }
        );
        assert_eq!(ledger.len(), 1);
        assert_eq!(err.error_code(), "LEDGER_SIDE_CONFLICT");
    }

    #[test]
    fn sealed_ledger_rejects_everything() {
        let mut ledger = ParticipantLedger::new(WAR);
        ledger.seal();
        assert_eq!(
            ledger.record(BOB, Side::Defender, 1, 1, Timestamp(1)),
            Err(LedgerError::Sealed { war: WAR })
        );
        assert!(ledger.is_empty());
    }

    #[test]
    fn round_view_is_ordered_and_restartable() {
        let mut ledger = ParticipantLedger::new(WAR);
        ledger
            .record(ALICE, Side::Attacker, 100, 1, Timestamp(30))
            .unwrap();
        ledger
            .record(BOB, Side::Defender, 200, 1, Timestamp(20))
            .unwrap();
        ledger
            .record(ALICE, Side::Attacker, 300, 2, Timestamp(40))
            .unwrap();

        let round_one = ledger.contributions_for_round(1);
        let restarted = round_one.clone();

        let stamps: Vec<Timestamp> = round_one.map(|c| c.recorded_at).collect();
        // The late stamp is clamped to keep the log monotone.
        assert_eq!(stamps, vec![Timestamp(30), Timestamp(30)]);
        assert_eq!(restarted.count(), 2);
        assert_eq!(ledger.contributions_for_round(2).count(), 1);
        assert_eq!(ledger.contributions_for_round(3).count(), 0);
    }

    #[test]
    fn replay_matches_sum_of_entries() {
        let mut ledger = ParticipantLedger::new(WAR);
        ledger
            .record(ALICE, Side::Attacker, 100, 1, Timestamp(1))
            .unwrap();
        ledger
            .record(BOB, Side::Defender, 250, 1, Timestamp(2))
            .unwrap();
        ledger
            .record(ALICE, Side::Attacker, 50, 2, Timestamp(3))
            .unwrap();

        assert_eq!(ledger.replay_totals(), DamageTotals::new(150, 250));
        assert_eq!(ledger.replay_round(1), DamageTotals::new(100, 250));
        assert_eq!(
            ledger.damage_by_participant(),
            vec![(ALICE, Side::Attacker, 150), (BOB, Side::Defender, 250)]
        );
    }
}
