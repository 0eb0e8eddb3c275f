//! End-to-end scenarios against the conflict engine.
mod common;

use std::time::Duration;

use conflict_runtime::{Event, RoundEvent, RuntimeError, Topic, WarEvent};
use war_core::{
    Belligerents, ConflictError, RoundCloseReason, Side, TerminationReason, UserId, WarConfig,
    WarId, WarStatus,
};

const ALICE: UserId = UserId(1);
const BOB: UserId = UserId(2);

#[tokio::test]
async fn tied_round_goes_to_defender() {
    let clock = common::clock();
    let engine = common::engine(common::flat_rules(2_000), clock);
    let war = engine.create_war(common::alsace()).unwrap();
    let mut rounds = engine.subscribe(Topic::Round);

    let first = engine.fight(war.id, ALICE, "attacker").await.unwrap();
    assert_eq!(first.damage_dealt, 1_000);
    assert_eq!(
        first.message,
        "You fought for Germany and dealt 1000 damage!"
    );
    assert!(first.round_closed.is_none());
    assert_eq!(first.war.attacker_damage, 1_000);
    assert_eq!(first.war.attacker_percentage, 100.0);
    assert_eq!(first.war.status, WarStatus::Overwhelming);

    let second = engine.fight(war.id, BOB, "Defender").await.unwrap();
    assert_eq!(
        second.message,
        "You fought for France and dealt 1000 damage!"
    );
    let closed = second.round_closed.expect("threshold reached");
    assert_eq!(closed.round, 1);
    assert_eq!(closed.winner, Some(Side::Defender));
    assert_eq!(closed.close_reason, Some(RoundCloseReason::DamageThreshold));

    let view = second.war;
    assert_eq!(view.attacker_percentage, 50.0);
    assert_eq!(view.status, WarStatus::Balanced);
    assert_eq!(view.total_damage, 2_000);
    assert_eq!(view.participants, 2);
    assert_eq!(view.current_round, Some(2));

    match rounds.try_recv().unwrap() {
        Event::Round(RoundEvent::RoundClosed { war: id, round }) => {
            assert_eq!(id, war.id);
            assert_eq!(round.index, 1);
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert!(rounds.try_recv().is_err());
}

#[tokio::test]
async fn side_is_fixed_for_the_whole_war() {
    let engine = common::engine(common::flat_rules(100_000), common::clock());
    let war = engine.create_war(common::alsace()).unwrap();

    engine.fight(war.id, ALICE, "attacker").await.unwrap();
    let err = engine.fight(war.id, ALICE, "defender").await.unwrap_err();

    assert!(matches!(
        err,
        RuntimeError::InvalidSide {
            existing: Some(Side::Attacker),
            ..
        }
    ));
    assert_eq!(
        err.reason(),
        "You already fight for the attacker in this war."
    );
    assert_eq!(engine.contributions(war.id).await.unwrap().len(), 1);
    assert_eq!(engine.war(war.id).await.unwrap().defender_damage, 0);
}

#[tokio::test]
async fn unknown_side_and_war_are_rejected() {
    let engine = common::engine(common::flat_rules(100_000), common::clock());
    let war = engine.create_war(common::alsace()).unwrap();

    let err = engine.fight(war.id, ALICE, "neutral").await.unwrap_err();
    assert_eq!(err.error_code(), "INVALID_SIDE");

    let err = engine
        .fight(WarId(99), ALICE, "attacker")
        .await
        .unwrap_err();
    assert!(matches!(err, RuntimeError::WarNotFound(WarId(99))));
    assert!(engine.contributions(war.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn eleventh_round_ends_the_war_and_settles_stats() {
    let engine = common::engine(common::flat_rules(1_000), common::clock());
    let war = engine.create_war(common::alsace()).unwrap();
    let mut wars = engine.subscribe(Topic::War);

    for _ in 0..10 {
        let result = engine.fight(war.id, ALICE, "attacker").await.unwrap();
        assert!(result.war_outcome.is_none());
    }
    let last = engine.fight(war.id, BOB, "defender").await.unwrap();
    let outcome = last.war_outcome.expect("eleventh round closes the war");
    assert_eq!(outcome.reason, TerminationReason::RoundLimit);
    assert_eq!(outcome.winner, Side::Attacker);
    assert_eq!(outcome.rounds_fought, WarConfig::MAX_ROUNDS);
    assert_eq!(last.war.battle_rounds.len(), WarConfig::MAX_ROUNDS);
    assert!(!last.war.active);

    let settled = engine.user_stats(ALICE).await.unwrap();
    let err = engine.fight(war.id, ALICE, "attacker").await.unwrap_err();
    assert!(matches!(err, RuntimeError::WarClosed(_)));
    assert_eq!(engine.contributions(war.id).await.unwrap().len(), 11);
    assert_eq!(engine.war(war.id).await.unwrap(), last.war);

    let alice = engine.user_stats(ALICE).await.unwrap();
    assert_eq!(alice, settled);
    assert_eq!(alice.total_damage, 10_000);
    assert_eq!(
        (alice.battles_won, alice.battles_lost, alice.medals),
        (1, 0, 1)
    );
    // 10_000 damage + 25_000 for the medal.
    assert_eq!(alice.rank, "Corporal");
    let bob = engine.user_stats(BOB).await.unwrap();
    assert_eq!((bob.battles_won, bob.battles_lost, bob.medals), (0, 1, 0));

    let terminated = loop {
        match wars.recv().await.unwrap() {
            Event::War(WarEvent::WarTerminated { outcome, .. }) => break outcome,
            _ => continue,
        }
    };
    assert_eq!(terminated.reason, TerminationReason::RoundLimit);
}

#[tokio::test]
async fn deadline_is_enforced_by_ticks_and_fights() {
    let clock = common::clock();
    let rules = common::flat_rules(100_000)
        .with_round_duration(Duration::from_secs(60))
        .with_war_duration(Duration::from_secs(300));
    let engine = common::engine(rules, clock.clone());
    let war = engine.create_war(common::alsace()).unwrap();
    assert_eq!(war.time_left, "0h 5m");

    engine.fight(war.id, BOB, "defender").await.unwrap();

    clock.advance(Duration::from_secs(90));
    let report = engine.tick(engine.now()).await.unwrap();
    assert_eq!(report.rounds_closed, 1);
    assert!(report.wars_ended.is_empty());

    clock.advance(Duration::from_secs(300));
    let report = engine.tick(engine.now()).await.unwrap();
    assert_eq!(report.wars_ended, vec![war.id]);
    let active = engine.list_active_wars(engine.now()).await.unwrap();
    assert!(active.is_empty());

    let err = engine.fight(war.id, ALICE, "attacker").await.unwrap_err();
    assert!(matches!(err, RuntimeError::WarClosed(_)));

    let view = engine.war(war.id).await.unwrap();
    let outcome = view.outcome.unwrap();
    assert_eq!(outcome.reason, TerminationReason::Deadline);
    assert_eq!(outcome.winner, Side::Defender);
    assert_eq!(view.time_left, "0h 0m");
}

#[tokio::test]
async fn expired_war_rejects_fights_before_any_tick() {
    let clock = common::clock();
    let rules = common::flat_rules(100_000)
        .with_round_duration(Duration::from_secs(60))
        .with_war_duration(Duration::from_secs(120));
    let engine = common::engine(rules, clock.clone());
    let war = engine.create_war(common::alsace()).unwrap();

    clock.advance(Duration::from_secs(121));
    let err = engine.fight(war.id, ALICE, "attacker").await.unwrap_err();
    assert!(matches!(err, RuntimeError::WarClosed(_)));
    assert_eq!(err.reason(), "This war has already ended.");
}

#[tokio::test]
async fn force_close_is_final() {
    let engine = common::engine(common::flat_rules(100_000), common::clock());
    let war = engine.create_war(common::alsace()).unwrap();
    engine.fight(war.id, ALICE, "attacker").await.unwrap();

    let closed = engine.force_close(war.id, "maintenance").await.unwrap();
    let outcome = closed.outcome.unwrap();
    assert_eq!(outcome.reason, TerminationReason::ForceClosed);
    assert_eq!(outcome.winner, Side::Attacker);
    assert_eq!(closed.battle_rounds.len(), 1);
    assert_eq!(
        closed.battle_rounds[0].close_reason,
        Some(RoundCloseReason::WarEnded)
    );

    let again = engine.force_close(war.id, "twice").await.unwrap_err();
    assert!(matches!(again, RuntimeError::WarClosed(_)));
    assert!(engine.fight(war.id, ALICE, "attacker").await.is_err());
}

#[tokio::test]
async fn scheduler_input_is_validated() {
    let engine = common::engine(WarConfig::default(), common::clock());

    let err = engine
        .create_war(Belligerents::new("France", "france", "Lyon"))
        .unwrap_err();
    assert!(matches!(err, RuntimeError::InvalidWar(_)));

    let ticino = Belligerents::new("Italy", "Switzerland", "Ticino");
    engine.create_war_with_id(WarId(5), ticino).unwrap();
    let err = engine
        .create_war_with_id(WarId(5), Belligerents::new("Spain", "Portugal", "Porto"))
        .unwrap_err();
    assert!(matches!(err, RuntimeError::WarAlreadyExists(WarId(5))));

    // Generated ids skip past explicitly chosen ones.
    let next = engine
        .create_war(Belligerents::new("Spain", "Portugal", "Porto"))
        .unwrap();
    assert_eq!(next.id, WarId(6));
}

#[tokio::test]
async fn war_list_serializes_like_the_game_api() {
    let engine = common::engine(WarConfig::default(), common::clock());
    engine.create_war(common::alsace()).unwrap();
    engine
        .create_war(Belligerents::new("Italy", "Switzerland", "Ticino"))
        .unwrap();

    let wars = engine.list_active_wars(engine.now()).await.unwrap();
    assert_eq!(wars.len(), 2);
    assert_eq!(wars[0].region, "Alsace-Lorraine");

    let json = serde_json::to_value(&wars[1]).unwrap();
    for field in [
        "attackerDamage",
        "defenderDamage",
        "totalDamage",
        "attackerPercentage",
        "participants",
        "timeLeft",
        "battleRounds",
    ] {
        assert!(json.get(field).is_some(), "missing {field}");
    }
    assert_eq!(json["timeLeft"], "6h 0m");
}

#[tokio::test]
async fn stats_of_a_newcomer_come_from_the_profile() {
    let engine = common::engine(WarConfig::default(), common::clock());
    let stats = engine.user_stats(UserId(42)).await.unwrap();
    assert_eq!(stats.total_damage, 0);
    assert_eq!(stats.rank, "Private");
    assert_eq!(stats.current_strength, 100);

    let json = serde_json::to_value(&stats).unwrap();
    assert_eq!(json["battlesWon"], 0);
    assert_eq!(json["currentStrength"], 100);
}
