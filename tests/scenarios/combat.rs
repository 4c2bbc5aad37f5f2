//! Combat scenario tests

use std::sync::Arc;

use async_trait::async_trait;
use chard::actor::ActorBuilder;
use chard::character::{Character, CombatPhase};
use chard::events::PlannedAction;
use chard::{DiceEngine, MemoryStore, TurnStrategy};
use serde_json::json;

use crate::harness::CharacterTest;

#[tokio::test]
async fn test_phase_transitions() {
    let hero = CharacterTest::start("fighter", 1, &[10]).await.unwrap();

    let ack = hero.event("combat.start", json!({"initiative": 17})).await;
    assert!(ack.acknowledged);
    assert_eq!(ack.phase, Some(CombatPhase::Waiting));
    assert_eq!(hero.sheet().await.character.combat.initiative, 17);

    let ack = hero.event("combat.turn", json!({})).await;
    assert_eq!(ack.phase, Some(CombatPhase::Acting));

    let ack = hero.event("combat.end", json!({})).await;
    assert_eq!(ack.phase, Some(CombatPhase::Idle));

    let combat = hero.sheet().await.character.combat;
    assert!(!combat.in_combat);
    assert!(!combat.turn_active);
    assert_eq!(combat.initiative, 0);
}

#[tokio::test]
async fn test_rolled_initiative_uses_dexterity() {
    // fighter dex 13 => +1
    let hero = CharacterTest::start("fighter", 1, &[14]).await.unwrap();

    let ack = hero.event("combat.start", json!({})).await;
    assert_eq!(ack.initiative, Some(15));
}

#[tokio::test]
async fn test_attack_requires_active_turn() {
    let hero = CharacterTest::start("fighter", 1, &[20]).await.unwrap();
    let before = hero.sheet().await;

    let result = hero.act("combat.attack", json!({"target": "goblin"})).await;
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("not in combat"));

    hero.event("combat.start", json!({"initiative": 5})).await;
    let result = hero.act("combat.attack", json!({"target": "goblin"})).await;
    assert_eq!(result.error.as_deref(), Some("not your turn"));

    let after = hero.sheet().await;
    assert_eq!(after.character.health, before.character.health);
    assert_eq!(after.character.position, before.character.position);
}

#[tokio::test]
async fn test_attack_totals() {
    // fighter level 1: proficiency 2 + str 16 (+3)
    let hero = CharacterTest::start("fighter", 1, &[11, 20, 1]).await.unwrap();
    hero.begin_turn().await;

    for (roll, critical, fumble) in [(11, false, false), (20, true, false), (1, false, true)] {
        let result = hero.act("combat.attack", json!({"target": "goblin"})).await;
        assert!(result.success);

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["attackRoll"], roll);
        assert_eq!(value["attackBonus"], 5);
        assert_eq!(value["total"], roll + 5);
        assert_eq!(value["critical"], critical);
        assert_eq!(value["fumble"], fumble);
        assert_eq!(value["target"], "goblin");
    }
}

#[tokio::test]
async fn test_combat_movement_limit() {
    let hero = CharacterTest::start("rogue", 1, &[10]).await.unwrap();
    hero.begin_turn().await;

    let result = hero
        .act("exploration.move", json!({"direction": "north", "distance": 7}))
        .await;
    assert!(!result.success);
    assert_eq!(hero.sheet().await.character.position.y, 0);

    let result = hero
        .act("exploration.move", json!({"direction": "west", "distance": 6}))
        .await;
    assert!(result.success);

    let position = hero.sheet().await.character.position;
    assert_eq!(position.x, -6);
    assert_eq!(position.facing.to_string(), "west");
}

#[tokio::test]
async fn test_long_move_outside_combat() {
    let hero = CharacterTest::start("rogue", 1, &[10]).await.unwrap();

    let result = hero
        .act("exploration.move", json!({"direction": "south", "distance": 30}))
        .await;
    assert!(result.success);
    assert_eq!(hero.sheet().await.character.position.y, -30);
}

#[tokio::test]
async fn test_defend_is_not_stored() {
    let hero = CharacterTest::start("fighter", 1, &[10]).await.unwrap();
    hero.event("combat.start", json!({"initiative": 3})).await;
    let armor_class = hero.sheet().await.derived.armor_class;

    let result = hero.act("combat.defend", json!({})).await;
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["defenseBonus"], 2);
    assert_eq!(hero.sheet().await.derived.armor_class, armor_class);
}

struct AttackNearest;

#[async_trait]
impl TurnStrategy for AttackNearest {
    async fn decide(&self, _character: &Character, data: &serde_json::Value) -> Option<PlannedAction> {
        let target = data.get("enemies")?.as_array()?.first()?.clone();
        Some(PlannedAction {
            action_type: "combat.attack".to_string(),
            data: json!({"target": target}),
        })
    }
}

#[tokio::test]
async fn test_turn_strategy_acts_and_ends_turn() {
    let store = MemoryStore::shared();
    let builder = ActorBuilder::new(store.clone(), "npc")
        .defaults("Grunt", "fighter", 1)
        .action_dice(DiceEngine::scripted([13]))
        .turn_strategy(Arc::new(AttackNearest));
    let npc = CharacterTest::with_builder(store, builder).await.unwrap();

    npc.event("combat.start", json!({"initiative": 8})).await;
    let ack = npc
        .event("combat.turn", json!({"enemies": ["orc", "wolf"]}))
        .await;

    let planned = ack.planned_action.expect("strategy planned nothing");
    assert_eq!(planned.action_type, "combat.attack");

    let result = ack.action_result.expect("planned action not performed");
    assert!(result.success);
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["target"], "orc");
    assert_eq!(value["total"], 18);

    assert_eq!(ack.phase, Some(CombatPhase::Waiting));
}

#[tokio::test]
async fn test_turn_without_plan_waits_for_end_turn() {
    let hero = CharacterTest::start("fighter", 1, &[10]).await.unwrap();
    hero.begin_turn().await;
    assert_eq!(hero.sheet().await.character.phase(), CombatPhase::Acting);

    let phase = hero.handle.end_turn().await.unwrap();
    assert_eq!(phase, CombatPhase::Waiting);
}

#[tokio::test]
async fn test_dead_characters_cannot_act() {
    let hero = CharacterTest::start("fighter", 1, &[10]).await.unwrap();
    let sheet = hero.sheet().await;
    assert!(sheet.derived.can_act);

    // health is only reachable through state; a dead snapshot reloads dead
    let mut snapshot = hero.store.get("hero").unwrap();
    snapshot.data["health"]["current"] = json!(0);
    hero.store.insert(snapshot);

    let builder = ActorBuilder::new(hero.store.clone(), "hero");
    let ghost = CharacterTest::with_builder(hero.store.clone(), builder)
        .await
        .unwrap();
    let sheet = ghost.sheet().await;
    assert!(sheet.character.session.connected);
    assert!(!sheet.derived.is_alive);
    assert!(!sheet.derived.can_act);
}
