//! Session, social and extension scenarios

use std::sync::Arc;

use async_trait::async_trait;
use chard::actions::{ActionContext, ActionOutcome};
use chard::actor::ActorBuilder;
use chard::character::Character;
use chard::events::EventError;
use chard::{ActionError, ActionHandler, DispatchOutcome, EventHook, MemoryStore};
use serde_json::{json, Value};

use crate::harness::{CharacterTest, SESSION_ID};

#[tokio::test]
async fn test_join_and_leave_session() {
    let hero = CharacterTest::start("cleric", 2, &[10]).await.unwrap();

    let sheet = hero.sheet().await;
    assert!(sheet.character.session.connected);
    assert_eq!(sheet.character.session.session_id.as_deref(), Some(SESSION_ID));
    assert!(sheet.character.session.last_update.is_some());

    // the token stays in memory
    let stored = hero.store.get("hero").unwrap();
    assert!(stored.data["session"].get("authToken").is_none());
    assert!(!stored.data.to_string().contains("secret"));

    let left = hero.handle.leave_session().await.unwrap();
    assert!(left.success);
    assert_eq!(left.session_id.as_deref(), Some(SESSION_ID));

    let info = hero.handle.info().await.unwrap();
    assert!(!info.session.connected);
    assert!(info.session.session_id.is_none());
}

#[tokio::test]
async fn test_game_state_updates_merge() {
    let hero = CharacterTest::start("rogue", 1, &[10]).await.unwrap();

    hero.event(
        "game.state_update",
        json!({"gameState": {"room": "crypt", "round": 1}}),
    )
    .await;
    hero.event("game.state_update", json!({"round": 2})).await;

    let state = hero.sheet().await.character.session.game_state;
    assert_eq!(state["room"], "crypt");
    assert_eq!(state["round"], 2);
}

#[tokio::test]
async fn test_bad_game_state_errors() {
    let hero = CharacterTest::start("rogue", 1, &[10]).await.unwrap();

    let outcome = hero.outcome("game.state_update", json!([1, 2, 3])).await;
    assert!(matches!(outcome, DispatchOutcome::Errored(_)));
}

#[tokio::test]
async fn test_unknown_event_is_not_acknowledged() {
    let hero = CharacterTest::start("rogue", 1, &[10]).await.unwrap();

    let ack = hero.event("weather.rain", json!({"heavy": true})).await;
    assert!(!ack.acknowledged);
    assert_eq!(ack.event, "weather.rain");
}

#[tokio::test]
async fn test_passive_events_are_acknowledged() {
    let hero = CharacterTest::start("rogue", 1, &[10]).await.unwrap();

    for tag in ["exploration.discovery", "social.interaction"] {
        let ack = hero.event(tag, json!({"what": "a door"})).await;
        assert!(ack.acknowledged, "{} not acknowledged", tag);
    }
}

#[tokio::test]
async fn test_speak_and_search() {
    // rogue wis 12 => +1
    let hero = CharacterTest::start("rogue", 1, &[9]).await.unwrap();

    let result = hero
        .act(
            "social.speak",
            json!({"message": "Hail!", "target": "innkeeper"}),
        )
        .await;
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["speaker"]["name"], "Hero");
    assert_eq!(value["message"], "Hail!");
    assert_eq!(value["tone"], "neutral");

    let result = hero
        .act("exploration.search", json!({"area": "cellar"}))
        .await;
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["roll"], 9);
    assert_eq!(value["perception"], 10);
    assert_eq!(value["area"], "cellar");
}

#[tokio::test]
async fn test_unhandled_action() {
    let hero = CharacterTest::start("rogue", 1, &[10]).await.unwrap();

    let result = hero.act("social.juggle", json!({})).await;
    assert!(!result.success);
    assert_eq!(
        result.error.as_deref(),
        Some("unhandled action type: social.juggle")
    );
}

struct Taunt;

#[async_trait]
impl ActionHandler for Taunt {
    async fn handle(
        &self,
        ctx: &mut ActionContext<'_>,
        data: &Value,
    ) -> Result<ActionOutcome, ActionError> {
        let target = data
            .get("target")
            .and_then(|t| t.as_str())
            .ok_or_else(|| ActionError::Handler("taunt needs a target".to_string()))?;

        let roll = ctx.dice.d20();
        let mut fields = serde_json::Map::new();
        fields.insert("target".to_string(), json!(target));
        fields.insert("roll".to_string(), json!(roll));
        Ok(ActionOutcome::Custom(fields))
    }
}

struct Wary;

#[async_trait]
impl EventHook for Wary {
    async fn on_event(
        &self,
        character: &Character,
        _event_type: &str,
        data: &Value,
    ) -> Result<Option<Value>, EventError> {
        let what = data.get("what").and_then(|w| w.as_str()).unwrap_or("something");
        Ok(Some(json!({
            "note": format!("{} eyes {} warily", character.name, what)
        })))
    }
}

#[tokio::test]
async fn test_registered_extensions() {
    let store = MemoryStore::shared();
    let builder = ActorBuilder::new(store.clone(), "bard")
        .defaults("Lyra", "bard", 1)
        .action_dice(chard::DiceEngine::scripted([17]))
        .action_handler("social.taunt", Arc::new(Taunt))
        .event_hook("exploration.discovery", Arc::new(Wary));
    let bard = CharacterTest::with_builder(store, builder).await.unwrap();

    let result = bard.act("social.taunt", json!({"target": "ogre"})).await;
    assert!(result.success);
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["roll"], 17);
    assert_eq!(value["target"], "ogre");

    let result = bard.act("social.taunt", json!({})).await;
    assert_eq!(result.error.as_deref(), Some("taunt needs a target"));

    let ack = bard
        .event("exploration.discovery", json!({"what": "a mimic"}))
        .await;
    assert_eq!(ack.reaction.unwrap()["note"], "Lyra eyes a mimic warily");
}
