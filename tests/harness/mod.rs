//! Test harness: one character actor over an in-memory store with scripted dice

use std::sync::Arc;

use anyhow::Result;
use chard::actions::ActionResult;
use chard::actor::ActorBuilder;
use chard::character::{Character, CharacterSheet, GameState};
use chard::{CharacterHandle, DiceEngine, DispatchOutcome, EventAck, MemoryStore, Snapshot};
use serde_json::Value;

pub const SESSION_ID: &str = "test-session";

pub struct CharacterTest {
    pub store: Arc<MemoryStore>,
    pub handle: CharacterHandle,
}

impl CharacterTest {
    /// Spawn a character whose dice replay `faces` in order
    pub async fn start(class: &str, level: u32, faces: &[u32]) -> Result<Self> {
        let store = MemoryStore::shared();
        let builder = ActorBuilder::new(store.clone(), "hero")
            .defaults("Hero", class, level)
            .action_dice(DiceEngine::scripted(faces.to_vec()))
            .event_dice(DiceEngine::scripted(faces.to_vec()));
        Self::with_builder(store, builder).await
    }

    /// Spawn from a stored record, e.g. one carrying inventory
    pub async fn from_record(character: Character, faces: &[u32]) -> Result<Self> {
        let store = MemoryStore::shared();
        store.insert(Snapshot::capture(&character, 1)?);
        let builder = ActorBuilder::new(store.clone(), &character.id)
            .defaults(&character.name, &character.class, character.level)
            .action_dice(DiceEngine::scripted(faces.to_vec()));
        Self::with_builder(store, builder).await
    }

    pub async fn with_builder(store: Arc<MemoryStore>, builder: ActorBuilder) -> Result<Self> {
        let handle = builder.spawn().await?;
        handle
            .join_session(SESSION_ID, GameState::new(), Some("secret".to_string()))
            .await?;
        Ok(Self { store, handle })
    }

    pub async fn act(&self, action_type: &str, data: Value) -> ActionResult {
        self.handle
            .process(action_type, data)
            .await
            .expect("actor stopped")
    }

    pub async fn event(&self, event_type: &str, data: Value) -> EventAck {
        self.handle
            .dispatch(event_type, data)
            .await
            .expect("actor stopped")
            .expect("event errored")
    }

    pub async fn outcome(&self, event_type: &str, data: Value) -> DispatchOutcome {
        self.handle
            .dispatch_outcome(event_type, data)
            .await
            .expect("actor stopped")
    }

    pub async fn sheet(&self) -> CharacterSheet {
        self.handle.sheet().await.expect("actor stopped")
    }

    /// Put the character into its combat turn
    pub async fn begin_turn(&self) {
        self.event("combat.start", serde_json::json!({"initiative": 12}))
            .await;
        self.event("combat.turn", serde_json::json!({})).await;
    }
}
