//! Event routing

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use super::{DispatchOutcome, EventAck, EventError, EventHook, EventKind, TurnStrategy};
use crate::character::{ability_modifier, CharacterState, GameState};
use crate::dice::DiceEngine;

#[derive(Debug, Default, Deserialize)]
struct CombatStartPayload {
    #[serde(default)]
    initiative: Option<i32>,
}

/// Routes session events to handlers over a character's state
pub struct EventDispatcher {
    dice: DiceEngine,
    hooks: HashMap<String, Arc<dyn EventHook>>,
    strategy: Option<Arc<dyn TurnStrategy>>,
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("hooks", &self.hooks.keys().collect::<Vec<_>>())
            .field("strategy", &self.strategy.is_some())
            .finish()
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new(DiceEngine::default())
    }
}

impl EventDispatcher {
    /// Create a dispatcher; dice are used to roll initiative when a
    /// combat.start event does not carry one
    pub fn new(dice: DiceEngine) -> Self {
        Self {
            dice,
            hooks: HashMap::new(),
            strategy: None,
        }
    }

    /// Register a hook for an event tag, replacing any earlier one
    pub fn register_hook(&mut self, tag: &str, hook: Arc<dyn EventHook>) {
        self.hooks.insert(tag.to_string(), hook);
    }

    /// Install the strategy consulted when our turn starts
    pub fn set_strategy(&mut self, strategy: Arc<dyn TurnStrategy>) {
        self.strategy = Some(strategy);
    }

    /// Route one event. Never fails outright: problems come back as
    /// `Unknown` or `Errored`.
    pub async fn dispatch(
        &mut self,
        state: &mut CharacterState,
        event_type: &str,
        data: &serde_json::Value,
    ) -> DispatchOutcome {
        let result = match EventKind::from_tag(event_type) {
            Some(kind) => self.handle(kind, state, data).await,
            None => match self.hooks.get(event_type).cloned() {
                Some(hook) => run_hook(hook, state, event_type, data).await.map(Some),
                None => Ok(None),
            },
        };

        match result {
            Ok(Some(ack)) => {
                debug!("{} handled {}", state.id(), event_type);
                DispatchOutcome::Handled(ack)
            }
            Ok(None) => {
                warn!("{} ignored unknown event type {}", state.id(), event_type);
                DispatchOutcome::Unknown(EventAck::rejected(event_type, "unknown event type"))
            }
            Err(e) => {
                warn!("{} failed to handle {}: {}", state.id(), event_type, e);
                DispatchOutcome::Errored(e.to_string())
            }
        }
    }

    async fn handle(
        &mut self,
        kind: EventKind,
        state: &mut CharacterState,
        data: &serde_json::Value,
    ) -> Result<Option<EventAck>, EventError> {
        let mut ack = match kind {
            EventKind::CombatStart => self.combat_start(state, data).await?,
            EventKind::CombatTurn => self.combat_turn(state, data).await,
            EventKind::CombatEnd => {
                state.exit_combat().await;
                let mut ack = EventAck::acknowledged(kind.tag());
                ack.phase = Some(state.phase());
                ack
            }
            EventKind::GameStateUpdate => {
                state.merge_game_state(game_state_patch(data)?).await;
                EventAck::acknowledged(kind.tag())
            }
            EventKind::Discovery | EventKind::SocialInteraction => {
                EventAck::acknowledged(kind.tag())
            }
        };

        if let Some(hook) = self.hooks.get(kind.tag()).cloned() {
            ack.reaction = run_hook(hook, state, kind.tag(), data).await?.reaction;
        }

        Ok(Some(ack))
    }

    async fn combat_start(
        &mut self,
        state: &mut CharacterState,
        data: &serde_json::Value,
    ) -> Result<EventAck, EventError> {
        let payload: CombatStartPayload = if data.is_null() {
            CombatStartPayload::default()
        } else {
            serde_json::from_value(data.clone())
                .map_err(|e| EventError::InvalidPayload(e.to_string()))?
        };

        let initiative = match payload.initiative {
            Some(initiative) => initiative,
            None => {
                let dex = state.character().attributes.dexterity;
                self.dice.d20() as i32 + ability_modifier(dex)
            }
        };

        state.enter_combat(initiative).await;

        let mut ack = EventAck::acknowledged(EventKind::CombatStart.tag());
        ack.phase = Some(state.phase());
        ack.initiative = Some(initiative);
        Ok(ack)
    }

    async fn combat_turn(
        &mut self,
        state: &mut CharacterState,
        data: &serde_json::Value,
    ) -> EventAck {
        // keep turn_active => in_combat even if combat.start was missed
        if !state.character().combat.in_combat {
            state.enter_combat(0).await;
        }
        state.start_turn().await;

        let mut ack = EventAck::acknowledged(EventKind::CombatTurn.tag());
        if let Some(strategy) = self.strategy.clone() {
            ack.planned_action = strategy.decide(state.character(), data).await;
        }
        ack.phase = Some(state.phase());
        ack
    }
}

async fn run_hook(
    hook: Arc<dyn EventHook>,
    state: &CharacterState,
    event_type: &str,
    data: &serde_json::Value,
) -> Result<EventAck, EventError> {
    let mut ack = EventAck::acknowledged(event_type);
    ack.reaction = hook.on_event(state.character(), event_type, data).await?;
    Ok(ack)
}

/// `{"gameState": {...}}` or a bare object
fn game_state_patch(data: &serde_json::Value) -> Result<GameState, EventError> {
    let source = data.get("gameState").unwrap_or(data);
    source
        .as_object()
        .cloned()
        .ok_or_else(|| EventError::InvalidPayload("game state must be an object".to_string()))
}
