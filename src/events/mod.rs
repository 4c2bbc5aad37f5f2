//! Session-originated events
//!
//! Events drive the combat-phase state machine and session bookkeeping:
//! - combat.start: Idle -> Waiting (with initiative)
//! - combat.turn: Waiting -> Acting
//! - combat.end: any -> Idle
//! - game.state_update: merge into the session's game state
//! - exploration.discovery, social.interaction: acknowledged, offered to hooks
//!
//! Unknown tags soft-fail with `acknowledged: false`.

mod dispatcher;

pub use dispatcher::EventDispatcher;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actions::ActionResult;
use crate::character::{Character, CombatPhase};

/// Built-in event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    CombatStart,
    CombatTurn,
    CombatEnd,
    Discovery,
    SocialInteraction,
    GameStateUpdate,
}

impl EventKind {
    pub fn from_tag(tag: &str) -> Option<EventKind> {
        match tag {
            "combat.start" => Some(EventKind::CombatStart),
            "combat.turn" => Some(EventKind::CombatTurn),
            "combat.end" => Some(EventKind::CombatEnd),
            "exploration.discovery" => Some(EventKind::Discovery),
            "social.interaction" => Some(EventKind::SocialInteraction),
            "game.state_update" => Some(EventKind::GameStateUpdate),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            EventKind::CombatStart => "combat.start",
            EventKind::CombatTurn => "combat.turn",
            EventKind::CombatEnd => "combat.end",
            EventKind::Discovery => "exploration.discovery",
            EventKind::SocialInteraction => "social.interaction",
            EventKind::GameStateUpdate => "game.state_update",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Event handling errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    #[error("invalid event payload: {0}")]
    InvalidPayload(String),

    #[error("hook failed: {0}")]
    Hook(String),
}

/// An action a turn strategy wants performed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedAction {
    pub action_type: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Acknowledgement returned to the session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventAck {
    pub acknowledged: bool,
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<CombatPhase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initiative: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planned_action: Option<PlannedAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_result: Option<ActionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reaction: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl EventAck {
    pub fn acknowledged(event: &str) -> Self {
        Self {
            acknowledged: true,
            event: event.to_string(),
            phase: None,
            initiative: None,
            planned_action: None,
            action_result: None,
            reaction: None,
            reason: None,
        }
    }

    pub fn rejected(event: &str, reason: &str) -> Self {
        Self {
            acknowledged: false,
            reason: Some(reason.to_string()),
            ..Self::acknowledged(event)
        }
    }
}

/// Typed result of dispatching one event
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// A handler ran
    Handled(EventAck),
    /// No handler for the tag; the ack has `acknowledged: false`
    Unknown(EventAck),
    /// A handler failed; no acknowledgement
    Errored(String),
}

impl DispatchOutcome {
    /// Acknowledgement view: `None` means the outcome is unknown to the
    /// caller, not that the event failed or succeeded
    pub fn ack(self) -> Option<EventAck> {
        match self {
            DispatchOutcome::Handled(ack) | DispatchOutcome::Unknown(ack) => Some(ack),
            DispatchOutcome::Errored(_) => None,
        }
    }

    pub fn is_handled(&self) -> bool {
        matches!(self, DispatchOutcome::Handled(_))
    }
}

/// Reactive extension for an event tag (built-in or custom).
///
/// Hooks see the character read-only and may return a reaction payload that
/// is attached to the acknowledgement.
#[async_trait]
pub trait EventHook: Send + Sync {
    async fn on_event(
        &self,
        character: &Character,
        event_type: &str,
        data: &serde_json::Value,
    ) -> Result<Option<serde_json::Value>, EventError>;
}

/// Decides what to do when our combat turn starts
#[async_trait]
pub trait TurnStrategy: Send + Sync {
    async fn decide(
        &self,
        character: &Character,
        data: &serde_json::Value,
    ) -> Option<PlannedAction>;
}
