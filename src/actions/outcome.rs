//! Action results

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::ActionError;
use crate::character::{Direction, Position};
use crate::dice::RollResult;

/// `{success, action, ...outcome fields, error?, timestamp}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionResult {
    pub success: bool,
    pub action: String,
    #[serde(flatten)]
    pub outcome: Option<ActionOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ActionResult {
    pub fn ok(action: &str, outcome: ActionOutcome) -> Self {
        Self {
            success: true,
            action: action.to_string(),
            outcome: Some(outcome),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(action: &str, error: &ActionError) -> Self {
        Self {
            success: false,
            action: action.to_string(),
            outcome: None,
            error: Some(error.to_string()),
            timestamp: Utc::now(),
        }
    }
}

/// Action-specific fields of a successful result
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ActionOutcome {
    Attack(AttackOutcome),
    Defend(DefendOutcome),
    Spell(SpellOutcome),
    Move(MoveOutcome),
    Search(SearchOutcome),
    Speak(SpeakOutcome),
    Item(ItemOutcome),
    Custom(serde_json::Map<String, serde_json::Value>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackOutcome {
    pub attack_roll: u32,
    pub attack_bonus: i32,
    pub total: i32,
    pub weapon: Option<String>,
    pub target: Option<String>,
    pub critical: bool,
    pub fumble: bool,
    /// Weapon damage dice plus strength, rolled when the equipped weapon
    /// carries a damage notation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damage: Option<RollResult>,
}

/// Ephemeral modifier for the caller to apply; never stored on the character
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DefendOutcome {
    pub defense_bonus: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellOutcome {
    pub spell: String,
    pub spell_level: u32,
    pub mana_cost: i32,
    pub mana_remaining: i32,
    pub target: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MoveOutcome {
    pub direction: Direction,
    pub distance: i32,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutcome {
    pub roll: u32,
    pub wisdom_modifier: i32,
    pub perception: i32,
    pub area: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Speaker {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpeakOutcome {
    pub speaker: Speaker,
    pub message: String,
    pub target: Option<String>,
    pub tone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemOutcome {
    pub item_id: String,
    pub item_name: String,
    pub item_type: String,
    pub consumed: bool,
    #[serde(flatten)]
    pub effect: ItemEffect,
}

/// What using an item did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum ItemEffect {
    /// New health/mana values after drinking
    Potion {
        health: Option<i32>,
        mana: Option<i32>,
    },
    /// Spell cast from the scroll
    Scroll { spell: SpellOutcome },
    /// Tools have no mechanical effect
    Tool { description: String },
}
