//! Caller-initiated actions
//!
//! Action tags are parsed into the closed [`ActionKind`] union and resolved
//! by the [`ActionProcessor`]. Tags outside the union are looked up in a
//! registry of [`ActionHandler`]s supplied at actor construction; anything
//! still unmatched fails as "unhandled action type".

mod outcome;
mod payload;
mod processor;

pub use outcome::{
    ActionOutcome, ActionResult, AttackOutcome, DefendOutcome, ItemEffect, ItemOutcome,
    MoveOutcome, SearchOutcome, SpeakOutcome, Speaker, SpellOutcome,
};
pub use payload::{
    AttackPayload, CastSpellPayload, MovePayload, SearchPayload, SpeakPayload, UseItemPayload,
};
pub use processor::{ActionContext, ActionHandler, ActionProcessor};

use thiserror::Error;

/// Largest move allowed while our combat turn is active
pub const MAX_COMBAT_MOVE: i32 = 6;

/// Flat bonus returned by `combat.defend`
pub const DEFEND_BONUS: i32 = 2;

/// Mana per spell level
pub const MANA_PER_SPELL_LEVEL: i32 = 2;

/// Built-in action kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Attack,
    Defend,
    CastSpell,
    Move,
    Search,
    Speak,
    UseItem,
}

impl ActionKind {
    /// All built-in kinds
    pub fn all() -> &'static [ActionKind] {
        &[
            ActionKind::Attack,
            ActionKind::Defend,
            ActionKind::CastSpell,
            ActionKind::Move,
            ActionKind::Search,
            ActionKind::Speak,
            ActionKind::UseItem,
        ]
    }

    /// Parse a namespaced tag such as "combat.attack"
    pub fn from_tag(tag: &str) -> Option<ActionKind> {
        match tag {
            "combat.attack" => Some(ActionKind::Attack),
            "combat.defend" => Some(ActionKind::Defend),
            "combat.cast_spell" => Some(ActionKind::CastSpell),
            "exploration.move" => Some(ActionKind::Move),
            "exploration.search" => Some(ActionKind::Search),
            "social.speak" => Some(ActionKind::Speak),
            "inventory.use_item" => Some(ActionKind::UseItem),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            ActionKind::Attack => "combat.attack",
            ActionKind::Defend => "combat.defend",
            ActionKind::CastSpell => "combat.cast_spell",
            ActionKind::Move => "exploration.move",
            ActionKind::Search => "exploration.search",
            ActionKind::Speak => "social.speak",
            ActionKind::UseItem => "inventory.use_item",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Validation failures. None of these leave partial mutation behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("not in combat")]
    NotInCombat,

    #[error("not your turn")]
    NotYourTurn,

    #[error("spell unknown: {0}")]
    UnknownSpell(String),

    #[error("insufficient mana: need {required}, have {available}")]
    InsufficientMana { required: i32, available: i32 },

    #[error("item not found: {0}")]
    ItemNotFound(String),

    #[error("unsupported item type: {0}")]
    UnsupportedItemType(String),

    #[error("invalid item {0}: {1}")]
    InvalidItem(String, String),

    #[error("cannot move {distance} in combat (max {max})")]
    ExcessMovement { distance: i32, max: i32 },

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("unhandled action type: {0}")]
    Unhandled(String),

    #[error("{0}")]
    Handler(String),
}
