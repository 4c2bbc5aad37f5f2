//! Character data, rules formulas, and persisting state

mod model;
pub mod rules;
mod state;

pub use model::{
    AiSettings, Attributes, Character, CharacterInfo, CharacterSheet, CombatPhase, CombatStatus,
    DerivedStats, Direction, EquipSlot, Equipment, GameState, Health, Inventory, Item, ItemKind,
    Mana, Position, SessionInfo,
};
pub use rules::{ability_modifier, proficiency_bonus};
pub use state::CharacterState;
