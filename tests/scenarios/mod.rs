//! Play scenarios covering:
//! - Combat: phase transitions, attacks, movement limits, planned turns
//! - Magic: spell casting and scrolls
//! - Inventory: potions, tools, unknown items
//! - Sessions: joining, leaving, game state, custom extensions

pub mod combat;
pub mod inventory;
pub mod magic;
pub mod sessions;
