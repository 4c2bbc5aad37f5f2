//! chard - tabletop RPG character agent engine
//!
//! Characters run as independent actors that validate and resolve actions,
//! react to session events and persist a versioned snapshot after every
//! change.

pub mod actions;
pub mod actor;
pub mod character;
pub mod config;
pub mod db;
pub mod dice;
pub mod events;
pub mod store;

pub use actions::{ActionError, ActionHandler, ActionKind, ActionProcessor, ActionResult};
pub use actor::{
    ActorBuilder, ActorError, CharacterHandle, Roster, RosterError, SessionJoin, SessionLeave,
};
pub use character::{Character, CharacterState};
pub use config::Config;
pub use dice::{DiceEngine, DiceSource};
pub use events::{DispatchOutcome, EventAck, EventDispatcher, EventHook, EventKind, TurnStrategy};
pub use store::{CharacterStore, MemoryStore, Snapshot, SqliteStore, StoreError};
