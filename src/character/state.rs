//! Character state with persisting mutators
//!
//! Every mutator applies its change with clamping, stamps
//! `session.last_update`, then awaits a snapshot save before returning.
//! A failed save is logged and counted but never rolls back the in-memory
//! change.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::model::{
    Character, CharacterInfo, CharacterSheet, CombatPhase, Direction, EquipSlot, GameState, Item,
    Position,
};
use crate::store::{CharacterStore, Snapshot, StoreError};

/// Owned character record plus its storage port
pub struct CharacterState {
    character: Character,
    store: Arc<dyn CharacterStore>,
    version: u64,
    persist_failures: u64,
}

impl std::fmt::Debug for CharacterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CharacterState")
            .field("id", &self.character.id)
            .field("version", &self.version)
            .field("persist_failures", &self.persist_failures)
            .finish()
    }
}

impl CharacterState {
    /// Wrap an existing record without touching storage
    pub fn new(character: Character, store: Arc<dyn CharacterStore>) -> Self {
        Self {
            character,
            store,
            version: 0,
            persist_failures: 0,
        }
    }

    /// Load a character: the stored snapshot merged over class/level
    /// defaults, or fresh defaults when nothing is stored.
    pub async fn load(
        store: Arc<dyn CharacterStore>,
        id: &str,
        name: &str,
        class: &str,
        level: u32,
    ) -> Result<Self, StoreError> {
        let defaults = Character::new(id, name, class, level);

        match store.load(id).await? {
            Some(snapshot) => {
                let character = snapshot.restore(&defaults)?;
                info!("Restored character {} from snapshot v{}", id, snapshot.version);
                Ok(Self {
                    character,
                    store,
                    version: snapshot.version,
                    persist_failures: 0,
                })
            }
            None => {
                info!("Creating fresh {} character {}", defaults.class, id);
                Ok(Self::new(defaults, store))
            }
        }
    }

    /// Read access to the record
    pub fn character(&self) -> &Character {
        &self.character
    }

    pub fn id(&self) -> &str {
        &self.character.id
    }

    /// Version of the last snapshot written (or loaded)
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Saves that failed since this state was created
    pub fn persist_failures(&self) -> u64 {
        self.persist_failures
    }

    pub fn is_alive(&self) -> bool {
        self.character.is_alive()
    }

    pub fn can_act(&self) -> bool {
        self.character.can_act()
    }

    pub fn phase(&self) -> CombatPhase {
        self.character.phase()
    }

    pub fn armor_class(&self) -> i32 {
        self.character.armor_class()
    }

    pub fn attack_bonus(&self) -> i32 {
        self.character.attack_bonus()
    }

    pub fn info(&self) -> CharacterInfo {
        self.character.info()
    }

    pub fn sheet(&self) -> CharacterSheet {
        self.character.sheet()
    }

    /// Stamp bookkeeping and write a snapshot
    async fn persist(&mut self) {
        self.character.session.last_update = Some(Utc::now());
        self.character.refresh_derived();
        self.version += 1;

        let result = match Snapshot::capture(&self.character, self.version) {
            Ok(snapshot) => self.store.save(&snapshot).await,
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            self.persist_failures += 1;
            warn!(
                "Failed to persist character {} (v{}): {}",
                self.character.id, self.version, e
            );
        }
    }

    /// Apply damage, flooring health at zero. Returns the new current health.
    pub async fn take_damage(&mut self, amount: i32) -> i32 {
        let health = &mut self.character.health;
        health.current = health.current.saturating_sub(amount.max(0)).max(0);
        let current = health.current;
        debug!("{} takes {} damage -> {}", self.character.id, amount, current);

        self.persist().await;
        current
    }

    /// Heal, capped at maximum. Returns the new current health.
    pub async fn heal(&mut self, amount: i32) -> i32 {
        let health = &mut self.character.health;
        health.current = health.current.saturating_add(amount.max(0)).min(health.maximum);
        let current = health.current;
        debug!("{} heals {} -> {}", self.character.id, amount, current);

        self.persist().await;
        current
    }

    /// Spend mana if enough is available; otherwise nothing changes.
    pub async fn use_mana(&mut self, amount: i32) -> bool {
        let amount = amount.max(0);
        if self.character.mana.current < amount {
            return false;
        }
        self.character.mana.current -= amount;

        self.persist().await;
        true
    }

    /// Restore mana, capped at maximum. Returns the new current mana.
    pub async fn restore_mana(&mut self, amount: i32) -> i32 {
        let mana = &mut self.character.mana;
        mana.current = mana.current.saturating_add(amount.max(0)).min(mana.maximum);
        let current = mana.current;

        self.persist().await;
        current
    }

    /// Step `distance` units along a direction and face it. Returns `None`,
    /// leaving the position alone, when the move would leave the grid.
    pub async fn move_to(&mut self, direction: Direction, distance: i32) -> Option<Position> {
        let position = self
            .character
            .position
            .stepped(direction, distance.max(0))?;
        self.character.position = position;

        self.persist().await;
        Some(position)
    }

    /// Enter combat (or restart it) waiting for our turn
    pub async fn enter_combat(&mut self, initiative: i32) {
        let combat = &mut self.character.combat;
        combat.in_combat = true;
        combat.turn_active = false;
        combat.initiative = initiative;
        info!("{} enters combat (initiative {})", self.character.id, initiative);

        self.persist().await;
    }

    /// Leave combat entirely
    pub async fn exit_combat(&mut self) {
        let combat = &mut self.character.combat;
        combat.in_combat = false;
        combat.turn_active = false;
        combat.initiative = 0;
        info!("{} leaves combat", self.character.id);

        self.persist().await;
    }

    /// Activate our turn. Rejected outside combat.
    pub async fn start_turn(&mut self) -> bool {
        if !self.character.combat.in_combat {
            return false;
        }
        self.character.combat.turn_active = true;

        self.persist().await;
        true
    }

    /// End our turn, staying in combat
    pub async fn end_turn(&mut self) {
        self.character.combat.turn_active = false;

        self.persist().await;
    }

    /// Append an item, generating an id if it has none. Duplicate ids are
    /// rejected.
    pub async fn add_item(&mut self, mut item: Item) -> bool {
        item.ensure_id();
        if self.character.item(&item.id).is_some() {
            return false;
        }
        self.character.inventory.items.push(item);

        self.persist().await;
        true
    }

    /// Remove an item by id
    pub async fn remove_item(&mut self, item_id: &str) -> Option<Item> {
        let items = &mut self.character.inventory.items;
        let index = items.iter().position(|i| i.id == item_id)?;
        let removed = items.remove(index);

        self.persist().await;
        Some(removed)
    }

    /// Put an item into a named slot. Returns false for an invalid slot.
    pub async fn equip_item(&mut self, mut item: Item, slot: &str) -> bool {
        let Ok(slot) = slot.parse::<EquipSlot>() else {
            return false;
        };
        item.ensure_id();

        let equipment = &mut self.character.inventory.equipment;
        match slot {
            EquipSlot::Weapon => equipment.weapon = Some(item),
            EquipSlot::Armor => equipment.armor = Some(item),
            EquipSlot::Shield => equipment.shield = Some(item),
            EquipSlot::Accessories => equipment.accessories.push(item),
        }

        self.persist().await;
        true
    }

    /// Attach to a game session
    pub async fn join_session(&mut self, session_id: &str, game_state: GameState) {
        let session = &mut self.character.session;
        session.session_id = Some(session_id.to_string());
        session.game_state = game_state;
        session.connected = true;
        info!("{} joined session {}", self.character.id, session_id);

        self.persist().await;
    }

    /// Detach from the current session, returning its id
    pub async fn leave_session(&mut self) -> Option<String> {
        let session = &mut self.character.session;
        let session_id = session.session_id.take();
        session.connected = false;
        session.auth_token = None;
        info!("{} left session {:?}", self.character.id, session_id);

        self.persist().await;
        session_id
    }

    /// Keep the session token in memory only
    pub fn set_auth_token(&mut self, token: Option<String>) {
        self.character.session.auth_token = token;
    }

    /// Shallow-merge keys into the session's game state
    pub async fn merge_game_state(&mut self, patch: GameState) {
        self.character.session.game_state.extend(patch);

        self.persist().await;
    }
}
