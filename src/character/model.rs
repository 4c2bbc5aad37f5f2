//! Character record and its component types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::rules;

/// Game state snapshot shared by the session, opaque to the engine
pub type GameState = serde_json::Map<String, serde_json::Value>;

/// One character actor's canonical data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub id: String,
    pub name: String,
    pub class: String,
    pub level: u32,
    pub attributes: Attributes,
    pub health: Health,
    pub mana: Mana,
    pub combat: CombatStatus,
    pub position: Position,
    pub inventory: Inventory,
    pub abilities: Vec<String>,
    pub spells: Vec<String>,
    pub session: SessionInfo,
    pub ai_settings: AiSettings,
}

impl Character {
    /// Fresh character with the defaults for its class and level
    pub fn new(id: &str, name: &str, class: &str, level: u32) -> Self {
        let level = level.max(1);
        let profile = rules::class_profile(class);
        let attributes = profile.attributes;

        let max_hp = rules::max_health(profile.hit_die, level, attributes.constitution);
        let max_mana = profile.mana_per_level * level as i32;

        let mut character = Self {
            id: id.to_string(),
            name: name.to_string(),
            class: class.to_lowercase(),
            level,
            attributes,
            health: Health::full(max_hp),
            mana: Mana::full(max_mana),
            combat: CombatStatus::default(),
            position: Position::default(),
            inventory: Inventory::default(),
            abilities: profile.abilities.iter().map(|s| s.to_string()).collect(),
            spells: profile.spells.iter().map(|s| s.to_string()).collect(),
            session: SessionInfo::default(),
            ai_settings: AiSettings::default(),
        };
        character.refresh_derived();
        character
    }

    /// Whether the character has any hit points left
    pub fn is_alive(&self) -> bool {
        self.health.current > 0
    }

    /// Alive and attached to a connected session
    pub fn can_act(&self) -> bool {
        self.is_alive() && self.session.connected
    }

    /// Current position in the combat-phase state machine
    pub fn phase(&self) -> CombatPhase {
        match (self.combat.in_combat, self.combat.turn_active) {
            (false, _) => CombatPhase::Idle,
            (true, false) => CombatPhase::Waiting,
            (true, true) => CombatPhase::Acting,
        }
    }

    /// Derived armor class (never read from the stored field)
    pub fn armor_class(&self) -> i32 {
        rules::armor_class(self)
    }

    /// Derived attack bonus (never read from the stored field)
    pub fn attack_bonus(&self) -> i32 {
        rules::attack_bonus(self)
    }

    /// Copy derived stats into the combat block so snapshots carry them
    pub fn refresh_derived(&mut self) {
        self.combat.armor_class = self.armor_class();
        self.combat.attack_bonus = self.attack_bonus();
    }

    /// Pull a record read from outside back inside its invariants: pools
    /// within `[0, maximum]` and every carried item with an id
    pub fn normalize(&mut self) {
        self.health.maximum = self.health.maximum.max(0);
        self.health.current = self.health.current.clamp(0, self.health.maximum);
        self.mana.maximum = self.mana.maximum.max(0);
        self.mana.current = self.mana.current.clamp(0, self.mana.maximum);

        let equipment = &mut self.inventory.equipment;
        self.inventory
            .items
            .iter_mut()
            .chain(equipment.weapon.iter_mut())
            .chain(equipment.armor.iter_mut())
            .chain(equipment.shield.iter_mut())
            .chain(equipment.accessories.iter_mut())
            .for_each(Item::ensure_id);
    }

    /// Case-insensitive lookup of a known spell
    pub fn knows_spell(&self, spell: &str) -> bool {
        self.spells.iter().any(|s| s.eq_ignore_ascii_case(spell))
    }

    /// Find an inventory item by id
    pub fn item(&self, item_id: &str) -> Option<&Item> {
        self.inventory.items.iter().find(|i| i.id == item_id)
    }

    /// Summary view for session peers
    pub fn info(&self) -> CharacterInfo {
        CharacterInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            class: self.class.clone(),
            level: self.level,
            health: self.health,
            mana: self.mana,
            attributes: self.attributes,
            position: self.position,
            combat: self.combat,
            session: self.session.clone(),
        }
    }

    /// Full record plus derived stats
    pub fn sheet(&self) -> CharacterSheet {
        let mut character = self.clone();
        character.refresh_derived();
        let derived = DerivedStats {
            armor_class: character.combat.armor_class,
            attack_bonus: character.combat.attack_bonus,
            is_alive: character.is_alive(),
            can_act: character.can_act(),
        };
        CharacterSheet { character, derived }
    }
}

/// The six ability scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub charisma: i32,
}

impl Default for Attributes {
    fn default() -> Self {
        Self::uniform(10)
    }
}

impl Attributes {
    pub fn uniform(score: i32) -> Self {
        Self {
            strength: score,
            dexterity: score,
            constitution: score,
            intelligence: score,
            wisdom: score,
            charisma: score,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Health {
    pub current: i32,
    pub maximum: i32,
    pub temporary: i32,
}

impl Health {
    pub fn full(maximum: i32) -> Self {
        Self {
            current: maximum,
            maximum,
            temporary: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Mana {
    pub current: i32,
    pub maximum: i32,
}

impl Mana {
    pub fn full(maximum: i32) -> Self {
        Self {
            current: maximum,
            maximum,
        }
    }
}

/// Combat block. `turn_active` implies `in_combat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatStatus {
    pub in_combat: bool,
    pub turn_active: bool,
    pub initiative: i32,
    pub armor_class: i32,
    pub attack_bonus: i32,
}

impl Default for CombatStatus {
    fn default() -> Self {
        Self {
            in_combat: false,
            turn_active: false,
            initiative: 0,
            armor_class: 10,
            attack_bonus: 0,
        }
    }
}

/// Combat phase derived from the combat block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatPhase {
    /// Out of combat
    Idle,
    /// In combat, waiting for our turn
    Waiting,
    /// In combat, our turn is active
    Acting,
}

/// Facing / movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    North,
    South,
    East,
    West,
    Up,
    Down,
}

impl Direction {
    /// Unit delta (x, y, z) for one step in this direction
    pub fn delta(&self) -> (i32, i32, i32) {
        match self {
            Direction::North => (0, 1, 0),
            Direction::South => (0, -1, 0),
            Direction::East => (1, 0, 0),
            Direction::West => (-1, 0, 0),
            Direction::Up => (0, 0, 1),
            Direction::Down => (0, 0, -1),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "north" | "n" => Ok(Direction::North),
            "south" | "s" => Ok(Direction::South),
            "east" | "e" => Ok(Direction::East),
            "west" | "w" => Ok(Direction::West),
            "up" | "u" => Ok(Direction::Up),
            "down" | "d" => Ok(Direction::Down),
            other => Err(format!("unknown direction: {}", other)),
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
            Direction::Up => "up",
            Direction::Down => "down",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub facing: Direction,
}

impl Position {
    /// The position `distance` steps away, facing `direction`. `None` when
    /// a coordinate would leave the i32 range.
    pub fn stepped(&self, direction: Direction, distance: i32) -> Option<Position> {
        let (dx, dy, dz) = direction.delta();
        let shift = |coord: i32, delta: i32| delta.checked_mul(distance)?.checked_add(coord);
        Some(Position {
            x: shift(self.x, dx)?,
            y: shift(self.y, dy)?,
            z: shift(self.z, dz)?,
            facing: direction,
        })
    }
}

/// Item categories; unrecognized names are kept verbatim
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ItemKind {
    Potion,
    Scroll,
    Tool,
    Weapon,
    Armor,
    Shield,
    Accessory,
    Other(String),
}

impl From<String> for ItemKind {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "potion" => ItemKind::Potion,
            "scroll" => ItemKind::Scroll,
            "tool" => ItemKind::Tool,
            "weapon" => ItemKind::Weapon,
            "armor" => ItemKind::Armor,
            "shield" => ItemKind::Shield,
            "accessory" => ItemKind::Accessory,
            _ => ItemKind::Other(s),
        }
    }
}

impl From<ItemKind> for String {
    fn from(kind: ItemKind) -> Self {
        kind.to_string()
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ItemKind::Potion => "potion",
            ItemKind::Scroll => "scroll",
            ItemKind::Tool => "tool",
            ItemKind::Weapon => "weapon",
            ItemKind::Armor => "armor",
            ItemKind::Shield => "shield",
            ItemKind::Accessory => "accessory",
            ItemKind::Other(name) => name,
        };
        write!(f, "{}", s)
    }
}

/// An inventory item; type-specific fields are optional
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Generated on intake when absent
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heal_amount: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mana_amount: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spell: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spell_level: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ac_bonus: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attack_bonus: Option<i32>,
    /// Weapon damage in dice notation, e.g. "1d8+1"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Item {
    pub fn with_id(id: &str, name: &str, kind: ItemKind) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            heal_amount: None,
            mana_amount: None,
            spell: None,
            spell_level: None,
            ac_bonus: None,
            attack_bonus: None,
            damage: None,
            description: None,
        }
    }

    pub fn healing_potion(id: &str, heal_amount: i32) -> Self {
        let mut item = Self::with_id(id, "Healing Potion", ItemKind::Potion);
        item.heal_amount = Some(heal_amount);
        item
    }

    pub fn mana_potion(id: &str, mana_amount: i32) -> Self {
        let mut item = Self::with_id(id, "Mana Potion", ItemKind::Potion);
        item.mana_amount = Some(mana_amount);
        item
    }

    pub fn scroll(id: &str, spell: &str, spell_level: u32) -> Self {
        let mut item = Self::with_id(id, &format!("Scroll of {}", spell), ItemKind::Scroll);
        item.spell = Some(spell.to_string());
        item.spell_level = Some(spell_level);
        item
    }

    pub fn weapon(id: &str, name: &str, attack_bonus: i32) -> Self {
        let mut item = Self::with_id(id, name, ItemKind::Weapon);
        item.attack_bonus = Some(attack_bonus);
        item
    }

    pub fn with_damage(mut self, notation: &str) -> Self {
        self.damage = Some(notation.to_string());
        self
    }

    /// Give the item a fresh id if it arrived without one
    pub fn ensure_id(&mut self) {
        if self.id.trim().is_empty() {
            self.id = generate_item_id();
        }
    }

    pub fn armor(id: &str, name: &str, ac_bonus: i32) -> Self {
        let mut item = Self::with_id(id, name, ItemKind::Armor);
        item.ac_bonus = Some(ac_bonus);
        item
    }
}

fn generate_item_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Equipment slot names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EquipSlot {
    Weapon,
    Armor,
    Shield,
    Accessories,
}

impl FromStr for EquipSlot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "weapon" => Ok(EquipSlot::Weapon),
            "armor" => Ok(EquipSlot::Armor),
            "shield" => Ok(EquipSlot::Shield),
            "accessories" | "accessory" => Ok(EquipSlot::Accessories),
            other => Err(format!("invalid equipment slot: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Equipment {
    pub weapon: Option<Item>,
    pub armor: Option<Item>,
    pub shield: Option<Item>,
    pub accessories: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Inventory {
    pub gold: u32,
    pub items: Vec<Item>,
    pub equipment: Equipment,
}

/// Session linkage
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_id: Option<String>,
    pub game_state: GameState,
    pub connected: bool,
    pub last_update: Option<DateTime<Utc>>,
    /// Held in memory for the session only
    #[serde(skip)]
    pub auth_token: Option<String>,
}

/// Dispositions consumed by external decision strategies, not by the engine
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AiSettings {
    pub aggression: f32,
    pub caution: f32,
    pub sociability: f32,
    pub curiosity: f32,
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            aggression: 0.5,
            caution: 0.5,
            sociability: 0.5,
            curiosity: 0.5,
        }
    }
}

/// Summary returned by `info()`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterInfo {
    pub id: String,
    pub name: String,
    pub class: String,
    pub level: u32,
    pub health: Health,
    pub mana: Mana,
    pub attributes: Attributes,
    pub position: Position,
    pub combat: CombatStatus,
    pub session: SessionInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedStats {
    pub armor_class: i32,
    pub attack_bonus: i32,
    pub is_alive: bool,
    pub can_act: bool,
}

/// Full record returned by `sheet()`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterSheet {
    #[serde(flatten)]
    pub character: Character,
    pub derived: DerivedStats,
}
