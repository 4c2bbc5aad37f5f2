//! Rules formulas: ability modifiers, proficiency, derived stats, class defaults

use super::model::{Attributes, Character};

/// Base armor class before dexterity and equipment
pub const BASE_ARMOR_CLASS: i32 = 10;

/// `floor((score - 10) / 2)`
pub fn ability_modifier(score: i32) -> i32 {
    (score - 10).div_euclid(2)
}

/// `ceil(level / 4) + 1`
pub fn proficiency_bonus(level: u32) -> i32 {
    (level.max(1) as i32 + 3) / 4 + 1
}

/// `10 + mod(dex) + armor bonus + shield bonus`
pub fn armor_class(c: &Character) -> i32 {
    let equipment = &c.inventory.equipment;
    let armor = equipment.armor.as_ref().and_then(|i| i.ac_bonus).unwrap_or(0);
    let shield = equipment.shield.as_ref().and_then(|i| i.ac_bonus).unwrap_or(0);

    BASE_ARMOR_CLASS + ability_modifier(c.attributes.dexterity) + armor + shield
}

/// `proficiency(level) + mod(str) + weapon bonus`
pub fn attack_bonus(c: &Character) -> i32 {
    let weapon = c
        .inventory
        .equipment
        .weapon
        .as_ref()
        .and_then(|i| i.attack_bonus)
        .unwrap_or(0);

    proficiency_bonus(c.level) + ability_modifier(c.attributes.strength) + weapon
}

/// Max health for a hit die at a level: full die at level 1, then the
/// rounded-up average per level, plus the constitution modifier per level.
pub fn max_health(hit_die: i32, level: u32, constitution: i32) -> i32 {
    let level = level.max(1) as i32;
    let hp = hit_die + (level - 1) * (hit_die / 2 + 1) + level * ability_modifier(constitution);
    hp.max(1)
}

/// Starting template for a character class
#[derive(Debug, Clone, Copy)]
pub struct ClassProfile {
    pub hit_die: i32,
    pub mana_per_level: i32,
    pub attributes: Attributes,
    pub abilities: &'static [&'static str],
    pub spells: &'static [&'static str],
}

/// Look up the starting template for a class (case-insensitive)
pub fn class_profile(class: &str) -> ClassProfile {
    match class.to_lowercase().as_str() {
        "fighter" | "warrior" => ClassProfile {
            hit_die: 10,
            mana_per_level: 0,
            attributes: Attributes {
                strength: 16,
                dexterity: 13,
                constitution: 15,
                intelligence: 10,
                wisdom: 12,
                charisma: 8,
            },
            abilities: &["Second Wind", "Action Surge"],
            spells: &[],
        },
        "rogue" => ClassProfile {
            hit_die: 8,
            mana_per_level: 0,
            attributes: Attributes {
                strength: 10,
                dexterity: 16,
                constitution: 12,
                intelligence: 13,
                wisdom: 12,
                charisma: 14,
            },
            abilities: &["Sneak Attack", "Cunning Action"],
            spells: &[],
        },
        "cleric" => ClassProfile {
            hit_die: 8,
            mana_per_level: 10,
            attributes: Attributes {
                strength: 14,
                dexterity: 10,
                constitution: 13,
                intelligence: 10,
                wisdom: 16,
                charisma: 12,
            },
            abilities: &["Turn Undead"],
            spells: &["Cure Wounds", "Bless", "Guiding Bolt"],
        },
        "wizard" | "mage" => ClassProfile {
            hit_die: 6,
            mana_per_level: 15,
            attributes: Attributes {
                strength: 8,
                dexterity: 14,
                constitution: 12,
                intelligence: 16,
                wisdom: 13,
                charisma: 10,
            },
            abilities: &["Arcane Recovery"],
            spells: &["Magic Missile", "Shield", "Sleep"],
        },
        _ => ClassProfile {
            hit_die: 8,
            mana_per_level: 5,
            attributes: Attributes::default(),
            abilities: &[],
            spells: &[],
        },
    }
}
