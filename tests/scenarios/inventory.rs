//! Inventory scenario tests

use chard::character::{Character, Health, Item, ItemKind};
use serde_json::json;

use crate::harness::CharacterTest;

fn wounded_fighter() -> Character {
    let mut fighter = Character::new("hero", "Hero", "fighter", 1);
    fighter.health = Health {
        current: 5,
        maximum: 20,
        temporary: 0,
    };
    fighter
}

#[tokio::test]
async fn test_healing_potion() {
    let mut fighter = wounded_fighter();
    fighter.inventory.items.push(Item::healing_potion("p1", 10));
    fighter.inventory.items.push(Item::healing_potion("p2", 10));
    let hero = CharacterTest::from_record(fighter, &[10]).await.unwrap();

    let result = hero.act("inventory.use_item", json!({"itemId": "p1"})).await;
    assert!(result.success, "{:?}", result.error);

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["effect"], "potion");
    assert_eq!(value["health"], 15);

    let sheet = hero.sheet().await;
    assert_eq!(sheet.character.health.current, 15);
    let ids: Vec<&str> = sheet
        .character
        .inventory
        .items
        .iter()
        .map(|i| i.id.as_str())
        .collect();
    assert_eq!(ids, vec!["p2"]);
}

#[tokio::test]
async fn test_potion_heal_is_clamped() {
    let mut fighter = wounded_fighter();
    fighter.inventory.items.push(Item::healing_potion("p1", 50));
    let hero = CharacterTest::from_record(fighter, &[10]).await.unwrap();

    hero.act("inventory.use_item", json!({"id": "p1"})).await;
    assert_eq!(hero.sheet().await.character.health.current, 20);
}

#[tokio::test]
async fn test_unknown_item_has_no_effect() {
    let mut fighter = wounded_fighter();
    fighter.inventory.items.push(Item::healing_potion("p1", 10));
    let hero = CharacterTest::from_record(fighter, &[10]).await.unwrap();
    let before = hero.sheet().await.character;

    let result = hero.act("inventory.use_item", json!({"itemId": "nope"})).await;
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("item not found: nope"));

    let after = hero.sheet().await.character;
    assert_eq!(after.health, before.health);
    assert_eq!(after.inventory.items, before.inventory.items);
}

#[tokio::test]
async fn test_tool_is_kept() {
    let mut fighter = wounded_fighter();
    let mut rope = Item::with_id("t1", "Rope", ItemKind::Tool);
    rope.description = Some("You uncoil fifty feet of rope".to_string());
    fighter.inventory.items.push(rope);
    let hero = CharacterTest::from_record(fighter, &[10]).await.unwrap();

    let result = hero.act("inventory.use_item", json!({"itemId": "t1"})).await;
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["effect"], "tool");
    assert_eq!(value["consumed"], false);
    assert_eq!(value["description"], "You uncoil fifty feet of rope");
    assert_eq!(hero.sheet().await.character.inventory.items.len(), 1);
}

#[tokio::test]
async fn test_weapons_cannot_be_used() {
    let mut fighter = wounded_fighter();
    fighter
        .inventory
        .items
        .push(Item::weapon("w1", "Longsword", 1));
    let hero = CharacterTest::from_record(fighter, &[10]).await.unwrap();

    let result = hero.act("inventory.use_item", json!({"itemId": "w1"})).await;
    assert_eq!(result.error.as_deref(), Some("unsupported item type: weapon"));
}

#[tokio::test]
async fn test_equipped_weapon_feeds_attacks() {
    let mut fighter = Character::new("hero", "Hero", "fighter", 1);
    fighter.inventory.equipment.weapon = Some(Item::weapon("w1", "Longsword", 2));
    let hero = CharacterTest::from_record(fighter, &[12]).await.unwrap();
    hero.begin_turn().await;

    let result = hero.act("combat.attack", json!({"target": "orc"})).await;
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["weapon"], "Longsword");
    assert_eq!(value["attackBonus"], 7);
    assert_eq!(value["total"], 19);
}

#[tokio::test]
async fn test_weapon_damage_dice_roll_on_attack() {
    let mut fighter = Character::new("hero", "Hero", "fighter", 1);
    fighter.inventory.equipment.weapon =
        Some(Item::weapon("w1", "Longsword", 0).with_damage("1d8"));
    let hero = CharacterTest::from_record(fighter, &[12, 6]).await.unwrap();
    hero.begin_turn().await;

    let result = hero.act("combat.attack", json!({"target": "orc"})).await;
    assert!(result.success, "{:?}", result.error);
    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["attackRoll"], 12);
    // 6 on the d8, strength 16 => +3
    assert_eq!(value["damage"]["rolls"], json!([6]));
    assert_eq!(value["damage"]["total"], 9);
}

#[tokio::test]
async fn test_stored_items_without_ids_are_usable() {
    let mut fighter = wounded_fighter();
    let mut potion = Item::healing_potion("", 4);
    potion.name = "Unlabeled Flask".to_string();
    fighter.inventory.items.push(potion);
    let hero = CharacterTest::from_record(fighter, &[10]).await.unwrap();

    let sheet = hero.sheet().await;
    let id = sheet.character.inventory.items[0].id.clone();
    assert!(!id.is_empty());

    let result = hero.act("inventory.use_item", json!({"itemId": id})).await;
    assert!(result.success, "{:?}", result.error);
    assert_eq!(hero.sheet().await.character.health.current, 9);
}

#[tokio::test]
async fn test_oversized_potion_heals_to_maximum() {
    let mut fighter = wounded_fighter();
    fighter
        .inventory
        .items
        .push(Item::healing_potion("p1", i32::MAX));
    let hero = CharacterTest::from_record(fighter, &[10]).await.unwrap();

    let result = hero.act("inventory.use_item", json!({"itemId": "p1"})).await;
    assert!(result.success, "{:?}", result.error);
    assert_eq!(hero.sheet().await.character.health.current, 20);

    // actor still answers afterwards
    let result = hero.act("exploration.move", json!({"direction": "east"})).await;
    assert!(result.success);
}
