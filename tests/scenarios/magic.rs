//! Spell casting and scroll scenarios

use chard::character::{Character, Item, ItemKind};
use serde_json::json;

use crate::harness::CharacterTest;

#[tokio::test]
async fn test_cast_known_spell() {
    // wizard level 1 starts with 15 mana
    let wizard = CharacterTest::start("wizard", 1, &[10]).await.unwrap();

    let result = wizard
        .act(
            "combat.cast_spell",
            json!({"spellName": "magic missile", "spellLevel": 2, "target": "orc"}),
        )
        .await;
    assert!(result.success, "{:?}", result.error);

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["manaCost"], 4);
    assert_eq!(value["manaRemaining"], 11);
    assert_eq!(wizard.sheet().await.character.mana.current, 11);
}

#[tokio::test]
async fn test_unknown_spell_costs_nothing() {
    let wizard = CharacterTest::start("wizard", 1, &[10]).await.unwrap();

    let result = wizard
        .act("combat.cast_spell", json!({"spell": "Fireball", "level": 1}))
        .await;
    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("spell unknown: Fireball"));
    assert_eq!(wizard.sheet().await.character.mana.current, 15);
}

#[tokio::test]
async fn test_insufficient_mana() {
    let wizard = CharacterTest::start("wizard", 1, &[10]).await.unwrap();

    // 8 * 2 = 16 > 15
    let result = wizard
        .act("combat.cast_spell", json!({"spell": "Sleep", "level": 8}))
        .await;
    assert!(!result.success);
    assert!(result.error.unwrap().starts_with("insufficient mana"));
    assert_eq!(wizard.sheet().await.character.mana.current, 15);

    let result = wizard
        .act("combat.cast_spell", json!({"spell": "Sleep", "level": 7}))
        .await;
    assert!(result.success);
    assert_eq!(wizard.sheet().await.character.mana.current, 1);
}

#[tokio::test]
async fn test_scroll_bypasses_spell_list() {
    let mut wizard = Character::new("hero", "Hero", "wizard", 1);
    wizard.inventory.items.push(Item::scroll("s1", "Fireball", 3));
    let hero = CharacterTest::from_record(wizard, &[10]).await.unwrap();

    let result = hero
        .act("inventory.use_item", json!({"itemId": "s1", "target": "troll"}))
        .await;
    assert!(result.success, "{:?}", result.error);

    let value = serde_json::to_value(&result).unwrap();
    assert_eq!(value["effect"], "scroll");
    assert_eq!(value["consumed"], true);
    assert_eq!(value["spell"]["spell"], "Fireball");
    assert_eq!(value["spell"]["manaCost"], 6);

    let sheet = hero.sheet().await;
    assert_eq!(sheet.character.mana.current, 9);
    assert!(sheet.character.inventory.items.is_empty());
    // reading a scroll does not teach the spell
    assert!(!sheet.character.knows_spell("Fireball"));
}

#[tokio::test]
async fn test_scroll_still_needs_mana() {
    let mut fighter = Character::new("hero", "Hero", "fighter", 1);
    fighter.inventory.items.push(Item::scroll("s1", "Bless", 1));
    let hero = CharacterTest::from_record(fighter, &[10]).await.unwrap();

    let result = hero.act("inventory.use_item", json!({"itemId": "s1"})).await;
    assert!(!result.success);
    assert!(result.error.unwrap().starts_with("insufficient mana"));
    assert_eq!(hero.sheet().await.character.inventory.items.len(), 1);
}

#[tokio::test]
async fn test_blank_scroll_is_invalid() {
    let mut wizard = Character::new("hero", "Hero", "wizard", 1);
    wizard
        .inventory
        .items
        .push(Item::with_id("s1", "Blank Scroll", ItemKind::Scroll));
    let hero = CharacterTest::from_record(wizard, &[10]).await.unwrap();

    let result = hero.act("inventory.use_item", json!({"itemId": "s1"})).await;
    assert!(!result.success);

    let sheet = hero.sheet().await;
    assert_eq!(sheet.character.inventory.items.len(), 1);
    assert_eq!(sheet.character.mana.current, 15);
}
