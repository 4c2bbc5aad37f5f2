//! Action validation and resolution
//!
//! Every handler validates first and mutates only after all checks pass, so
//! a failed action never leaves a partial change behind.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::payload::{
    decode, AttackPayload, CastSpellPayload, MovePayload, SearchPayload, SpeakPayload,
    UseItemPayload,
};
use super::{
    ActionError, ActionKind, ActionOutcome, ActionResult, AttackOutcome, DefendOutcome,
    ItemEffect, ItemOutcome, MoveOutcome, SearchOutcome, SpeakOutcome, Speaker, SpellOutcome,
    DEFEND_BONUS, MANA_PER_SPELL_LEVEL, MAX_COMBAT_MOVE,
};
use crate::character::{ability_modifier, CharacterState, CombatPhase, ItemKind};
use crate::dice::{is_critical, is_fumble, parse_dice, DiceEngine};

/// Mutable access handed to custom action handlers
pub struct ActionContext<'a> {
    pub state: &'a mut CharacterState,
    pub dice: &'a mut DiceEngine,
}

/// Pluggable handler for an action tag outside the built-in set.
///
/// Handlers must validate before mutating, like the built-ins.
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn handle(
        &self,
        ctx: &mut ActionContext<'_>,
        data: &serde_json::Value,
    ) -> Result<ActionOutcome, ActionError>;
}

/// Resolves actions against a character's state
pub struct ActionProcessor {
    dice: DiceEngine,
    handlers: HashMap<String, Arc<dyn ActionHandler>>,
}

impl std::fmt::Debug for ActionProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionProcessor")
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for ActionProcessor {
    fn default() -> Self {
        Self::new(DiceEngine::default())
    }
}

impl ActionProcessor {
    /// Create a processor rolling with the given dice
    pub fn new(dice: DiceEngine) -> Self {
        Self {
            dice,
            handlers: HashMap::new(),
        }
    }

    /// Register a handler for a custom action tag. Built-in tags cannot be
    /// overridden; returns false for them.
    pub fn register(&mut self, tag: &str, handler: Arc<dyn ActionHandler>) -> bool {
        if ActionKind::from_tag(tag).is_some() {
            return false;
        }
        self.handlers.insert(tag.to_string(), handler);
        true
    }

    /// Validate and resolve one action. Failures come back as a result with
    /// `success: false`, never as an error.
    pub async fn process(
        &mut self,
        state: &mut CharacterState,
        action_type: &str,
        data: &serde_json::Value,
    ) -> ActionResult {
        let resolved = match ActionKind::from_tag(action_type) {
            Some(kind) => self.resolve(kind, state, data).await,
            None => self.resolve_custom(action_type, state, data).await,
        };

        match resolved {
            Ok(outcome) => {
                debug!("{} performed {}", state.id(), action_type);
                ActionResult::ok(action_type, outcome)
            }
            Err(e) => {
                debug!("{} failed {}: {}", state.id(), action_type, e);
                ActionResult::failed(action_type, &e)
            }
        }
    }

    async fn resolve(
        &mut self,
        kind: ActionKind,
        state: &mut CharacterState,
        data: &serde_json::Value,
    ) -> Result<ActionOutcome, ActionError> {
        match kind {
            ActionKind::Attack => self.attack(state, decode(data)?),
            ActionKind::Defend => defend(state),
            ActionKind::CastSpell => {
                let payload: CastSpellPayload = decode(data)?;
                cast_spell(state, &payload.spell, payload.level, payload.target, true)
                    .await
                    .map(ActionOutcome::Spell)
            }
            ActionKind::Move => move_character(state, decode(data)?).await,
            ActionKind::Search => self.search(state, decode(data)?),
            ActionKind::Speak => speak(state, decode(data)?),
            ActionKind::UseItem => use_item(state, decode(data)?).await,
        }
    }

    async fn resolve_custom(
        &mut self,
        tag: &str,
        state: &mut CharacterState,
        data: &serde_json::Value,
    ) -> Result<ActionOutcome, ActionError> {
        let handler = self
            .handlers
            .get(tag)
            .cloned()
            .ok_or_else(|| ActionError::Unhandled(tag.to_string()))?;

        let mut ctx = ActionContext {
            state,
            dice: &mut self.dice,
        };
        handler.handle(&mut ctx, data).await
    }

    fn attack(
        &mut self,
        state: &CharacterState,
        payload: AttackPayload,
    ) -> Result<ActionOutcome, ActionError> {
        match state.phase() {
            CombatPhase::Idle => return Err(ActionError::NotInCombat),
            CombatPhase::Waiting => return Err(ActionError::NotYourTurn),
            CombatPhase::Acting => {}
        }

        let equipped = state.character().inventory.equipment.weapon.as_ref();
        let weapon = payload
            .weapon
            .or_else(|| equipped.map(|w| w.name.clone()));

        // damage dice only come from the weapon actually in hand
        let damage_dice = match equipped {
            Some(item) if weapon.as_deref() == Some(item.name.as_str()) => item
                .damage
                .as_deref()
                .map(|notation| {
                    parse_dice(notation)
                        .map_err(|e| ActionError::InvalidItem(item.id.clone(), e.to_string()))
                })
                .transpose()?,
            _ => None,
        };

        let roll = self.dice.d20();
        let attack_bonus = state.attack_bonus();
        let damage = damage_dice.map(|mut dice| {
            let strength = ability_modifier(state.character().attributes.strength);
            dice.modifier = dice.modifier.saturating_add(strength);
            self.dice.roll_spec(&dice)
        });

        Ok(ActionOutcome::Attack(AttackOutcome {
            attack_roll: roll,
            attack_bonus,
            total: roll as i32 + attack_bonus,
            weapon,
            target: payload.target,
            critical: is_critical(roll),
            fumble: is_fumble(roll),
            damage,
        }))
    }

    fn search(
        &mut self,
        state: &CharacterState,
        payload: SearchPayload,
    ) -> Result<ActionOutcome, ActionError> {
        let roll = self.dice.d20();
        let wisdom_modifier = ability_modifier(state.character().attributes.wisdom);

        Ok(ActionOutcome::Search(SearchOutcome {
            roll,
            wisdom_modifier,
            perception: roll as i32 + wisdom_modifier,
            area: payload.area,
        }))
    }
}

fn defend(state: &CharacterState) -> Result<ActionOutcome, ActionError> {
    if !state.character().combat.in_combat {
        return Err(ActionError::NotInCombat);
    }
    Ok(ActionOutcome::Defend(DefendOutcome {
        defense_bonus: DEFEND_BONUS,
    }))
}

/// Spend mana for a spell. `require_known` gates on the spell list; scrolls
/// skip that gate.
async fn cast_spell(
    state: &mut CharacterState,
    spell: &str,
    level: u32,
    target: Option<String>,
    require_known: bool,
) -> Result<SpellOutcome, ActionError> {
    if require_known && !state.character().knows_spell(spell) {
        return Err(ActionError::UnknownSpell(spell.to_string()));
    }

    let cost = i32::try_from(level)
        .ok()
        .and_then(|level| level.checked_mul(MANA_PER_SPELL_LEVEL))
        .ok_or_else(|| ActionError::InvalidPayload(format!("spell level out of range: {}", level)))?;
    let available = state.character().mana.current;

    // use_mana leaves mana untouched when it refuses
    if !state.use_mana(cost).await {
        return Err(ActionError::InsufficientMana {
            required: cost,
            available,
        });
    }

    Ok(SpellOutcome {
        spell: spell.to_string(),
        spell_level: level,
        mana_cost: cost,
        mana_remaining: state.character().mana.current,
        target,
    })
}

async fn move_character(
    state: &mut CharacterState,
    payload: MovePayload,
) -> Result<ActionOutcome, ActionError> {
    let (direction, distance) = payload.resolve()?;

    if state.phase() == CombatPhase::Acting && distance > MAX_COMBAT_MOVE {
        return Err(ActionError::ExcessMovement {
            distance,
            max: MAX_COMBAT_MOVE,
        });
    }

    let position = state.move_to(direction, distance).await.ok_or_else(|| {
        ActionError::InvalidPayload(format!("cannot move {} {} from here", distance, direction))
    })?;
    Ok(ActionOutcome::Move(MoveOutcome {
        direction,
        distance,
        position,
    }))
}

fn speak(state: &CharacterState, payload: SpeakPayload) -> Result<ActionOutcome, ActionError> {
    let character = state.character();
    Ok(ActionOutcome::Speak(SpeakOutcome {
        speaker: Speaker {
            id: character.id.clone(),
            name: character.name.clone(),
        },
        message: payload.message,
        target: payload.target,
        tone: payload.tone,
    }))
}

async fn use_item(
    state: &mut CharacterState,
    payload: UseItemPayload,
) -> Result<ActionOutcome, ActionError> {
    let item = state
        .character()
        .item(&payload.item_id)
        .cloned()
        .ok_or_else(|| ActionError::ItemNotFound(payload.item_id.clone()))?;

    let (effect, consumed) = match &item.kind {
        ItemKind::Potion => {
            let health = match item.heal_amount {
                Some(amount) => Some(state.heal(amount).await),
                None => None,
            };
            let mana = match item.mana_amount {
                Some(amount) => Some(state.restore_mana(amount).await),
                None => None,
            };
            (ItemEffect::Potion { health, mana }, true)
        }
        ItemKind::Scroll => {
            let spell = item.spell.as_deref().ok_or_else(|| {
                ActionError::InvalidItem(item.id.clone(), "scroll has no spell".to_string())
            })?;
            let level = item.spell_level.unwrap_or(1);
            let outcome = cast_spell(state, spell, level, payload.target, false).await?;
            (ItemEffect::Scroll { spell: outcome }, true)
        }
        ItemKind::Tool => {
            let description = item
                .description
                .clone()
                .unwrap_or_else(|| format!("{} uses the {}", state.character().name, item.name));
            (ItemEffect::Tool { description }, false)
        }
        other => return Err(ActionError::UnsupportedItemType(other.to_string())),
    };

    if consumed {
        state.remove_item(&item.id).await;
    }

    Ok(ActionOutcome::Item(ItemOutcome {
        item_id: item.id,
        item_name: item.name,
        item_type: item.kind.to_string(),
        consumed,
        effect,
    }))
}
