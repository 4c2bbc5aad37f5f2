//! Typed action payloads

use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::ActionError;
use crate::character::Direction;

/// Decode an action payload; a missing (null) payload counts as `{}`
pub(crate) fn decode<T: DeserializeOwned>(data: &serde_json::Value) -> Result<T, ActionError> {
    let data = if data.is_null() {
        serde_json::Value::Object(Default::default())
    } else {
        data.clone()
    };
    serde_json::from_value(data).map_err(|e| ActionError::InvalidPayload(e.to_string()))
}

fn default_spell_level() -> u32 {
    1
}

fn default_distance() -> i32 {
    1
}

fn default_tone() -> String {
    "neutral".to_string()
}

/// `combat.attack`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttackPayload {
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub weapon: Option<String>,
}

/// `combat.cast_spell`
#[derive(Debug, Clone, Deserialize)]
pub struct CastSpellPayload {
    #[serde(alias = "spellName")]
    pub spell: String,
    #[serde(alias = "spellLevel", default = "default_spell_level")]
    pub level: u32,
    #[serde(default)]
    pub target: Option<String>,
}

/// `exploration.move`
#[derive(Debug, Clone, Deserialize)]
pub struct MovePayload {
    pub direction: String,
    #[serde(default = "default_distance")]
    pub distance: i32,
}

impl MovePayload {
    /// Validated direction and non-negative distance
    pub fn resolve(&self) -> Result<(Direction, i32), ActionError> {
        let direction: Direction = self
            .direction
            .parse()
            .map_err(ActionError::InvalidPayload)?;
        if self.distance < 0 {
            return Err(ActionError::InvalidPayload(format!(
                "distance must be non-negative, got {}",
                self.distance
            )));
        }
        Ok((direction, self.distance))
    }
}

/// `exploration.search`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchPayload {
    #[serde(default)]
    pub area: Option<String>,
}

/// `social.speak`
#[derive(Debug, Clone, Deserialize)]
pub struct SpeakPayload {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default = "default_tone")]
    pub tone: String,
}

/// `inventory.use_item`
#[derive(Debug, Clone, Deserialize)]
pub struct UseItemPayload {
    #[serde(rename = "itemId", alias = "item_id", alias = "id")]
    pub item_id: String,
    #[serde(default)]
    pub target: Option<String>,
}
