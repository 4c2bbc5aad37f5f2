//! Dice notation: "2d6+3", "d20", "4d6-2"

use std::str::FromStr;

use thiserror::Error;

/// Notation parse failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotationError {
    #[error("missing 'd' in dice notation: {0}")]
    MissingSeparator(String),

    #[error("invalid dice count: {0}")]
    Count(String),

    #[error("invalid die sides: {0}")]
    Sides(String),

    #[error("invalid modifier: {0}")]
    Modifier(String),
}

/// Most dice a single notation may roll
pub const MAX_DICE: u32 = 100;

/// Largest die a notation may name
pub const MAX_SIDES: u32 = 1000;

/// `count` dice of `sides` faces plus a flat modifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceRoll {
    pub count: u32,
    pub sides: u32,
    pub modifier: i32,
}

impl DiceRoll {
    pub fn new(count: u32, sides: u32, modifier: i32) -> Self {
        Self {
            count,
            sides,
            modifier,
        }
    }

    pub fn d20() -> Self {
        Self::new(1, 20, 0)
    }

    /// Every die showing 1
    pub fn min(&self) -> i32 {
        self.count as i32 + self.modifier
    }

    /// Every die showing its top face
    pub fn max(&self) -> i32 {
        (self.count * self.sides) as i32 + self.modifier
    }

    /// Expected total, rounded down
    pub fn average(&self) -> i32 {
        (self.min() + self.max()).div_euclid(2)
    }
}

impl FromStr for DiceRoll {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_dice(s)
    }
}

impl std::fmt::Display for DiceRoll {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;
        if self.modifier != 0 {
            write!(f, "{:+}", self.modifier)?;
        }
        Ok(())
    }
}

/// Parse `[count]d<sides>[+|-modifier]`, case-insensitive. Counts above
/// [`MAX_DICE`] and sides above [`MAX_SIDES`] are rejected.
pub fn parse_dice(notation: &str) -> Result<DiceRoll, NotationError> {
    let lowered = notation.trim().to_ascii_lowercase();

    let (count, rest) = lowered
        .split_once('d')
        .ok_or_else(|| NotationError::MissingSeparator(notation.to_string()))?;

    let count = match count {
        "" => 1,
        n => n
            .parse::<u32>()
            .ok()
            .filter(|&n| (1..=MAX_DICE).contains(&n))
            .ok_or_else(|| NotationError::Count(n.to_string()))?,
    };

    // a sign at position 0 belongs to the sides, which then fail to parse
    let (sides, modifier) = match rest.find(['+', '-']).filter(|&pos| pos > 0) {
        Some(pos) => {
            let (sides, modifier) = rest.split_at(pos);
            let modifier = modifier
                .parse::<i32>()
                .map_err(|_| NotationError::Modifier(modifier.to_string()))?;
            (sides, modifier)
        }
        None => (rest, 0),
    };

    let sides = sides
        .parse::<u32>()
        .ok()
        .filter(|&s| (1..=MAX_SIDES).contains(&s))
        .ok_or_else(|| NotationError::Sides(sides.to_string()))?;

    Ok(DiceRoll::new(count, sides, modifier))
}
