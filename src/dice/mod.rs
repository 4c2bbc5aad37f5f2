//! Dice rolling
//!
//! All randomness in the engine flows through a [`DiceSource`] so that tests
//! can replay fixed sequences:
//! - `ThreadRngDice`: thread-local RNG (default)
//! - `SeededDice`: reproducible RNG from a seed
//! - `ScriptedDice`: fixed sequence of faces

mod notation;

pub use notation::{parse_dice, DiceRoll, NotationError, MAX_DICE, MAX_SIDES};

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Source of single die faces
pub trait DiceSource: Send {
    /// Roll one die, returning a value in `1..=sides`
    fn roll_die(&mut self, sides: u32) -> u32;
}

/// Thread-local RNG source
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngDice;

impl DiceSource for ThreadRngDice {
    fn roll_die(&mut self, sides: u32) -> u32 {
        rand::rng().random_range(1..=sides.max(1))
    }
}

/// Seeded RNG source, reproducible across runs
#[derive(Debug, Clone)]
pub struct SeededDice {
    rng: StdRng,
}

impl SeededDice {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl DiceSource for SeededDice {
    fn roll_die(&mut self, sides: u32) -> u32 {
        self.rng.random_range(1..=sides.max(1))
    }
}

/// Fixed sequence of faces, cycled when exhausted.
///
/// Faces are clamped into `1..=sides` so a script written for a d20 stays
/// valid when a smaller die is rolled.
#[derive(Debug, Clone)]
pub struct ScriptedDice {
    faces: VecDeque<u32>,
}

impl ScriptedDice {
    pub fn new(faces: impl IntoIterator<Item = u32>) -> Self {
        let faces: VecDeque<u32> = faces.into_iter().collect();
        Self {
            faces: if faces.is_empty() {
                VecDeque::from([1])
            } else {
                faces
            },
        }
    }
}

impl DiceSource for ScriptedDice {
    fn roll_die(&mut self, sides: u32) -> u32 {
        let face = self.faces.pop_front().unwrap_or(1);
        self.faces.push_back(face);
        face.clamp(1, sides.max(1))
    }
}

/// Outcome of a roll: individual dice plus total
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollResult {
    pub rolls: Vec<u32>,
    pub modifier: i32,
    pub total: i32,
}

/// Rolls dice against an injected source
pub struct DiceEngine {
    source: Box<dyn DiceSource>,
}

impl std::fmt::Debug for DiceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiceEngine").finish_non_exhaustive()
    }
}

impl Default for DiceEngine {
    fn default() -> Self {
        Self::new(ThreadRngDice)
    }
}

impl DiceEngine {
    /// Create an engine over the given source
    pub fn new(source: impl DiceSource + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }

    /// Reproducible engine for a seed
    pub fn seeded(seed: u64) -> Self {
        Self::new(SeededDice::new(seed))
    }

    /// Engine replaying a fixed sequence of faces
    pub fn scripted(faces: impl IntoIterator<Item = u32>) -> Self {
        Self::new(ScriptedDice::new(faces))
    }

    /// Roll `count` dice with `sides` faces and add `modifier`
    pub fn roll(&mut self, sides: u32, count: u32, modifier: i32) -> RollResult {
        let rolls: Vec<u32> = (0..count).map(|_| self.source.roll_die(sides)).collect();
        let sum = rolls.iter().fold(0u32, |acc, &r| acc.saturating_add(r));

        RollResult {
            rolls,
            modifier,
            total: i32::try_from(sum)
                .unwrap_or(i32::MAX)
                .saturating_add(modifier),
        }
    }

    /// Roll a parsed notation spec
    pub fn roll_spec(&mut self, spec: &DiceRoll) -> RollResult {
        self.roll(spec.sides, spec.count, spec.modifier)
    }

    /// Roll a single d20
    pub fn d20(&mut self) -> u32 {
        self.source.roll_die(20)
    }
}

/// Check if a d20 roll is a natural 20 (critical hit)
pub fn is_critical(roll: u32) -> bool {
    roll == 20
}

/// Check if a d20 roll is a natural 1 (critical fail)
pub fn is_fumble(roll: u32) -> bool {
    roll == 1
}
