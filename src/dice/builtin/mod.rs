//! Bundled rules engine.
//!
//! # Supported systems
//! - `DiceBot`: plain `NdM` sums with modifiers and comparisons
//! - `Cthulhu7th`: sums plus `CC` percentile skill checks
//! - `Emoklore`: sums plus `kDM<=n` success counting
//!
//! # Notation
//! Commands are case-insensitive. Text after the first whitespace is a
//! comment, except for a leading repetition prefix (`x3 1d6`, `rep3 1d6`,
//! `repeat3 1d6`) which evaluates the rest several times.

pub mod common;
pub mod cthulhu7th;
pub mod emoklore;

use rand::Rng;

use crate::dice::engine::{DiceEngine, GameSystems};
use common::SumRoll;
use cthulhu7th::SkillCheck;
use emoklore::PoolRoll;

const MAX_REPEAT: u32 = 100;

/// A rule set known to the bundled engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameSystem {
    DiceBot,
    Cthulhu7th,
    Emoklore,
}

impl GameSystem {
    pub const ALL: [GameSystem; 3] = [
        GameSystem::DiceBot,
        GameSystem::Cthulhu7th,
        GameSystem::Emoklore,
    ];

    pub fn id(self) -> &'static str {
        match self {
            GameSystem::DiceBot => "DiceBot",
            GameSystem::Cthulhu7th => "Cthulhu7th",
            GameSystem::Emoklore => "Emoklore",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|system| system.id() == id)
    }

    /// Evaluate one command (no repetition prefix, already upper-cased).
    fn roll_command<R: Rng + ?Sized>(self, command: &str, rng: &mut R) -> Option<String> {
        let specific = match self {
            GameSystem::DiceBot => None,
            GameSystem::Cthulhu7th => SkillCheck::parse(command).map(|check| check.roll(rng)),
            GameSystem::Emoklore => PoolRoll::parse(command).map(|pool| pool.roll(rng)),
        };
        specific.or_else(|| SumRoll::parse(command).map(|sum| sum.roll(rng)))
    }
}

/// Split `x3 rest`, `rep3 rest` or `repeat3 rest` into the count and rest.
fn split_repeat(notation: &str) -> Option<(u32, &str)> {
    let (head, rest) = notation.split_once(char::is_whitespace)?;
    let head = head.to_ascii_uppercase();
    let digits = ["REPEAT", "REP", "X"]
        .iter()
        .find_map(|prefix| head.strip_prefix(prefix))?;
    let times = digits.parse().ok()?;
    Some((times, rest.trim_start()))
}

fn first_command(notation: &str) -> Option<String> {
    notation
        .split_whitespace()
        .next()
        .map(str::to_ascii_uppercase)
}

/// The engine shipped with the server.
#[derive(Debug, Clone)]
pub struct BuiltinEngine {
    systems: GameSystems,
}

impl BuiltinEngine {
    pub fn new() -> Self {
        Self {
            systems: GameSystems::new(GameSystem::ALL.iter().map(|s| s.id())),
        }
    }

    pub fn systems(&self) -> &GameSystems {
        &self.systems
    }

    /// Evaluate with a caller-supplied random source.
    pub fn evaluate_with<R: Rng + ?Sized>(
        &self,
        game_system: &str,
        notation: &str,
        rng: &mut R,
    ) -> Option<String> {
        if !self.systems.contains(game_system) {
            return None;
        }
        let system = GameSystem::from_id(game_system)?;
        let notation = notation.trim();

        if let Some((times, rest)) = split_repeat(notation) {
            if !(1..=MAX_REPEAT).contains(&times) {
                return None;
            }
            let command = first_command(rest)?;
            let mut sections = Vec::with_capacity(times as usize);
            for i in 1..=times {
                let text = system.roll_command(&command, rng)?;
                sections.push(format!("#{i}\n{text}"));
            }
            return Some(sections.join("\n\n"));
        }

        system.roll_command(&first_command(notation)?, rng)
    }
}

impl Default for BuiltinEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl DiceEngine for BuiltinEngine {
    fn is_supported(&self, game_system: &str) -> bool {
        self.systems.contains(game_system)
    }

    fn evaluate(&self, game_system: &str, notation: &str) -> Option<String> {
        self.evaluate_with(game_system, notation, &mut rand::thread_rng())
    }
}
