//! Normalizes engine answers into a [`RollOutcome`].

use crate::dice::engine::DiceEngine;

/// Result of evaluating one `(game, dice)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollOutcome {
    /// Rendered roll text.
    Success(String),
    /// The game system identifier is unknown to the engine.
    NotSupported,
    /// The notation could not be evaluated.
    InvalidRoll,
}

impl RollOutcome {
    /// Short label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            RollOutcome::Success(_) => "success",
            RollOutcome::NotSupported => "not_supported",
            RollOutcome::InvalidRoll => "invalid_roll",
        }
    }
}

/// Check support first, then make exactly one evaluation attempt.
pub fn roll(engine: &dyn DiceEngine, game: &str, dice: &str) -> RollOutcome {
    if !engine.is_supported(game) {
        return RollOutcome::NotSupported;
    }

    match engine.evaluate(game, dice) {
        Some(text) => RollOutcome::Success(text),
        None => RollOutcome::InvalidRoll,
    }
}
