//! The evaluation capability the server depends on.

use std::collections::BTreeSet;

/// A dice rules engine.
///
/// Implementations must be safe to call concurrently from many connection
/// tasks without external synchronization.
pub trait DiceEngine: Send + Sync {
    /// Whether `game_system` names a rule set this engine knows.
    fn is_supported(&self, game_system: &str) -> bool;

    /// Evaluate `notation` under `game_system`.
    ///
    /// Returns the rendered roll, or `None` when the notation cannot be
    /// evaluated or the game system is unknown.
    fn evaluate(&self, game_system: &str, notation: &str) -> Option<String>;
}

/// The set of supported game system identifiers.
///
/// Computed once at startup and handed to whoever needs it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameSystems {
    ids: BTreeSet<String>,
}

impl GameSystems {
    /// Build the set from identifiers.
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Exact, case-sensitive membership.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Iterate identifiers in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
