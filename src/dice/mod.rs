//! Dice evaluation subsystem.
//!
//! # Data Flow
//! ```text
//! (game, dice) from the decoded query
//!     → adapter.rs (support check, single evaluation)
//!     → engine.rs (DiceEngine trait)
//!     → builtin/ (bundled rules)
//!     → RollOutcome back to the connection handler
//! ```
//!
//! # Design Decisions
//! - The server only sees the `DiceEngine` trait, shared as `Arc<dyn DiceEngine>`
//! - Supported identifiers are computed once when the engine is built
//! - Engines hold no mutable state, so no locking between requests

pub mod adapter;
pub mod builtin;
pub mod engine;

pub use adapter::{roll, RollOutcome};
pub use builtin::{BuiltinEngine, GameSystem};
pub use engine::{DiceEngine, GameSystems};
