//! HTTP dice-roll server library.
//!
//! Each TCP connection carries exactly one `GET /?game=<id>&dice=<notation>`
//! request and gets back one JSON response, `{"body": ..}` on success or
//! `{"error": ..}` otherwise.

pub mod config;
pub mod dice;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::ServerConfig;
pub use dice::{BuiltinEngine, DiceEngine};
pub use http::DiceServer;
pub use lifecycle::Shutdown;
