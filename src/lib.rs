//! Single-elimination tournament engine for a club's singles and doubles
//! draws.
//!
//! The bracket builder turns a roster snapshot into a complete knockout
//! draw with byes assigned fairly; the result propagator advances winners
//! round by round and absorbs mid-tournament edits. Persistence sits behind
//! the store traits, so the engine itself is data in, data out.

/// Bracket construction and winner propagation.
pub mod bracket;
/// The administrator workflow tying the stores to the bracket engine.
pub mod manager;
/// Traits and types used for interacting with the backing stores.
pub mod store;

pub mod utils;

/// A thread-safe Error type used across the engine.
pub type EngineError = anyhow::Error;
