//! # MarketFlow Events
//!
//! This crate defines the events the decision engine publishes after a cycle has
//! been committed. Downstream consumers (the Telegram alerter, the CLI) subscribe
//! to them over a broadcast channel and never feed anything back into the engine.
//!
//! As a Layer 0 crate, it depends only on `core-types`.

// Declare the modules that make up this crate.
pub mod error;
pub mod messages;

// Re-export the core types to provide a clean public API.
pub use error::EventsError;
pub use messages::{CycleFailure, EngineEvent};
