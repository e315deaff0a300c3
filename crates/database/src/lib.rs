//! # MarketFlow Database Crate
//!
//! This crate acts as a high-level, application-specific interface to the
//! SQLite database. It is the system's durable memory: the singleton
//! `SignalState`, the log of emitted signals and the cached threshold
//! calculations.
//!
//! ## Architectural Principles
//!
//! - **Layer 3 Adapter:** This crate is an adapter that encapsulates all database-specific
//!   logic. The engine sees only the `SignalStateStore` and `CalculationStore` traits.
//! - **Atomic Cycles:** A cycle's state and its signal record are committed in one
//!   transaction, so a crash leaves either the old state or the new one.
//! - **Asynchronous & Pooled:** All operations are asynchronous over a `SqlitePool`.
//!
//! ## Public API
//!
//! - `connect`: The async function to establish the database connection pool.
//! - `run_migrations`: A utility to apply database migrations, ensuring the schema is up-to-date.
//! - `DbRepository`: Holds the pool and implements both store traits.
//! - `DbError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod repository;
pub mod store;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use repository::DbRepository;
pub use store::{CalculationStore, SignalStateStore, ThresholdCalculation};
