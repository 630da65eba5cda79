//! # POS Database Crate
//!
//! This crate is the service's record accessor: the only place that knows
//! about SQL and the `items` table.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** All database-specific logic is encapsulated here. The web
//!   layer only sees the [`ItemRepository`] trait and [`DbError`].
//! - **One statement per operation:** every repository method is a single SQL
//!   round-trip. There are no multi-statement transactions and no optimistic
//!   concurrency control, so concurrent writes to one id are last-write-wins.
//! - **Asynchronous & Pooled:** All operations are asynchronous and share one
//!   `PgPool` opened at start-up.
//!
//! ## Public API
//!
//! - `connect`: opens the connection pool from `DatabaseSettings`.
//! - `run_migrations`: applies the embedded schema migrations.
//! - `ItemRepository`: the CRUD contract.
//! - `DbRepository`: PostgreSQL implementation of `ItemRepository`.
//! - `InMemoryRepository`: process-local implementation, for tests and for
//!   running the service without a database.
//! - `DbError`: the error type returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod memory;
pub mod repository;


// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use memory::InMemoryRepository;
pub use repository::{DbRepository, ItemRepository};
// Callers that need to name driver errors or the pool type use this.
pub use sqlx;
