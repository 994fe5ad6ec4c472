//! # kora-memory
//!
//! Durable, bounded per-user conversation history (SQLite-backed).

pub mod store;

pub use store::{Store, UserContext};
