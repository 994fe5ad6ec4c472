//! # kora-core
//!
//! Core types, traits, configuration, and error handling for the Kora gateway.

pub mod config;
pub mod context;
pub mod error;
pub mod message;
pub mod result;
pub mod traits;
pub mod turn;

pub use config::shellexpand;
