//! # kora-channels
//!
//! Messaging platform integrations for Kora.

pub mod console;
pub mod messenger;
pub mod utils;

pub use utils::split_message;
