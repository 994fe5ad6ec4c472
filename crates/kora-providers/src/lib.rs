//! # kora-providers
//!
//! AI backend implementations for Kora.

pub mod gemini;
