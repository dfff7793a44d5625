//! Core domain + application logic for winbot, the daily-message bot.
//!
//! This crate is framework-agnostic. Telegram and the HTTP liveness probe live
//! in adapter crates; they reach the core through the messaging port and the
//! conversation flow.

pub mod clock;
pub mod config;
pub mod content;
pub mod domain;
pub mod errors;
pub mod flow;
pub mod gate;
pub mod logging;
pub mod messaging;
pub mod store;
pub mod texts;

pub use errors::{Error, Result};
