//! Core domain + application logic for the Telegram dial bot.
//!
//! This crate is intentionally framework-agnostic. Telegram / Twilio / HTTP
//! live behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod messaging;
pub mod ports;
pub mod security;
pub mod voice;

pub use errors::{Error, Result};
