//! Core domain + relay logic for the anonymous message bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and the HTTP
//! keep-alive endpoint live behind ports (traits) implemented in adapter crates.

pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod messaging;
pub mod notice;
pub mod payload;
pub mod resolver;
pub mod router;
pub mod store;
pub mod tokens;

pub use errors::{Error, Result};
