//! Core domain + application logic for the number scraper bot.
//!
//! This crate is intentionally framework-agnostic. Telegram lives behind ports
//! (traits) implemented in the adapter crate; history sources and the output
//! sink are ports too, so the scrape pipeline can be driven from tests.

pub mod classify;
pub mod config;
pub mod delivery;
pub mod domain;
pub mod errors;
pub mod extract;
pub mod formatting;
pub mod job;
pub mod logging;
pub mod messaging;
pub mod output;
pub mod security;
pub mod source;

pub use errors::{Error, Result};
