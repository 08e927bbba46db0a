//! Telegram front end for numscrape.
//!
//! `messenger` speaks the Bot API for the core's outbound port, `router` and
//! `handlers` turn incoming updates into history records and scrape jobs.

pub mod handlers;
pub mod messenger;
pub mod router;
#[cfg(feature = "user-session")]
pub mod user_session;

pub use messenger::BotMessenger;
