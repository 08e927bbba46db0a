//! Outbound messenger abstractions (Telegram today).

pub mod pacing;
pub mod port;
pub mod types;
