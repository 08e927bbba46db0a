/// Core error type for the scraper.
///
/// Adapter crates should map their specific errors into this type so the job
/// orchestrator can tell a history fault from a delivery fault.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The message source failed (network, permissions, unreadable export).
    #[error("message source error: {0}")]
    Source(String),

    #[error("delivery error: {0}")]
    Delivery(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
