use std::sync::Arc;

use numscrape_core::{config::Config, Error};

#[tokio::main]
async fn main() -> Result<(), Error> {
    numscrape_core::logging::init("numscrape")?;

    let cfg = Arc::new(Config::load()?);
    tracing::info!(
        temp_dir = %cfg.temp_dir.display(),
        default_limit = cfg.default_scrape_limit,
        "configuration loaded"
    );

    match std::env::args().nth(1).as_deref() {
        None | Some("run") => numscrape_telegram::router::run_polling(cfg)
            .await
            .map_err(|e| Error::External(format!("telegram bot failed: {e}"))),
        Some("login") => login(&cfg).await,
        Some(other) => Err(Error::Config(format!(
            "unknown command `{other}` (expected `run` or `login`)"
        ))),
    }
}

/// Sign the user account in and write its session file.
#[cfg(feature = "user-session")]
async fn login(cfg: &Config) -> Result<(), Error> {
    let session = cfg.user_session.as_ref().ok_or_else(|| {
        Error::Config("login needs TELEGRAM_API_ID and TELEGRAM_API_HASH".to_string())
    })?;
    numscrape_telegram::user_session::login(session).await
}

#[cfg(not(feature = "user-session"))]
async fn login(_cfg: &Config) -> Result<(), Error> {
    Err(Error::Config(
        "numscrape was built without the `user-session` feature".to_string(),
    ))
}
