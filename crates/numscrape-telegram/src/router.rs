use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use numscrape_core::{
    config::{Config, UserSessionConfig},
    messaging::{
        pacing::{PacedMessenger, Pacing},
        port::MessagingPort,
    },
    source::{export::ExportSource, live::LiveHistory, MessageSource},
    Result,
};

use crate::handlers;
use crate::BotMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub messenger: Arc<dyn MessagingPort>,
    pub source: Arc<dyn MessageSource>,
    /// Present when history is recorded from live updates.
    pub live: Option<Arc<LiveHistory>>,
    /// Our own `@username`, used to ignore `/cmd@otherbot`.
    pub bot_username: Option<String>,
}

/// Pick the history source: an export file, then a user session, then live recording.
pub async fn build_source(
    cfg: &Config,
) -> Result<(Arc<dyn MessageSource>, Option<Arc<LiveHistory>>)> {
    if let Some(path) = &cfg.history_export_path {
        let source: Arc<dyn MessageSource> = Arc::new(ExportSource::new(path.clone()));
        return Ok((source, None));
    }

    if let Some(session) = &cfg.user_session {
        return Ok((connect_user_session(session).await?, None));
    }

    tracing::warn!(
        target_chat = %cfg.target_chat,
        "no history source configured; only messages seen after startup can be scraped, \
         and only if the bot's group privacy mode is disabled"
    );
    let live = Arc::new(LiveHistory::new(
        cfg.target_chat.clone(),
        cfg.history_capacity,
    ));
    let source: Arc<dyn MessageSource> = live.clone();
    Ok((source, Some(live)))
}

#[cfg(feature = "user-session")]
async fn connect_user_session(cfg: &UserSessionConfig) -> Result<Arc<dyn MessageSource>> {
    let source = crate::user_session::UserSessionSource::connect(cfg).await?;
    Ok(Arc::new(source))
}

#[cfg(not(feature = "user-session"))]
async fn connect_user_session(_cfg: &UserSessionConfig) -> Result<Arc<dyn MessageSource>> {
    Err(numscrape_core::Error::Config(
        "TELEGRAM_API_ID is set but numscrape was built without the `user-session` feature"
            .to_string(),
    ))
}

pub async fn run_polling(cfg: Arc<Config>) -> anyhow::Result<()> {
    cfg.ensure_dirs()?;
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    let bot_username = match bot.get_me().await {
        Ok(me) => {
            tracing::info!("numscrape started: @{}", me.username());
            Some(me.username().to_string())
        }
        Err(e) => {
            tracing::warn!("get_me failed, addressed commands will be ignored: {e}");
            None
        }
    };

    let (source, live) = build_source(&cfg).await?;
    tracing::info!(
        target_chat = %cfg.target_chat,
        source = source.name(),
        allowed_users = cfg.telegram_allowed_users.len(),
        "history source ready"
    );
    if cfg.telegram_allowed_users.is_empty() {
        tracing::warn!("TELEGRAM_ALLOWED_USERS is empty; anyone can run scrape commands");
    }

    let messenger: Arc<dyn MessagingPort> = Arc::new(PacedMessenger::new(
        Arc::new(BotMessenger::new(bot.clone())),
        Pacing::default(),
    ));

    let state = Arc::new(AppState {
        cfg,
        messenger,
        source,
        live,
        bot_username,
    });

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handlers::handle_message))
        .branch(Update::filter_channel_post().endpoint(handlers::handle_channel_post));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
