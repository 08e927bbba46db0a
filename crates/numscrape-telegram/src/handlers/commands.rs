use std::sync::Arc;

use rand::{rngs::StdRng, SeedableRng};
use teloxide::prelude::*;

use numscrape_core::{
    delivery::ChatDelivery,
    domain::{ChatId, Mode, UserId},
    job::{JobState, ScrapeJob, ScrapeRequest},
    security::is_authorized,
};

use crate::router::AppState;

#[derive(Debug, PartialEq, Eq)]
struct Command {
    name: String,
    /// Bot named in `/cmd@botname`, if any.
    addressee: Option<String>,
    args: String,
}

fn parse_command(text: &str) -> Command {
    let (head, args) = text
        .trim()
        .split_once(char::is_whitespace)
        .unwrap_or((text.trim(), ""));
    let head = head.trim_start_matches('/');
    let (name, addressee) = match head.split_once('@') {
        Some((name, bot)) => (name, Some(bot.to_string())),
        None => (head, None),
    };

    Command {
        name: name.to_lowercase(),
        addressee,
        args: args.trim().to_string(),
    }
}

/// In groups `/cmd@otherbot` belongs to another bot. When our own username is
/// unknown only unaddressed commands are taken.
fn addressed_to_us(addressee: Option<&str>, me: Option<&str>) -> bool {
    match (addressee, me) {
        (None, _) => true,
        (Some(to), Some(me)) => to.eq_ignore_ascii_case(me),
        (Some(_), None) => false,
    }
}

/// Message count from the first argument; anything missing, unparsable or zero
/// falls back to `default`.
fn parse_limit(args: &str, default: usize) -> usize {
    args.split_whitespace()
        .next()
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(default)
}

fn scrape_mode(cmd: &str) -> Option<Mode> {
    match cmd {
        "scrapnotfound" => Some(Mode::NotFound),
        "scrapfound" => Some(Mode::Found),
        _ => None,
    }
}

fn help_text(default_limit: usize) -> String {
    format!(
        "🤖 <b>Bot is Online!</b>\n\n\
Use:\n\
<code>/scrapnotfound &lt;amount&gt;</code> - numbers from \"Not Found\" messages\n\
<code>/scrapfound &lt;amount&gt;</code> - numbers from SIM lines\n\n\
Amount defaults to {default_limit} messages."
    )
}

pub async fn handle_command(_bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let chat_id = ChatId(msg.chat.id.0);
    let Command {
        name: cmd,
        addressee,
        args,
    } = parse_command(text);
    if !addressed_to_us(addressee.as_deref(), state.bot_username.as_deref()) {
        tracing::debug!(%cmd, ?addressee, "command for another bot");
        return Ok(());
    }
    let mode = scrape_mode(&cmd);
    if mode.is_none() && cmd != "start" && cmd != "help" {
        // Not ours; stay quiet in groups.
        return Ok(());
    }

    let user_id = msg.from().map(|u| UserId(u.id.0 as i64));
    if !is_authorized(user_id, &state.cfg.telegram_allowed_users) {
        tracing::info!(?user_id, %cmd, "unauthorized command");
        let _ = state
            .messenger
            .send_html(chat_id, "Unauthorized. Contact the bot owner for access.")
            .await;
        return Ok(());
    }

    let Some(mode) = mode else {
        let _ = state
            .messenger
            .send_html(chat_id, &help_text(state.cfg.default_scrape_limit))
            .await;
        return Ok(());
    };

    let limit = parse_limit(&args, state.cfg.default_scrape_limit);
    run_scrape(&state, chat_id, mode, limit).await;
    Ok(())
}

async fn run_scrape(state: &AppState, chat_id: ChatId, mode: Mode, limit: usize) {
    let sink = ChatDelivery::new(
        state.messenger.clone(),
        chat_id,
        state.cfg.temp_dir.clone(),
    );
    let mut job = ScrapeJob::new(state.cfg.scrape_settings(), ScrapeRequest { mode, limit });
    let mut rng = StdRng::from_entropy();

    match job.run(state.source.as_ref(), &sink, &mut rng).await {
        JobState::Completed { count } => {
            tracing::info!(chat = chat_id.0, %mode, count, "delivered scrape results")
        }
        JobState::Empty => tracing::info!(chat = chat_id.0, %mode, "no matches"),
        JobState::Failed { reason } => {
            tracing::warn!(chat = chat_id.0, %mode, "scrape failed: {reason}")
        }
        JobState::Idle | JobState::Running { .. } => {
            tracing::error!(chat = chat_id.0, %mode, "scrape ended in a non-terminal state")
        }
    }
}
