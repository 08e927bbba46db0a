//! Telegram update handlers.
//!
//! Every message from the target chat is fed into live history first (when live
//! recording is active); slash commands are then routed to the command handler.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use crate::router::AppState;

mod commands;

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    record_history(&msg, &state).await;

    if msg.text().is_some_and(|t| t.starts_with('/')) {
        return commands::handle_command(bot, msg, state).await;
    }

    Ok(())
}

/// Channels have no senders to authorize, so posts are only recorded.
pub async fn handle_channel_post(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    record_history(&msg, &state).await;
    Ok(())
}

async fn record_history(msg: &Message, state: &AppState) {
    let Some(live) = &state.live else {
        return;
    };
    if live
        .record(msg.chat.id.0, msg.chat.username(), msg.text())
        .await
    {
        tracing::trace!(chat = msg.chat.id.0, "recorded history message");
    }
}
