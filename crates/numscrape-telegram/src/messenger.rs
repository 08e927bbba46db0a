use std::{future::IntoFuture, time::Duration};

use async_trait::async_trait;
use teloxide::{
    prelude::*,
    types::{InputFile, ParseMode},
    ApiError, RequestError,
};

use numscrape_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{ChatAction, MessagingCapabilities, OutgoingDocument},
    },
    Result,
};

/// Bot API limit on document captions.
const CAPTION_LIMIT: usize = 1024;

/// How often a flood-limited request is re-sent after the advised pause.
const FLOOD_RETRIES: u32 = 1;

/// [`MessagingPort`] over the Telegram Bot API.
#[derive(Clone)]
pub struct BotMessenger {
    bot: Bot,
}

impl BotMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Send a request built by `build`, re-sending it after a 429 pause.
    async fn call<T, R>(
        &self,
        what: &'static str,
        build: impl Fn() -> R,
    ) -> std::result::Result<T, RequestError>
    where
        R: IntoFuture<Output = std::result::Result<T, RequestError>>,
        R::IntoFuture: Send,
    {
        let mut floods = 0;
        loop {
            match build().await {
                Err(RequestError::RetryAfter(pause)) if floods < FLOOD_RETRIES => {
                    floods += 1;
                    tracing::debug!(what, ?pause, "flood limited, waiting");
                    tokio::time::sleep(pause.max(Duration::from_millis(100))).await;
                }
                done => return done,
            }
        }
    }
}

fn failed(what: &'static str, e: RequestError) -> Error {
    Error::External(format!("telegram {what}: {e}"))
}

/// Errors meaning the chat already looks the way the request wanted.
fn already_applied(e: &RequestError) -> bool {
    matches!(
        e,
        RequestError::Api(ApiError::MessageNotModified | ApiError::MessageToDeleteNotFound)
    )
}

fn chat(id: ChatId) -> teloxide::types::ChatId {
    teloxide::types::ChatId(id.0)
}

fn message(id: MessageId) -> teloxide::types::MessageId {
    teloxide::types::MessageId(id.0)
}

fn sent(chat_id: ChatId, msg: &Message) -> MessageRef {
    MessageRef {
        chat_id,
        message_id: MessageId(msg.id.0),
    }
}

#[async_trait]
impl MessagingPort for BotMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            supports_edit: true,
            max_caption_len: CAPTION_LIMIT,
        }
    }

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        let msg = self
            .call("sendMessage", || {
                self.bot
                    .send_message(chat(chat_id), html)
                    .parse_mode(ParseMode::Html)
            })
            .await
            .map_err(|e| failed("sendMessage", e))?;
        Ok(sent(chat_id, &msg))
    }

    async fn edit_html(&self, msg: MessageRef, html: &str) -> Result<()> {
        let res = self.call("editMessageText", || {
            self.bot
                .edit_message_text(chat(msg.chat_id), message(msg.message_id), html)
                .parse_mode(ParseMode::Html)
        })
        .await;
        match res {
            Err(e) if !already_applied(&e) => Err(failed("editMessageText", e)),
            _ => Ok(()),
        }
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        let res = self
            .call("deleteMessage", || {
                self.bot
                    .delete_message(chat(msg.chat_id), message(msg.message_id))
            })
            .await;
        match res {
            Err(e) if !already_applied(&e) => Err(failed("deleteMessage", e)),
            _ => Ok(()),
        }
    }

    async fn send_chat_action(&self, chat_id: ChatId, action: ChatAction) -> Result<()> {
        let action = match action {
            ChatAction::UploadDocument => teloxide::types::ChatAction::UploadDocument,
        };
        self.call("sendChatAction", || {
            self.bot.send_chat_action(chat(chat_id), action)
        })
        .await
        .map(drop)
        .map_err(|e| failed("sendChatAction", e))
    }

    async fn send_document(
        &self,
        chat_id: ChatId,
        document: &OutgoingDocument,
        caption_html: &str,
    ) -> Result<MessageRef> {
        let msg = self
            .call("sendDocument", || {
                let file = InputFile::file(&document.path).file_name(document.file_name.clone());
                self.bot
                    .send_document(chat(chat_id), file)
                    .caption(caption_html)
                    .parse_mode(ParseMode::Html)
            })
            .await
            .map_err(|e| failed("sendDocument", e))?;
        Ok(sent(chat_id, &msg))
    }
}
