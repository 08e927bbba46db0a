//! Outbound call pacing.
//!
//! A long scrape edits its status message every few hundred milliseconds while
//! other chats may be running their own jobs. Telegram answers bursts with 429s,
//! so every outbound call first books a slot that honours both a bot-wide gap
//! and a per-chat gap.

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use tokio::{
    sync::Mutex,
    time::{sleep, Instant},
};

use crate::{
    domain::{ChatId, MessageRef},
    messaging::{
        port::MessagingPort,
        types::{ChatAction, MessagingCapabilities, OutgoingDocument},
    },
    Result,
};

/// Chats idle for longer than this are forgotten when the table is pruned.
const PRUNE_AFTER: Duration = Duration::from_secs(60);
const PRUNE_THRESHOLD: usize = 256;

/// Minimum gaps between outbound calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pacing {
    pub bot_gap: Duration,
    pub chat_gap: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        // Bot API guidance: ~30 calls/s overall, ~1 message/s per chat.
        Self {
            bot_gap: Duration::from_millis(40),
            chat_gap: Duration::from_millis(1050),
        }
    }
}

/// Earliest free instants, bot-wide and per chat.
#[derive(Debug)]
struct Schedule {
    pacing: Pacing,
    bot_free_at: Option<Instant>,
    chat_free_at: HashMap<ChatId, Instant>,
}

impl Schedule {
    fn new(pacing: Pacing) -> Self {
        Self {
            pacing,
            bot_free_at: None,
            chat_free_at: HashMap::new(),
        }
    }

    /// Book the first instant at or after `now` that satisfies both gaps and
    /// return how long the caller has to wait for it.
    fn book(&mut self, chat: ChatId, now: Instant) -> Duration {
        if self.chat_free_at.len() > PRUNE_THRESHOLD {
            self.chat_free_at
                .retain(|_, free_at| *free_at + PRUNE_AFTER > now);
        }

        let mut slot = now;
        if let Some(free_at) = self.bot_free_at {
            slot = slot.max(free_at);
        }
        if let Some(&free_at) = self.chat_free_at.get(&chat) {
            slot = slot.max(free_at);
        }

        self.bot_free_at = Some(slot + self.pacing.bot_gap);
        self.chat_free_at.insert(chat, slot + self.pacing.chat_gap);
        slot - now
    }
}

/// [`MessagingPort`] decorator that waits for a booked slot before delegating.
pub struct PacedMessenger {
    inner: Arc<dyn MessagingPort>,
    schedule: Mutex<Schedule>,
}

impl PacedMessenger {
    pub fn new(inner: Arc<dyn MessagingPort>, pacing: Pacing) -> Self {
        Self {
            inner,
            schedule: Mutex::new(Schedule::new(pacing)),
        }
    }

    async fn wait_turn(&self, chat: ChatId) {
        let wait = self.schedule.lock().await.book(chat, Instant::now());
        if !wait.is_zero() {
            tracing::trace!(chat = chat.0, ?wait, "pacing outbound call");
            sleep(wait).await;
        }
    }
}

#[async_trait]
impl MessagingPort for PacedMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        self.inner.capabilities()
    }

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef> {
        self.wait_turn(chat_id).await;
        self.inner.send_html(chat_id, html).await
    }

    async fn edit_html(&self, msg: MessageRef, html: &str) -> Result<()> {
        self.wait_turn(msg.chat_id).await;
        self.inner.edit_html(msg, html).await
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.wait_turn(msg.chat_id).await;
        self.inner.delete_message(msg).await
    }

    async fn send_chat_action(&self, chat_id: ChatId, action: ChatAction) -> Result<()> {
        self.wait_turn(chat_id).await;
        self.inner.send_chat_action(chat_id, action).await
    }

    async fn send_document(
        &self,
        chat_id: ChatId,
        document: &OutgoingDocument,
        caption_html: &str,
    ) -> Result<MessageRef> {
        self.wait_turn(chat_id).await;
        self.inner
            .send_document(chat_id, document, caption_html)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn schedule() -> Schedule {
        Schedule::new(Pacing {
            bot_gap: ms(40),
            chat_gap: ms(1000),
        })
    }

    #[tokio::test]
    async fn same_chat_waits_for_the_chat_gap() {
        let mut s = schedule();
        let t0 = Instant::now();
        assert_eq!(s.book(ChatId(1), t0), Duration::ZERO);
        assert_eq!(s.book(ChatId(1), t0), ms(1000));
        assert_eq!(s.book(ChatId(1), t0 + ms(500)), ms(1500));
    }

    #[tokio::test]
    async fn other_chats_only_wait_for_the_bot_gap() {
        let mut s = schedule();
        let t0 = Instant::now();
        assert_eq!(s.book(ChatId(1), t0), Duration::ZERO);
        assert_eq!(s.book(ChatId(2), t0), ms(40));
        assert_eq!(s.book(ChatId(3), t0), ms(80));
        // Once the gaps have passed nobody waits.
        assert_eq!(s.book(ChatId(2), t0 + ms(5000)), Duration::ZERO);
    }

    #[tokio::test]
    async fn idle_chats_are_pruned() {
        let mut s = schedule();
        let t0 = Instant::now();
        for id in 0..=PRUNE_THRESHOLD as i64 {
            s.book(ChatId(id), t0);
        }
        assert_eq!(s.chat_free_at.len(), PRUNE_THRESHOLD + 1);

        let later = t0 + ms(1000) * (PRUNE_THRESHOLD as u32) + PRUNE_AFTER * 2;
        s.book(ChatId(-1), later);
        assert_eq!(s.chat_free_at.len(), 1);
    }
}
