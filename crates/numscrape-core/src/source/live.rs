use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{RawMessage, TargetChat},
    errors::Error,
    source::{MessageCursor, MessageSource, SnapshotCursor},
    Result,
};

/// History recorded from live updates of the target chat.
///
/// The Bot API has no "read chat history" call, so the adapter feeds every
/// message it sees in the target chat into this bounded buffer. The oldest
/// entries are evicted once `capacity` is reached.
///
/// Only messages delivered to the running process are seen: nothing sent
/// before startup, and in groups nothing but commands unless the bot's
/// privacy mode is disabled (or the bot is an admin).
pub struct LiveHistory {
    target: TargetChat,
    capacity: usize,
    buf: Mutex<VecDeque<RawMessage>>,
}

impl LiveHistory {
    pub fn new(target: TargetChat, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            target,
            capacity,
            buf: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
        }
    }

    /// Record a message if it belongs to the target chat. Returns whether it was kept.
    pub async fn record(&self, chat_id: i64, username: Option<&str>, text: Option<&str>) -> bool {
        if !self.target.matches(chat_id, username) {
            return false;
        }

        let mut buf = self.buf.lock().await;
        if buf.len() == self.capacity {
            buf.pop_front();
        }
        buf.push_back(RawMessage {
            text: text.map(str::to_string),
        });
        true
    }
}

#[async_trait]
impl MessageSource for LiveHistory {
    fn name(&self) -> &'static str {
        "live"
    }

    async fn history(&self, chat: &TargetChat, limit: usize) -> Result<Box<dyn MessageCursor>> {
        if chat != &self.target {
            return Err(Error::Source(format!(
                "chat {chat} is not being recorded (recording {})",
                self.target
            )));
        }

        let snapshot: Vec<RawMessage> = {
            let buf = self.buf.lock().await;
            if buf.is_empty() {
                return Err(Error::Source(format!(
                    "no messages from {chat} recorded since startup; \
                     the bot needs group privacy mode disabled to see them"
                )));
            }
            buf.iter().rev().take(limit).cloned().collect()
        };
        Ok(Box::new(SnapshotCursor::new(snapshot)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn drain(mut cursor: Box<dyn MessageCursor>) -> Vec<Option<String>> {
        let mut out = Vec::new();
        while let Some(m) = cursor.next_message().await.unwrap() {
            out.push(m.text);
        }
        out
    }

    #[tokio::test]
    async fn records_only_target_chat_and_serves_newest_first() {
        let target = TargetChat::Id(-100);
        let live = LiveHistory::new(target.clone(), 10);

        assert!(live.record(-100, None, Some("first")).await);
        assert!(!live.record(7, None, Some("elsewhere")).await);
        assert!(live.record(-100, None, None).await);
        assert!(live.record(-100, None, Some("third")).await);

        let got = drain(live.history(&target, 10).await.unwrap()).await;
        assert_eq!(
            got,
            vec![Some("third".to_string()), None, Some("first".to_string())]
        );

        let got = drain(live.history(&target, 1).await.unwrap()).await;
        assert_eq!(got, vec![Some("third".to_string())]);
    }

    #[tokio::test]
    async fn evicts_oldest_beyond_capacity() {
        let target = TargetChat::Username("group".to_string());
        let live = LiveHistory::new(target.clone(), 2);
        for text in ["a", "b", "c"] {
            live.record(1, Some("Group"), Some(text)).await;
        }

        let got = drain(live.history(&target, 100).await.unwrap()).await;
        assert_eq!(got, vec![Some("c".to_string()), Some("b".to_string())]);
    }

    #[tokio::test]
    async fn other_chats_are_a_source_fault() {
        let live = LiveHistory::new(TargetChat::Id(1), 2);
        let err = live.history(&TargetChat::Id(2), 10).await.err().unwrap();
        assert!(matches!(err, Error::Source(_)));
    }

    #[tokio::test]
    async fn nothing_recorded_is_a_source_fault() {
        let target = TargetChat::Id(-100);
        let live = LiveHistory::new(target.clone(), 10);
        let err = live.history(&target, 10).await.err().unwrap();
        match err {
            Error::Source(reason) => assert!(reason.contains("privacy mode")),
            other => panic!("unexpected error: {other:?}"),
        }

        // Messages from other chats do not count.
        live.record(5, None, Some("elsewhere")).await;
        assert!(live.history(&target, 10).await.is_err());

        live.record(-100, None, Some("hello")).await;
        assert!(live.history(&target, 10).await.is_ok());
    }
}
