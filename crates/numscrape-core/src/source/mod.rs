//! Message history sources.
//!
//! A source hands out a cursor over the newest `limit` messages of a chat. The
//! cursor is lazy and single-pass; a fault on any step aborts the scrape.

use async_trait::async_trait;

use crate::{
    domain::{RawMessage, TargetChat},
    Result,
};

pub mod export;
pub mod live;

/// Port for reading chat history, newest message first.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Short label for logs (e.g. "live", "export").
    fn name(&self) -> &'static str;

    async fn history(&self, chat: &TargetChat, limit: usize) -> Result<Box<dyn MessageCursor>>;
}

/// Single-pass iterator over historical messages.
#[async_trait]
pub trait MessageCursor: Send {
    /// `Ok(None)` once the history (or the requested limit) is exhausted.
    async fn next_message(&mut self) -> Result<Option<RawMessage>>;
}

/// Cursor over an already materialized snapshot.
pub struct SnapshotCursor {
    inner: std::vec::IntoIter<RawMessage>,
}

impl SnapshotCursor {
    pub fn new(messages: Vec<RawMessage>) -> Self {
        Self {
            inner: messages.into_iter(),
        }
    }
}

#[async_trait]
impl MessageCursor for SnapshotCursor {
    async fn next_message(&mut self) -> Result<Option<RawMessage>> {
        Ok(self.inner.next())
    }
}
