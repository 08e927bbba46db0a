use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef},
    messaging::types::{ChatAction, MessagingCapabilities, OutgoingDocument},
    Result,
};

/// Outbound messenger port.
///
/// Covers what a scrape job needs from the chat it was started in: a status
/// line that can be updated and removed, and a document upload.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<MessageRef>;
    async fn edit_html(&self, msg: MessageRef, html: &str) -> Result<()>;
    async fn delete_message(&self, msg: MessageRef) -> Result<()>;

    async fn send_chat_action(&self, chat_id: ChatId, action: ChatAction) -> Result<()>;

    async fn send_document(
        &self,
        chat_id: ChatId,
        document: &OutgoingDocument,
        caption_html: &str,
    ) -> Result<MessageRef>;
}
