//! Output sink: where a scrape job reports status and delivers its results.

use std::{path::PathBuf, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::{
    domain::{ChatId, MessageRef},
    errors::Error,
    extract::Candidate,
    formatting::truncate_chars,
    messaging::{
        port::MessagingPort,
        types::{ChatAction, OutgoingDocument},
    },
    output::write_output_file,
    Result,
};

/// Port for reporting job progress and delivering the final file.
#[async_trait]
pub trait OutputSink: Send + Sync {
    /// Send or update the requester-visible status line.
    async fn status(&self, html: &str) -> Result<()>;

    /// Persist `candidates` as a newline-delimited file named `file_name`,
    /// hand it to the requester, then remove it from disk.
    async fn deliver(&self, file_name: &str, candidates: &[Candidate], caption_html: &str)
        -> Result<()>;
}

/// Sink that talks to the chat a command was issued in.
///
/// Keeps a single status message per job: the first status is sent, later ones
/// edit it, and it is deleted once the file has been uploaded.
pub struct ChatDelivery {
    messenger: Arc<dyn MessagingPort>,
    chat_id: ChatId,
    temp_dir: PathBuf,
    status_msg: Mutex<Option<MessageRef>>,
}

impl ChatDelivery {
    pub fn new(messenger: Arc<dyn MessagingPort>, chat_id: ChatId, temp_dir: PathBuf) -> Self {
        Self {
            messenger,
            chat_id,
            temp_dir,
            status_msg: Mutex::new(None),
        }
    }
}

#[async_trait]
impl OutputSink for ChatDelivery {
    async fn status(&self, html: &str) -> Result<()> {
        let mut current = self.status_msg.lock().await;
        match *current {
            Some(msg) if self.messenger.capabilities().supports_edit => {
                self.messenger.edit_html(msg, html).await
            }
            _ => {
                let msg = self.messenger.send_html(self.chat_id, html).await?;
                *current = Some(msg);
                Ok(())
            }
        }
    }

    async fn deliver(
        &self,
        file_name: &str,
        candidates: &[Candidate],
        caption_html: &str,
    ) -> Result<()> {
        let file = write_output_file(&self.temp_dir, file_name, candidates).await?;

        let _ = self
            .messenger
            .send_chat_action(self.chat_id, ChatAction::UploadDocument)
            .await;

        let document = OutgoingDocument {
            path: file.path().to_path_buf(),
            file_name: file.file_name().to_string(),
        };
        let caption = truncate_chars(caption_html, self.messenger.capabilities().max_caption_len);
        self.messenger
            .send_document(self.chat_id, &document, &caption)
            .await
            .map_err(|e| Error::Delivery(format!("upload of {file_name} failed: {e}")))?;
        drop(file);

        if let Some(msg) = self.status_msg.lock().await.take() {
            if let Err(e) = self.messenger.delete_message(msg).await {
                tracing::debug!("failed to delete status message: {e}");
            }
        }
        Ok(())
    }
}
