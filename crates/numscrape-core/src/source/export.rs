use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;

use crate::{
    domain::{RawMessage, TargetChat},
    errors::Error,
    source::{MessageCursor, MessageSource, SnapshotCursor},
    Result,
};

/// History read from a Telegram Desktop chat export (`result.json`).
///
/// The file is re-read on every request so a fresh export can be dropped in
/// without restarting the bot.
pub struct ExportSource {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct ExportFile {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    messages: Vec<ExportMessage>,
}

#[derive(Debug, Deserialize)]
struct ExportMessage {
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<ExportText>,
}

/// Exports store plain messages as a string and formatted ones as a list of
/// strings and entity objects.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExportText {
    Plain(String),
    Rich(Vec<ExportTextPart>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExportTextPart {
    Plain(String),
    Entity { text: String },
}

impl ExportText {
    fn flatten(self) -> String {
        match self {
            Self::Plain(s) => s,
            Self::Rich(parts) => parts
                .into_iter()
                .map(|p| match p {
                    ExportTextPart::Plain(s) | ExportTextPart::Entity { text: s } => s,
                })
                .collect(),
        }
    }
}

impl ExportSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Parse an export into newest-first messages, keeping at most `limit`.
fn parse_export(raw: &str, limit: usize) -> Result<(Option<String>, Vec<RawMessage>)> {
    let export: ExportFile = serde_json::from_str(raw)?;
    let messages = export
        .messages
        .into_iter()
        .rev()
        .filter(|m| m.kind == "message")
        .take(limit)
        .map(|m| RawMessage {
            text: m
                .text
                .map(ExportText::flatten)
                .filter(|t| !t.is_empty()),
        })
        .collect();
    Ok((export.name, messages))
}

#[async_trait]
impl MessageSource for ExportSource {
    fn name(&self) -> &'static str {
        "export"
    }

    async fn history(&self, chat: &TargetChat, limit: usize) -> Result<Box<dyn MessageCursor>> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            Error::Source(format!(
                "cannot read history export {}: {e}",
                self.path.display()
            ))
        })?;

        let (name, messages) = parse_export(&raw, limit).map_err(|e| {
            Error::Source(format!(
                "invalid history export {}: {e}",
                self.path.display()
            ))
        })?;

        tracing::debug!(
            target_chat = %chat,
            export_chat = name.as_deref().unwrap_or("?"),
            count = messages.len(),
            "loaded history export"
        );
        Ok(Box::new(SnapshotCursor::new(messages)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = r#"{
        "name": "SIM Lookup",
        "type": "private_supergroup",
        "id": 1234567890,
        "messages": [
            {"id": 1, "type": "message", "text": "SIM1: 9876543210"},
            {"id": 2, "type": "service", "action": "pin_message", "text": ""},
            {"id": 3, "type": "message", "text": [
                "Customer ",
                {"type": "bold", "text": "Not Found"},
                ". Backup: ",
                {"type": "phone", "text": "919876543210"}
            ]},
            {"id": 4, "type": "message", "photo": "photos/p.jpg", "text": ""}
        ]
    }"#;

    #[test]
    fn parses_newest_first_and_flattens_rich_text() {
        let (name, msgs) = parse_export(EXPORT, 100).unwrap();
        assert_eq!(name.as_deref(), Some("SIM Lookup"));
        assert_eq!(
            msgs,
            vec![
                RawMessage::empty(),
                RawMessage::text("Customer Not Found. Backup: 919876543210"),
                RawMessage::text("SIM1: 9876543210"),
            ]
        );
    }

    #[test]
    fn respects_limit() {
        let (_, msgs) = parse_export(EXPORT, 2).unwrap();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0], RawMessage::empty());
    }

    #[tokio::test]
    async fn missing_or_broken_file_is_a_source_fault() {
        let dir = std::env::temp_dir().join(format!("numscrape-export-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let missing = ExportSource::new(dir.join("missing.json"));
        let err = missing.history(&TargetChat::Id(1), 10).await.err().unwrap();
        assert!(matches!(err, Error::Source(_)));

        let broken_path = dir.join("broken.json");
        std::fs::write(&broken_path, "{ not json").unwrap();
        let broken = ExportSource::new(&broken_path);
        let err = broken.history(&TargetChat::Id(1), 10).await.err().unwrap();
        assert!(matches!(err, Error::Source(_)));

        let ok_path = dir.join("result.json");
        std::fs::write(&ok_path, EXPORT).unwrap();
        let mut cursor = ExportSource::new(&ok_path)
            .history(&TargetChat::Id(1), 10)
            .await
            .unwrap();
        let mut n = 0;
        while cursor.next_message().await.unwrap().is_some() {
            n += 1;
        }
        assert_eq!(n, 3);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
