//! Chat history read through a Telegram user account (MTProto via grammers).
//!
//! Bots cannot call `messages.getHistory`, so this source signs in as a user
//! whose account is a member of the target chat. The session file is created
//! once with `numscrape login` and reused afterwards.

use std::{collections::HashMap, fmt::Display};

use async_trait::async_trait;
use grammers_client::{types::PackedChat, Client, Config as ClientConfig, SignInError};
use grammers_session::Session;
use tokio::sync::{mpsc, Mutex};

use numscrape_core::{
    config::UserSessionConfig,
    domain::{RawMessage, TargetChat},
    errors::Error,
    source::{MessageCursor, MessageSource},
    Result,
};

/// Messages fetched ahead of the scrape job.
const PREFETCH: usize = 100;

/// `-100<id>` is how the Bot API spells channel and supergroup ids.
const CHANNEL_ID_OFFSET: i64 = 1_000_000_000_000;

pub struct UserSessionSource {
    client: Client,
    peers: Mutex<HashMap<String, PackedChat>>,
}

impl UserSessionSource {
    /// Connect with an existing, signed-in session file.
    pub async fn connect(cfg: &UserSessionConfig) -> Result<Self> {
        let client = open_client(cfg).await?;
        if !client.is_authorized().await.map_err(source_err)? {
            return Err(Error::Config(format!(
                "session {} is not signed in; run `numscrape login` first",
                cfg.session_file.display()
            )));
        }
        Ok(Self {
            client,
            peers: Mutex::new(HashMap::new()),
        })
    }

    async fn resolve(&self, chat: &TargetChat) -> Result<PackedChat> {
        let key = chat.to_string();
        let cached = self.peers.lock().await.get(&key).copied();
        if let Some(peer) = cached {
            return Ok(peer);
        }

        let found = match chat {
            TargetChat::Username(name) => self
                .client
                .resolve_username(name)
                .await
                .map_err(source_err)?
                .map(|c| c.pack()),
            TargetChat::Id(id) => {
                let wanted = bare_peer_id(*id);
                let mut dialogs = self.client.iter_dialogs();
                let mut hit = None;
                while let Some(dialog) = dialogs.next().await.map_err(source_err)? {
                    let c = dialog.chat();
                    if c.id() == wanted {
                        hit = Some(c.pack());
                        break;
                    }
                }
                hit
            }
        };

        let peer = found.ok_or_else(|| {
            Error::Source(format!("chat {chat} is not visible to the user session"))
        })?;
        self.peers.lock().await.insert(key, peer);
        Ok(peer)
    }
}

#[async_trait]
impl MessageSource for UserSessionSource {
    fn name(&self) -> &'static str {
        "user-session"
    }

    async fn history(&self, chat: &TargetChat, limit: usize) -> Result<Box<dyn MessageCursor>> {
        let peer = self.resolve(chat).await?;
        let mut iter = self.client.iter_messages(peer).limit(limit);

        // The pager runs in its own task; dropping the cursor closes the
        // channel and stops it at the next send.
        let (tx, rx) = mpsc::channel(PREFETCH);
        tokio::spawn(async move {
            loop {
                let item = match iter.next().await {
                    Ok(Some(message)) => Ok(raw_message(message.text())),
                    Ok(None) => break,
                    Err(e) => Err(source_err(e)),
                };
                let fault = item.is_err();
                if tx.send(item).await.is_err() || fault {
                    break;
                }
            }
        });

        tracing::debug!(%chat, limit, "user session history opened");
        Ok(Box::new(SessionCursor { rx }))
    }
}

struct SessionCursor {
    rx: mpsc::Receiver<Result<RawMessage>>,
}

#[async_trait]
impl MessageCursor for SessionCursor {
    async fn next_message(&mut self) -> Result<Option<RawMessage>> {
        self.rx.recv().await.transpose()
    }
}

/// Interactive sign-in that writes the session file.
///
/// Phone, code and 2FA password come from `TELEGRAM_PHONE`,
/// `TELEGRAM_LOGIN_CODE` and `TELEGRAM_PASSWORD`, or are prompted for.
pub async fn login(cfg: &UserSessionConfig) -> Result<()> {
    let client = open_client(cfg).await?;
    if client.is_authorized().await.map_err(source_err)? {
        tracing::info!(session = %cfg.session_file.display(), "already signed in");
        return Ok(());
    }

    let phone = match &cfg.phone {
        Some(phone) => phone.clone(),
        None => read_env_or_prompt("TELEGRAM_PHONE", "Phone number")?,
    };
    let token = client
        .request_login_code(&phone)
        .await
        .map_err(source_err)?;
    let code = read_env_or_prompt("TELEGRAM_LOGIN_CODE", "Login code")?;

    match client.sign_in(&token, &code).await {
        Ok(_) => {}
        Err(SignInError::PasswordRequired(password_token)) => {
            let password = read_env_or_prompt("TELEGRAM_PASSWORD", "2FA password")?;
            client
                .check_password(password_token, password.as_bytes())
                .await
                .map_err(source_err)?;
        }
        Err(e) => return Err(source_err(e)),
    }

    client.session().save_to_file(&cfg.session_file)?;
    tracing::info!(session = %cfg.session_file.display(), "signed in");
    Ok(())
}

async fn open_client(cfg: &UserSessionConfig) -> Result<Client> {
    let path = cfg.session_file.as_path();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let session = if path.exists() {
        Session::load_file(path)
            .map_err(|e| Error::Config(format!("cannot load session {}: {e}", path.display())))?
    } else {
        Session::new()
    };

    Client::connect(ClientConfig {
        session,
        api_id: cfg.api_id,
        api_hash: cfg.api_hash.clone(),
        params: Default::default(),
    })
    .await
    .map_err(source_err)
}

fn read_env_or_prompt(key: &str, prompt: &str) -> Result<String> {
    if let Some(value) = std::env::var(key).ok().filter(|v| !v.trim().is_empty()) {
        return Ok(value.trim().to_string());
    }
    eprint!("{prompt}: ");
    let mut buf = String::new();
    std::io::stdin().read_line(&mut buf)?;
    let value = buf.trim();
    if value.is_empty() {
        return Err(Error::Config(format!("{key} is not set and nothing was entered")));
    }
    Ok(value.to_string())
}

fn source_err(e: impl Display) -> Error {
    Error::Source(format!("telegram user session: {e}"))
}

/// Media without a caption and service messages carry no text.
fn raw_message(text: &str) -> RawMessage {
    if text.is_empty() {
        RawMessage::empty()
    } else {
        RawMessage::text(text)
    }
}

/// MTProto dialogs carry bare ids; the Bot API prefixes groups with `-` and
/// channels/supergroups with `-100`.
fn bare_peer_id(bot_api_id: i64) -> i64 {
    if bot_api_id <= -CHANNEL_ID_OFFSET {
        -bot_api_id - CHANNEL_ID_OFFSET
    } else {
        bot_api_id.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bot_api_ids_map_to_bare_peer_ids() {
        assert_eq!(bare_peer_id(-1001234567890), 1234567890);
        assert_eq!(bare_peer_id(-4012345), 4012345);
        assert_eq!(bare_peer_id(777000), 777000);
    }

    #[test]
    fn empty_text_is_no_text() {
        assert_eq!(raw_message(""), RawMessage::empty());
        assert_eq!(raw_message("SIM1: 9876543210"), RawMessage::text("SIM1: 9876543210"));
    }

    #[tokio::test]
    async fn cursor_surfaces_pager_faults_then_ends() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(Ok(RawMessage::text("a"))).await.unwrap();
        tx.send(Err(source_err("FLOOD_WAIT"))).await.unwrap();
        drop(tx);

        let mut cursor = SessionCursor { rx };
        assert_eq!(
            cursor.next_message().await.unwrap(),
            Some(RawMessage::text("a"))
        );
        assert!(matches!(cursor.next_message().await, Err(Error::Source(_))));
        assert_eq!(cursor.next_message().await.unwrap(), None);
    }
}
