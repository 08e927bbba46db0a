use std::fmt;

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// The chat whose history gets scraped.
///
/// Configured either as a numeric id or as a public username.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TargetChat {
    Id(i64),
    Username(String),
}

impl TargetChat {
    /// Numeric ids win; anything else is a username (leading `@` optional).
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Ok(id) = raw.parse::<i64>() {
            return Some(Self::Id(id));
        }
        let name = raw.trim_start_matches('@');
        if name.is_empty() {
            return None;
        }
        Some(Self::Username(name.to_string()))
    }

    /// Does a chat seen on the wire refer to this target?
    pub fn matches(&self, chat_id: i64, username: Option<&str>) -> bool {
        match self {
            Self::Id(id) => *id == chat_id,
            Self::Username(name) => {
                username.is_some_and(|u| u.trim_start_matches('@').eq_ignore_ascii_case(name))
            }
        }
    }
}

impl fmt::Display for TargetChat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Username(name) => write!(f, "@{name}"),
        }
    }
}

/// Classification policy for a scrape job.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Messages carrying a "Not Found" annotation; the whole message is scanned.
    NotFound,
    /// SIM data lines without a "Not Found" annotation; scanned per line.
    Found,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Found => "found",
        }
    }

    /// Name of the file delivered to the requester.
    pub fn output_file_name(self) -> String {
        format!("{}_data.txt", self.as_str())
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One historical message as handed over by a message source.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawMessage {
    pub text: Option<String>,
}

impl RawMessage {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }

    pub fn empty() -> Self {
        Self { text: None }
    }
}
