use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{domain::TargetChat, errors::Error, job::ScrapeSettings, Result};

pub const DEFAULT_SCRAPE_LIMIT: usize = 1000;
const DEFAULT_PROGRESS_EVERY: usize = 100;
const DEFAULT_HISTORY_CAPACITY: usize = 10_000;
const DEFAULT_SESSION_FILE: &str = "numscrape.session";

/// MTProto user account used to read chat history the Bot API cannot reach.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserSessionConfig {
    pub api_id: i32,
    pub api_hash: String,
    pub session_file: PathBuf,
    /// Only needed to sign in; a signed-in session file is enough afterwards.
    pub phone: Option<String>,
}

/// Typed configuration, loaded once at startup and shared read-only.
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram
    pub telegram_bot_token: String,
    pub telegram_allowed_users: Vec<i64>,

    // Scraping
    pub target_chat: TargetChat,
    pub default_scrape_limit: usize,
    pub progress_every: usize,

    // History source
    pub history_export_path: Option<PathBuf>,
    pub user_session: Option<UserSessionConfig>,
    pub history_capacity: usize,

    // Output
    pub temp_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (env in production, maps in tests).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN")
            .or_else(|| get("BOT_TOKEN"))
            .and_then(non_empty)
            .ok_or_else(|| {
                Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
            })?;
        let telegram_allowed_users = parse_csv_i64(get("TELEGRAM_ALLOWED_USERS"));

        let target_chat = get("TARGET_GROUP")
            .as_deref()
            .and_then(TargetChat::parse)
            .ok_or_else(|| {
                Error::Config(
                    "TARGET_GROUP environment variable is required (chat id or @username)"
                        .to_string(),
                )
            })?;

        let default_scrape_limit = parse_usize(get("SCRAPE_DEFAULT_LIMIT"))
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_SCRAPE_LIMIT);
        let progress_every =
            parse_usize(get("SCRAPE_PROGRESS_EVERY")).unwrap_or(DEFAULT_PROGRESS_EVERY);

        let history_export_path = get("HISTORY_EXPORT_PATH")
            .and_then(non_empty)
            .map(PathBuf::from);
        let user_session = user_session_from_lookup(&get)?;
        let history_capacity = parse_usize(get("HISTORY_CAPACITY"))
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_HISTORY_CAPACITY);

        let temp_dir = PathBuf::from(
            get("TEMP_DIR")
                .and_then(non_empty)
                .unwrap_or_else(|| "/tmp/numscrape".to_string()),
        );

        Ok(Self {
            telegram_bot_token,
            telegram_allowed_users,
            target_chat,
            default_scrape_limit,
            progress_every,
            history_export_path,
            user_session,
            history_capacity,
            temp_dir,
        })
    }

    /// Immutable settings handed to each scrape job.
    pub fn scrape_settings(&self) -> ScrapeSettings {
        ScrapeSettings {
            target: self.target_chat.clone(),
            progress_every: self.progress_every,
        }
    }

    /// Make sure the output directory exists.
    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.temp_dir)?;
        Ok(())
    }
}

fn user_session_from_lookup(
    get: &impl Fn(&str) -> Option<String>,
) -> Result<Option<UserSessionConfig>> {
    let api_id = get("TELEGRAM_API_ID")
        .or_else(|| get("API_ID"))
        .and_then(non_empty);
    let api_hash = get("TELEGRAM_API_HASH")
        .or_else(|| get("API_HASH"))
        .and_then(non_empty);

    let (api_id, api_hash) = match (api_id, api_hash) {
        (None, None) => return Ok(None),
        (Some(id), Some(hash)) => (id, hash),
        _ => {
            return Err(Error::Config(
                "TELEGRAM_API_ID and TELEGRAM_API_HASH must be set together".to_string(),
            ))
        }
    };
    let api_id = api_id
        .trim()
        .parse::<i32>()
        .map_err(|_| Error::Config(format!("TELEGRAM_API_ID is not a number: {api_id}")))?;

    Ok(Some(UserSessionConfig {
        api_id,
        api_hash: api_hash.trim().to_string(),
        session_file: PathBuf::from(
            get("TELEGRAM_SESSION_FILE")
                .and_then(non_empty)
                .unwrap_or_else(|| DEFAULT_SESSION_FILE.to_string()),
        ),
        phone: get("TELEGRAM_PHONE").and_then(non_empty),
    }))
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim().trim_start_matches("export ").trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn parse_usize(v: Option<String>) -> Option<usize> {
    v.and_then(|s| s.trim().parse::<usize>().ok())
}

fn parse_csv_i64(v: Option<String>) -> Vec<i64> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<i64>().ok())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
