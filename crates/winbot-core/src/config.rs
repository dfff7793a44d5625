use std::{
    env, fs,
    path::{Path, PathBuf},
};

use chrono_tz::Tz;

use crate::{domain::ChatId, errors::Error, Result};

pub const DEFAULT_CHANNEL_ID: i64 = -1001800748026;
pub const DEFAULT_CHANNEL_URL: &str = "https://t.me/ezovinua";
pub const DEFAULT_TIMEZONE: &str = "Europe/Kyiv";
pub const DEFAULT_PORT: u16 = 10000;

/// Typed configuration, loaded once at startup and shared read-only.
#[derive(Clone, Debug)]
pub struct Config {
    // Telegram
    pub telegram_token: String,
    pub channel_id: ChatId,
    pub channel_url: Option<String>,
    pub drop_pending_updates: bool,

    // Content + persistence
    pub photo_folder: PathBuf,
    pub db_path: PathBuf,
    pub timezone: Tz,

    // Liveness
    pub port: u16,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    ///
    /// `load()` feeds this from the process environment; tests feed it a map.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_token = lookup("TELEGRAM_TOKEN")
            .and_then(non_empty)
            .or_else(|| lookup("TELEGRAM_BOT_TOKEN").and_then(non_empty))
            .ok_or_else(|| {
                Error::Config("TELEGRAM_TOKEN environment variable is required".to_string())
            })?;

        let channel_id = ChatId(
            lookup("CHANNEL_ID")
                .and_then(|s| s.trim().parse::<i64>().ok())
                .unwrap_or(DEFAULT_CHANNEL_ID),
        );

        // An explicitly empty CHANNEL_URL disables the "open channel" button.
        let channel_url = match lookup("CHANNEL_URL") {
            Some(v) => non_empty(v.trim().to_string()),
            None => Some(DEFAULT_CHANNEL_URL.to_string()),
        };

        let drop_pending_updates = lookup("DROP_PENDING_UPDATES")
            .map(|s| parse_bool(&s))
            .unwrap_or(true);

        let photo_folder = lookup("PHOTO_FOLDER")
            .and_then(non_empty)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("photos"));
        let db_path = lookup("DB_PATH")
            .and_then(non_empty)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("bot.db"));

        let tz_name = lookup("BOT_TIMEZONE")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
        let timezone = tz_name
            .trim()
            .parse::<Tz>()
            .map_err(|e| Error::Config(format!("BOT_TIMEZONE {tz_name:?} is invalid: {e}")))?;

        let port = lookup("PORT")
            .and_then(|s| s.trim().parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        Ok(Self {
            telegram_token,
            channel_id,
            channel_url,
            drop_pending_updates,
            photo_folder,
            db_path,
            timezone,
            port,
        })
    }

    /// Replace the bot token in `s` so error details can be shown to users.
    pub fn redact(&self, s: &str) -> String {
        if self.telegram_token.is_empty() {
            return s.to_string();
        }
        s.replace(&self.telegram_token, "<redacted>")
    }
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

        let key = k.trim();
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

fn parse_bool(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
