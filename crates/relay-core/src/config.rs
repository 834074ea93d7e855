use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{domain::ChatId, errors::Error, Result};

/// Lower bound for `TELEGRAM_MESSAGE_LIMIT`; the fixed lines of a staff-group
/// envelope plus a short name fit well within it.
pub const MIN_MESSAGE_LIMIT: usize = 256;

/// Typed configuration for the relay bot.
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub bot_token: String,
    pub manager_group_id: ChatId,

    // Storage
    pub chat_history_file: PathBuf,
    pub reply_index_capacity: usize,

    // Outbound delivery
    pub send_max_retries: usize,
    pub send_retry_base: Duration,
    pub throttle_enabled: bool,
    pub telegram_message_limit: usize,
}

impl Config {
    /// Load from the process environment (after merging `.env` if present).
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bot_token = get("BOT_TOKEN").and_then(non_empty).ok_or_else(|| {
            Error::Config("BOT_TOKEN environment variable is required".to_string())
        })?;

        let raw_group = get("MANAGER_GROUP_ID").and_then(non_empty).ok_or_else(|| {
            Error::Config("MANAGER_GROUP_ID environment variable is required".to_string())
        })?;
        let manager_group_id = raw_group.trim().parse::<i64>().map(ChatId).map_err(|_| {
            Error::Config(format!(
                "MANAGER_GROUP_ID must be an integer chat id, got {raw_group:?}"
            ))
        })?;

        let chat_history_file = get("CHAT_HISTORY_FILE")
            .and_then(non_empty)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./chat_history.json"));
        let reply_index_capacity = parse_num(&get, "REPLY_INDEX_CAPACITY")
            .unwrap_or(10_000)
            .max(1);

        let send_max_retries = parse_num(&get, "SEND_MAX_RETRIES").unwrap_or(2);
        let send_retry_base =
            Duration::from_millis(parse_num(&get, "SEND_RETRY_BASE_MS").unwrap_or(500));
        let throttle_enabled = parse_bool(&get, "THROTTLE_ENABLED").unwrap_or(true);
        let telegram_message_limit = parse_num(&get, "TELEGRAM_MESSAGE_LIMIT")
            .unwrap_or(4096)
            .max(MIN_MESSAGE_LIMIT);

        Ok(Self {
            bot_token,
            manager_group_id,
            chat_history_file,
            reply_index_capacity,
            send_max_retries,
            send_retry_base,
            throttle_enabled,
            telegram_message_limit,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let Some((key, val)) = parse_dotenv_line(raw) else {
            continue;
        };
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv_line(raw: &str) -> Option<(String, String)> {
    let line = raw.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let (k, v) = line.split_once('=')?;
    let key = k.trim().trim_start_matches("export ").trim();
    if key.is_empty() {
        return None;
    }

    let mut val = v.trim().to_string();
    // Strip optional surrounding quotes.
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        val = val[1..val.len() - 1].to_string();
    }

    Some((key.to_string(), val))
}

fn parse_bool(get: &impl Fn(&str) -> Option<String>, key: &str) -> Option<bool> {
    get(key).map(|s| {
        matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn parse_num<T: std::str::FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    get(key).and_then(|s| s.trim().parse::<T>().ok())
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
