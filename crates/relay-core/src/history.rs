//! Append-only chat history, persisted as one pretty-printed JSON object:
//! `{ "<user id>": [ { "from": "user", "type": "text", "timestamp": <ms> }, ... ] }`.

use std::{
    collections::BTreeMap,
    ffi::OsString,
    path::{Path, PathBuf},
};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
    domain::{Direction, MessageKind, UserId},
    Result,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub from: Direction,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Unix epoch, milliseconds.
    pub timestamp: i64,
}

impl HistoryRecord {
    /// A user-originated event stamped with the current time.
    pub fn from_user(kind: MessageKind) -> Self {
        Self {
            from: Direction::User,
            kind,
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

type HistoryMap = BTreeMap<i64, Vec<HistoryRecord>>;

/// File-backed history store.
///
/// Appends are serialized through one lock and each persist replaces the file
/// atomically (sibling temp file + rename), so a crash never leaves a torn file.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    entries: Mutex<HistoryMap>,
}

impl HistoryStore {
    /// Load the store from `path`.
    ///
    /// A missing or empty file yields an empty store. A file that exists but
    /// does not parse is an error: callers treat it as fatal at startup.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let entries = if path.exists() {
            let txt = std::fs::read_to_string(&path)?;
            if txt.trim().is_empty() {
                HistoryMap::new()
            } else {
                serde_json::from_str(&txt)?
            }
        } else {
            HistoryMap::new()
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `record` to the user's history and persist the whole mapping.
    ///
    /// On a failed persist the record is dropped from memory as well, so the
    /// in-memory view never runs ahead of the file.
    pub async fn append(&self, user_id: UserId, record: HistoryRecord) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.entry(user_id.0).or_default().push(record);

        // Write while still holding the lock so an older snapshot never lands last.
        if let Err(e) = persist(&self.path, &entries).await {
            if let Some(list) = entries.get_mut(&user_id.0) {
                list.pop();
                if list.is_empty() {
                    entries.remove(&user_id.0);
                }
            }
            return Err(e);
        }
        Ok(())
    }

    /// The user's records in append order.
    pub async fn records(&self, user_id: UserId) -> Vec<HistoryRecord> {
        self.entries
            .lock()
            .await
            .get(&user_id.0)
            .cloned()
            .unwrap_or_default()
    }

    /// Number of users with at least one record.
    pub async fn len_users(&self) -> usize {
        self.entries.lock().await.len()
    }
}

async fn persist(path: &Path, entries: &HistoryMap) -> Result<()> {
    let txt = serde_json::to_string_pretty(entries)?;
    let tmp = tmp_path(path);
    if let Err(e) = tokio::fs::write(&tmp, txt).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e.into());
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut s: OsString = path.as_os_str().to_owned();
    s.push(".tmp");
    PathBuf::from(s)
}
