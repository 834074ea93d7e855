//! Per-user language selection, in memory only.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::domain::{Language, UserId};

/// Selected language per user. Lost on restart.
#[derive(Debug, Default)]
pub struct SessionState {
    languages: RwLock<HashMap<UserId, Language>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `lang`, replacing any earlier choice.
    pub async fn set_language(&self, user_id: UserId, lang: Language) {
        self.languages.write().await.insert(user_id, lang);
    }

    /// The stored language, or [`Language::DEFAULT`] when the user never chose one.
    pub async fn language(&self, user_id: UserId) -> Language {
        self.languages
            .read()
            .await
            .get(&user_id)
            .copied()
            .unwrap_or(Language::DEFAULT)
    }

    /// Forget the user's session. Returns whether one existed.
    pub async fn clear(&self, user_id: UserId) -> bool {
        self.languages.write().await.remove(&user_id).is_some()
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.languages.read().await.len()
    }

    #[cfg(test)]
    async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
