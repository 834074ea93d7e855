//! Recovering which user a staff reply is meant for.
//!
//! Every message the bot posts to the staff group carries the line
//! `🆔 ID користувача: <id>`. The [`ReplyIndex`] maps those posted messages to
//! their user directly; text extraction is the fallback for messages posted
//! before the last restart.

use std::{
    collections::{HashMap, VecDeque},
    sync::OnceLock,
};

use regex::Regex;
use tokio::sync::Mutex;

use crate::domain::{MessageId, UserId};

/// Label preceding the user id in staff-group messages.
pub const USER_ID_LABEL: &str = "ID користувача:";

fn user_id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"{}\s*(\d+)", regex::escape(USER_ID_LABEL)))
            .expect("user id pattern is a valid regex")
    })
}

/// Line embedded in staff-group messages so replies can be routed back.
pub fn user_id_line(user_id: UserId) -> String {
    format!("🆔 {USER_ID_LABEL} {user_id}")
}

/// Find the user id label in `text` and parse the number after it.
pub fn extract_user_id(text: Option<&str>) -> Option<UserId> {
    let text = text?;
    let caps = user_id_pattern().captures(text)?;
    caps.get(1)?.as_str().parse::<i64>().ok().map(UserId)
}

/// Bounded map from staff-group message id to the user it was about.
#[derive(Debug)]
pub struct ReplyIndex {
    capacity: usize,
    inner: Mutex<IndexInner>,
}

#[derive(Debug, Default)]
struct IndexInner {
    by_message: HashMap<MessageId, UserId>,
    order: VecDeque<MessageId>,
}

impl ReplyIndex {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(IndexInner::default()),
        }
    }

    /// Remember that `message_id` in the staff group belongs to `user_id`.
    /// Evicts the oldest entries once capacity is reached.
    pub async fn remember(&self, message_id: MessageId, user_id: UserId) {
        let mut inner = self.inner.lock().await;
        if inner.by_message.insert(message_id, user_id).is_none() {
            inner.order.push_back(message_id);
        }
        while inner.order.len() > self.capacity {
            if let Some(old) = inner.order.pop_front() {
                inner.by_message.remove(&old);
            }
        }
    }

    pub async fn lookup(&self, message_id: MessageId) -> Option<UserId> {
        self.inner.lock().await.by_message.get(&message_id).copied()
    }

    /// Resolve the user for a reply: indexed message first, then the text label.
    pub async fn resolve(&self, message_id: MessageId, text: Option<&str>) -> Option<UserId> {
        match self.lookup(message_id).await {
            Some(user_id) => Some(user_id),
            None => extract_user_id(text),
        }
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.inner.lock().await.by_message.len()
    }

    #[cfg(test)]
    pub(crate) async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
