/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
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

impl From<UserId> for ChatId {
    /// Private chats share their id with the user.
    fn from(u: UserId) -> Self {
        ChatId(u.0)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Interface language chosen by a user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Language {
    Ua,
    En,
    Pl,
}

impl Language {
    /// Used when a user never picked a language (or closed the chat).
    pub const DEFAULT: Language = Language::Ua;

    pub fn code(self) -> &'static str {
        match self {
            Language::Ua => "ua",
            Language::En => "en",
            Language::Pl => "pl",
        }
    }
}

/// Who produced a history entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    User,
    Manager,
}

/// Kind of payload carried by a relayed message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Photo,
    Document,
    Voice,
}

/// Content of a relayed message. Media is referenced by Telegram file id, never downloaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Photo {
        file_id: String,
        caption: Option<String>,
    },
    Document {
        file_id: String,
        file_name: Option<String>,
        caption: Option<String>,
    },
    Voice {
        file_id: String,
    },
}

impl Payload {
    pub fn kind(&self) -> MessageKind {
        match self {
            Payload::Text(_) => MessageKind::Text,
            Payload::Photo { .. } => MessageKind::Photo,
            Payload::Document { .. } => MessageKind::Document,
            Payload::Voice { .. } => MessageKind::Voice,
        }
    }
}
