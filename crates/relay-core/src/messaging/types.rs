use crate::domain::{ChatId, MessageId, Payload, UserId};

/// Transport-agnostic incoming update model.
///
/// The Telegram adapter classifies raw updates into these; everything else
/// (menus, routing, history) happens in the core.
#[derive(Clone, Debug)]
pub enum IncomingUpdate {
    /// A message written by an end user in a private chat.
    User(UserMessage),
    /// A message posted inside the staff group.
    Staff(StaffMessage),
    /// An inline keyboard button press.
    Callback(CallbackQuery),
}

/// Who sent an update.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sender {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl Sender {
    pub fn full_name(&self) -> String {
        match self.last_name.as_deref().map(str::trim) {
            Some(last) if !last.is_empty() => format!("{} {last}", self.first_name),
            _ => self.first_name.clone(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct UserMessage {
    pub chat_id: ChatId,
    pub sender: Sender,
    /// `None` for message kinds the relay does not carry (stickers, polls, ...).
    pub payload: Option<Payload>,
}

#[derive(Clone, Debug)]
pub struct StaffMessage {
    pub message_id: MessageId,
    pub payload: Option<Payload>,
    pub reply_to: Option<RepliedMessage>,
}

/// The staff-group message a staff member replied to.
#[derive(Clone, Debug)]
pub struct RepliedMessage {
    pub message_id: MessageId,
    /// Text, or caption for media messages.
    pub text: Option<String>,
}

#[derive(Clone, Debug)]
pub struct CallbackQuery {
    pub chat_id: ChatId,
    pub sender: Sender,
    pub callback_id: String,
    pub data: String,
}

/// Inline keyboard (buttons carrying callback data), one button per row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub buttons: Vec<InlineButton>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub callback_data: String,
}

impl InlineKeyboard {
    pub fn new(buttons: Vec<InlineButton>) -> Self {
        Self { buttons }
    }
}

/// Reply keyboard (buttons that send their label as text), one button per row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplyKeyboard {
    pub labels: Vec<String>,
    pub resize: bool,
    pub one_time: bool,
}

/// Capabilities / limits of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    pub max_message_len: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender(last: Option<&str>) -> Sender {
        Sender {
            user_id: UserId(1),
            first_name: "Olena".to_string(),
            last_name: last.map(str::to_string),
            username: None,
        }
    }

    #[test]
    fn full_name_skips_missing_last_name() {
        assert_eq!(sender(None).full_name(), "Olena");
        assert_eq!(sender(Some(" ")).full_name(), "Olena");
        assert_eq!(sender(Some("Koval")).full_name(), "Olena Koval");
    }
}
