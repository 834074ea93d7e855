use teloxide::types::{Message, User};

use relay_core::{
    domain::{ChatId, MessageId, Payload, UserId},
    messaging::types::{IncomingUpdate, RepliedMessage, Sender, StaffMessage, UserMessage},
};

pub(super) fn sender(user: &User) -> Sender {
    Sender {
        user_id: UserId(user.id.0 as i64),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        username: user.username.clone(),
    }
}

/// Text, or the largest photo size / document / voice by file id.
fn payload(msg: &Message) -> Option<Payload> {
    let caption = msg.caption().map(|s| s.to_string());

    if let Some(text) = msg.text() {
        return Some(Payload::Text(text.to_string()));
    }
    if let Some(photos) = msg.photo() {
        let best = photos.last()?;
        return Some(Payload::Photo {
            file_id: best.file.id.clone(),
            caption,
        });
    }
    if let Some(doc) = msg.document() {
        return Some(Payload::Document {
            file_id: doc.file.id.clone(),
            file_name: doc.file_name.clone(),
            caption,
        });
    }
    if let Some(voice) = msg.voice() {
        return Some(Payload::Voice {
            file_id: voice.file.id.clone(),
        });
    }
    None
}

fn replied(msg: &Message) -> Option<RepliedMessage> {
    let parent = msg.reply_to_message()?;
    Some(RepliedMessage {
        message_id: MessageId(parent.id.0),
        text: parent.text().or_else(|| parent.caption()).map(|s| s.to_string()),
    })
}

/// Split messages into staff-group traffic and private user traffic.
///
/// Messages from any other group or channel, and messages without a human
/// sender, are not relayed.
pub(super) fn classify(msg: &Message, staff_chat: ChatId) -> Option<IncomingUpdate> {
    if msg.chat.id.0 == staff_chat.0 {
        return Some(IncomingUpdate::Staff(StaffMessage {
            message_id: MessageId(msg.id.0),
            payload: payload(msg),
            reply_to: replied(msg),
        }));
    }

    if !msg.chat.is_private() {
        return None;
    }
    let user = msg.from()?;
    if user.is_bot {
        return None;
    }

    Some(IncomingUpdate::User(UserMessage {
        chat_id: ChatId(msg.chat.id.0),
        sender: sender(user),
        payload: payload(msg),
    }))
}
