use teloxide::types::CallbackQuery;

use relay_core::{
    domain::ChatId,
    messaging::types::{self, IncomingUpdate},
};

use super::message::sender;

/// Service-menu button press. Replies go to the chat holding the menu, or the
/// presser's private chat if Telegram omitted the message.
pub(super) fn classify(q: &CallbackQuery) -> IncomingUpdate {
    let sender = sender(&q.from);
    let chat_id = q
        .message
        .as_ref()
        .map(|m| ChatId(m.chat.id.0))
        .unwrap_or_else(|| ChatId::from(sender.user_id));

    IncomingUpdate::Callback(types::CallbackQuery {
        chat_id,
        sender,
        callback_id: q.id.clone(),
        data: q.data.clone().unwrap_or_default(),
    })
}
