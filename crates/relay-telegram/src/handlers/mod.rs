//! Telegram update handlers.
//!
//! Each handler only translates a raw Telegram update into a core
//! `IncomingUpdate` and hands it to the router. Failures are logged by the
//! router; handlers always report success to the dispatcher.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message},
};
use tracing::debug;

use crate::router::AppState;

mod callback;
mod message;

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    let update = callback::classify(&q);
    let routed = state.relay.handle(update).await;
    debug!(?routed, "callback handled");
    Ok(())
}

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(update) = message::classify(&msg, state.relay.staff_chat()) else {
        return Ok(());
    };
    let routed = state.relay.handle(update).await;
    debug!(chat_id = msg.chat.id.0, ?routed, "message handled");
    Ok(())
}
