//! Telegram adapter (teloxide).
//!
//! This crate implements the `relay-core` MessagingPort over the Telegram Bot
//! API and feeds Telegram updates into the core router.

use std::time::Duration;

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile, KeyboardButton, KeyboardMarkup},
    RequestError,
};

use tokio::time::sleep;
use tracing::debug;

pub mod handlers;
pub mod router;

use relay_core::{
    domain::{ChatId, MessageId, MessageRef},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{InlineKeyboard, MessagingCapabilities, ReplyKeyboard},
    },
    Result,
};

const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// How often and how patiently to retry transient send failures.
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Exponential backoff: `base * 2^attempt`, capped.
    fn backoff(&self, attempt: usize) -> Duration {
        let factor = 1u32 << attempt.min(16) as u32;
        self.base_delay.saturating_mul(factor).min(MAX_BACKOFF)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
        }
    }
}

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
    retry: RetryPolicy,
    max_message_len: usize,
}

impl TelegramMessenger {
    pub fn new(bot: Bot, retry: RetryPolicy, max_message_len: usize) -> Self {
        Self {
            bot,
            retry,
            max_message_len,
        }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn msg_ref(chat_id: ChatId, msg: &Message) -> MessageRef {
        MessageRef {
            chat_id,
            message_id: MessageId(msg.id.0),
        }
    }

    fn map_err(e: RequestError) -> Error {
        let retryable = is_retryable(&e);
        Error::transport(format!("telegram error: {e}"), retryable)
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, RequestError>>,
        Fut::IntoFuture: Send,
    {
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) if attempts < self.retry.max_retries && is_retryable(&e) => {
                    let wait = match &e {
                        RequestError::RetryAfter(d) => *d,
                        _ => self.retry.backoff(attempts),
                    };
                    attempts += 1;
                    debug!(attempt = attempts, wait_ms = wait.as_millis() as u64, error = %e, "retrying telegram request");
                    sleep(wait).await;
                }
                Err(e) => return Err(Self::map_err(e)),
            }
        }
    }
}

/// Flood control and network hiccups are worth retrying; API rejections are not.
fn is_retryable(e: &RequestError) -> bool {
    matches!(
        e,
        RequestError::RetryAfter(_) | RequestError::Network(_) | RequestError::Io(_)
    )
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            max_message_len: self.max_message_len,
        }
    }

    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| self.bot.send_message(Self::tg_chat(chat_id), text.to_string()))
            .await?;
        Ok(Self::msg_ref(chat_id, &msg))
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        file_id: &str,
        caption: Option<&str>,
    ) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                let mut req = self.bot.send_photo(
                    Self::tg_chat(chat_id),
                    InputFile::file_id(file_id.to_string()),
                );
                if let Some(c) = caption {
                    req = req.caption(c.to_string());
                }
                req
            })
            .await?;
        Ok(Self::msg_ref(chat_id, &msg))
    }

    async fn send_document(
        &self,
        chat_id: ChatId,
        file_id: &str,
        caption: Option<&str>,
    ) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                let mut req = self.bot.send_document(
                    Self::tg_chat(chat_id),
                    InputFile::file_id(file_id.to_string()),
                );
                if let Some(c) = caption {
                    req = req.caption(c.to_string());
                }
                req
            })
            .await?;
        Ok(Self::msg_ref(chat_id, &msg))
    }

    async fn send_voice(&self, chat_id: ChatId, file_id: &str) -> Result<MessageRef> {
        let msg = self
            .with_retry(|| {
                self.bot.send_voice(
                    Self::tg_chat(chat_id),
                    InputFile::file_id(file_id.to_string()),
                )
            })
            .await?;
        Ok(Self::msg_ref(chat_id, &msg))
    }

    async fn send_reply_keyboard(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: ReplyKeyboard,
    ) -> Result<MessageRef> {
        let rows: Vec<Vec<KeyboardButton>> = keyboard
            .labels
            .into_iter()
            .map(|label| vec![KeyboardButton::new(label)])
            .collect();
        let markup = KeyboardMarkup::new(rows)
            .resize_keyboard(keyboard.resize)
            .one_time_keyboard(keyboard.one_time);

        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(Self::tg_chat(chat_id), text.to_string())
                    .reply_markup(markup.clone())
            })
            .await?;
        Ok(Self::msg_ref(chat_id, &msg))
    }

    async fn send_inline_keyboard(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef> {
        let rows: Vec<Vec<InlineKeyboardButton>> = keyboard
            .buttons
            .into_iter()
            .map(|b| vec![InlineKeyboardButton::callback(b.label, b.callback_data)])
            .collect();
        let markup = InlineKeyboardMarkup::new(rows);

        let msg = self
            .with_retry(|| {
                self.bot
                    .send_message(Self::tg_chat(chat_id), text.to_string())
                    .reply_markup(markup.clone())
            })
            .await?;
        Ok(Self::msg_ref(chat_id, &msg))
    }

    async fn answer_callback_query(&self, callback_id: &str) -> Result<()> {
        self.with_retry(|| self.bot.answer_callback_query(callback_id.to_string()))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let p = RetryPolicy {
            max_retries: 5,
            base_delay: Duration::from_millis(500),
        };
        assert_eq!(p.backoff(0), Duration::from_millis(500));
        assert_eq!(p.backoff(1), Duration::from_millis(1000));
        assert_eq!(p.backoff(3), Duration::from_millis(4000));
        assert_eq!(p.backoff(40), MAX_BACKOFF);
    }

    #[test]
    fn flood_control_is_retryable() {
        assert!(is_retryable(&RequestError::RetryAfter(Duration::from_secs(3))));
    }
}
