use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::{
    domain::{ChatId, MessageRef},
    messaging::{
        port::MessagingPort,
        types::{InlineKeyboard, MessagingCapabilities, ReplyKeyboard},
    },
    Result,
};

/// Per-chat limiters are pruned once the map reaches this size.
const PRUNE_AT: usize = 256;

#[derive(Clone, Copy, Debug)]
pub struct ThrottleConfig {
    /// Minimum spacing between *any* Telegram API calls (global flood control).
    pub global_min_interval: Duration,
    /// Minimum spacing between calls per chat.
    pub per_chat_min_interval: Duration,
    /// Minimum spacing for group chats (Telegram allows ~20 msg/min per group).
    pub group_min_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            global_min_interval: Duration::from_millis(40), // ~25/sec
            per_chat_min_interval: Duration::from_millis(1050), // ~0.95/sec
            group_min_interval: Duration::from_millis(3000), // 20/min
        }
    }
}

#[derive(Debug)]
struct IntervalLimiter {
    interval: Duration,
    next: Instant,
}

impl IntervalLimiter {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: Instant::now(),
        }
    }

    /// Reserve the next slot and return the wait duration required before executing.
    fn reserve(&mut self) -> Duration {
        let now = Instant::now();
        let start = if now >= self.next { now } else { self.next };
        self.next = start + self.interval;
        start.saturating_duration_since(now)
    }

    /// No reservation is pending, so a fresh limiter would behave the same.
    fn is_idle(&self, now: Instant) -> bool {
        self.next <= now
    }
}

/// MessagingPort decorator that spaces out outbound calls.
///
/// Reduces Telegram 429s when the staff group receives bursts; it does not
/// guarantee zero 429s, the adapter still honours `RetryAfter`.
pub struct ThrottledMessenger {
    inner: Arc<dyn MessagingPort>,
    cfg: ThrottleConfig,
    global: Mutex<IntervalLimiter>,
    per_chat: Mutex<HashMap<i64, Arc<Mutex<IntervalLimiter>>>>,
}

impl ThrottledMessenger {
    pub fn new(inner: Arc<dyn MessagingPort>, cfg: ThrottleConfig) -> Self {
        Self {
            inner,
            cfg,
            global: Mutex::new(IntervalLimiter::new(cfg.global_min_interval)),
            per_chat: Mutex::new(HashMap::new()),
        }
    }

    fn interval_for(&self, chat_id: i64) -> Duration {
        // Negative ids are groups and channels.
        if chat_id < 0 {
            self.cfg.group_min_interval
        } else {
            self.cfg.per_chat_min_interval
        }
    }

    async fn limiter_for_chat(&self, chat_id: i64) -> Arc<Mutex<IntervalLimiter>> {
        let mut map = self.per_chat.lock().await;
        if map.len() >= PRUNE_AT && !map.contains_key(&chat_id) {
            let now = Instant::now();
            // A limiter that is locked right now is in use; keep it.
            map.retain(|_, lim| match lim.try_lock() {
                Ok(guard) => !guard.is_idle(now),
                Err(_) => true,
            });
        }
        map.entry(chat_id)
            .or_insert_with(|| Arc::new(Mutex::new(IntervalLimiter::new(self.interval_for(chat_id)))))
            .clone()
    }

    async fn throttle_chat(&self, chat_id: ChatId) {
        let global_wait = { self.global.lock().await.reserve() };
        let chat_wait = {
            let lim = self.limiter_for_chat(chat_id.0).await;
            let mut guard = lim.lock().await;
            guard.reserve()
        };

        let wait = global_wait.max(chat_wait);
        if wait > Duration::ZERO {
            sleep(wait).await;
        }
    }

    async fn throttle_global(&self) {
        let wait = { self.global.lock().await.reserve() };
        if wait > Duration::ZERO {
            sleep(wait).await;
        }
    }
}

#[async_trait::async_trait]
impl MessagingPort for ThrottledMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        self.inner.capabilities()
    }

    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageRef> {
        self.throttle_chat(chat_id).await;
        self.inner.send_text(chat_id, text).await
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        file_id: &str,
        caption: Option<&str>,
    ) -> Result<MessageRef> {
        self.throttle_chat(chat_id).await;
        self.inner.send_photo(chat_id, file_id, caption).await
    }

    async fn send_document(
        &self,
        chat_id: ChatId,
        file_id: &str,
        caption: Option<&str>,
    ) -> Result<MessageRef> {
        self.throttle_chat(chat_id).await;
        self.inner.send_document(chat_id, file_id, caption).await
    }

    async fn send_voice(&self, chat_id: ChatId, file_id: &str) -> Result<MessageRef> {
        self.throttle_chat(chat_id).await;
        self.inner.send_voice(chat_id, file_id).await
    }

    async fn send_reply_keyboard(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: ReplyKeyboard,
    ) -> Result<MessageRef> {
        self.throttle_chat(chat_id).await;
        self.inner.send_reply_keyboard(chat_id, text, keyboard).await
    }

    async fn send_inline_keyboard(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: InlineKeyboard,
    ) -> Result<MessageRef> {
        self.throttle_chat(chat_id).await;
        self.inner
            .send_inline_keyboard(chat_id, text, keyboard)
            .await
    }

    async fn answer_callback_query(&self, callback_id: &str) -> Result<()> {
        // No chat_id available here; apply global throttling only.
        self.throttle_global().await;
        self.inner.answer_callback_query(callback_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MessageId;

    struct NullMessenger;

    fn sent(chat_id: ChatId) -> Result<MessageRef> {
        Ok(MessageRef {
            chat_id,
            message_id: MessageId(1),
        })
    }

    #[async_trait::async_trait]
    impl MessagingPort for NullMessenger {
        fn capabilities(&self) -> MessagingCapabilities {
            MessagingCapabilities {
                max_message_len: 4096,
            }
        }

        async fn send_text(&self, chat_id: ChatId, _text: &str) -> Result<MessageRef> {
            sent(chat_id)
        }

        async fn send_photo(
            &self,
            chat_id: ChatId,
            _file_id: &str,
            _caption: Option<&str>,
        ) -> Result<MessageRef> {
            sent(chat_id)
        }

        async fn send_document(
            &self,
            chat_id: ChatId,
            _file_id: &str,
            _caption: Option<&str>,
        ) -> Result<MessageRef> {
            sent(chat_id)
        }

        async fn send_voice(&self, chat_id: ChatId, _file_id: &str) -> Result<MessageRef> {
            sent(chat_id)
        }

        async fn send_reply_keyboard(
            &self,
            chat_id: ChatId,
            _text: &str,
            _keyboard: ReplyKeyboard,
        ) -> Result<MessageRef> {
            sent(chat_id)
        }

        async fn send_inline_keyboard(
            &self,
            chat_id: ChatId,
            _text: &str,
            _keyboard: InlineKeyboard,
        ) -> Result<MessageRef> {
            sent(chat_id)
        }

        async fn answer_callback_query(&self, _callback_id: &str) -> Result<()> {
            Ok(())
        }
    }

    fn throttled() -> ThrottledMessenger {
        ThrottledMessenger::new(
            Arc::new(NullMessenger),
            ThrottleConfig {
                global_min_interval: Duration::ZERO,
                per_chat_min_interval: Duration::from_secs(1),
                group_min_interval: Duration::from_secs(3),
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn idle_chat_limiters_are_pruned() {
        let t = throttled();
        for chat in 1..=1000 {
            t.send_text(ChatId(chat), "hi").await.unwrap();
        }
        // Every chat still has a pending slot, so nothing is dropped yet.
        assert_eq!(t.per_chat.lock().await.len(), 1000);

        tokio::time::advance(Duration::from_secs(3600)).await;
        t.send_text(ChatId(5000), "hi").await.unwrap();
        assert_eq!(t.per_chat.lock().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn busy_chat_keeps_its_spacing_across_pruning() {
        let t = throttled();
        for chat in 1..PRUNE_AT as i64 {
            t.send_text(ChatId(chat), "hi").await.unwrap();
        }
        tokio::time::advance(Duration::from_secs(3600)).await;

        let start = Instant::now();
        t.send_text(ChatId(-100), "a").await.unwrap();
        t.send_text(ChatId(-100), "b").await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(3));

        // A new chat triggers pruning; the group still has a pending slot.
        t.send_text(ChatId(7777), "c").await.unwrap();
        let map = t.per_chat.lock().await;
        assert_eq!(map.len(), 2);
        assert!(map.contains_key(&-100));
    }

    #[tokio::test(start_paused = true)]
    async fn limiter_spaces_consecutive_reservations() {
        let mut lim = IntervalLimiter::new(Duration::from_millis(100));
        assert_eq!(lim.reserve(), Duration::ZERO);
        assert_eq!(lim.reserve(), Duration::from_millis(100));
        assert_eq!(lim.reserve(), Duration::from_millis(200));

        tokio::time::advance(Duration::from_millis(500)).await;
        assert_eq!(lim.reserve(), Duration::ZERO);
    }
}
