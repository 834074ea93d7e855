use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::{info, warn};

use relay_core::{
    config::Config,
    history::HistoryStore,
    identity::ReplyIndex,
    messaging::{
        port::MessagingPort,
        throttled::{ThrottleConfig, ThrottledMessenger},
    },
    relay::Relay,
};

use crate::handlers;
use crate::{RetryPolicy, TelegramMessenger};

#[derive(Clone)]
pub struct AppState {
    pub relay: Arc<Relay>,
}

/// Build the outbound messenger stack: Telegram adapter with retries, optionally throttled.
pub fn build_messenger(bot: Bot, cfg: &Config) -> Arc<dyn MessagingPort> {
    let retry = RetryPolicy {
        max_retries: cfg.send_max_retries,
        base_delay: cfg.send_retry_base,
    };
    let raw: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(
        bot,
        retry,
        cfg.telegram_message_limit,
    ));
    if !cfg.throttle_enabled {
        return raw;
    }
    Arc::new(ThrottledMessenger::new(raw, ThrottleConfig::default()))
}

pub async fn run_polling(cfg: Arc<Config>, history: Arc<HistoryStore>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.bot_token.clone());

    match bot.get_me().await {
        Ok(me) => info!("bot started: @{}", me.username()),
        Err(e) => warn!(error = %e, "getMe failed; continuing"),
    }
    info!(
        staff_group = cfg.manager_group_id.0,
        history_file = %history.path().display(),
        users_with_history = history.len_users().await,
        "relay configured"
    );

    let messenger = build_messenger(bot.clone(), &cfg);
    let relay = Arc::new(Relay::new(
        cfg.manager_group_id,
        messenger,
        history,
        ReplyIndex::new(cfg.reply_index_capacity),
    ));

    let state = Arc::new(AppState { relay });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|_| async {})
        .build()
        .dispatch()
        .await;

    Ok(())
}
