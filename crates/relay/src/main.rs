use std::sync::Arc;

use relay_core::{config::Config, history::HistoryStore};
use tracing::error;

#[tokio::main]
async fn main() -> Result<(), relay_core::Error> {
    relay_core::logging::init("relay")?;

    let cfg = Arc::new(Config::load()?);

    let history = HistoryStore::load(&cfg.chat_history_file).map_err(|e| {
        error!(
            path = %cfg.chat_history_file.display(),
            error = %e,
            "chat history file is unreadable; refusing to start"
        );
        e
    })?;

    relay_telegram::router::run_polling(cfg, Arc::new(history))
        .await
        .map_err(|e| relay_core::Error::transport(format!("telegram bot failed: {e}"), false))?;

    Ok(())
}
