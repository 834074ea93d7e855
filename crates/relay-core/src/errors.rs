/// Core error type for the relay.
///
/// Adapter crates map their specific errors into this type so the router can
/// tell fatal failures (config, startup I/O) from transport failures it logs
/// and moves past.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("transport error: {message}")]
    Transport { message: String, retryable: bool },
}

impl Error {
    pub fn transport(message: impl Into<String>, retryable: bool) -> Self {
        Self::Transport {
            message: message.into(),
            retryable,
        }
    }

    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Transport {
                retryable: true,
                ..
            }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
