use std::path::PathBuf;

/// Core error type for winbot.
///
/// Adapter crates should map their specific errors into this type so the
/// conversation flow can tell recoverable failures (shown to the user) from
/// failures that abort a single request.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("membership check failed: {0}")]
    MembershipCheck(String),

    #[error("no content available in {}", folder.display())]
    NoContentAvailable { folder: PathBuf },

    #[error("delivery failed: {0}")]
    Delivery(String),

    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
