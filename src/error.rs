use std::error::Error as StdError;
use std::process::ExitStatus;

use thiserror::Error;

/// Condense's crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Condense's crate-wide error type.
///
/// This is intentionally decoupled from `anyhow` so downstream libraries aren't forced to
/// adopt `anyhow` in their own public APIs.
#[derive(Debug, Error)]
pub enum Error {
    /// A subtitle file could not be parsed.
    #[error("malformed subtitle data: {0}")]
    Subtitle(String),

    /// yt-dlp exited unsuccessfully. Download failures are fatal and
    /// user-visible; they are never masked.
    #[error("yt-dlp failed with {status}")]
    Download { status: ExitStatus },

    #[error("{0}")]
    Message(String),

    #[error(transparent)]
    Other(#[from] Box<dyn StdError + Send + Sync>),
}

impl Error {
    pub(crate) fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Message(format!("{err:#}"))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Other(Box::new(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Other(Box::new(err))
    }
}

impl From<std::str::Utf8Error> for Error {
    fn from(err: std::str::Utf8Error) -> Self {
        Self::Other(Box::new(err))
    }
}
