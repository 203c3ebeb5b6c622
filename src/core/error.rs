use std::io;

#[derive(thiserror::Error, Debug)]
pub enum HarrierError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<rusqlite::Error> for HarrierError {
    fn from(err: rusqlite::Error) -> Self {
        HarrierError::Storage(err.to_string())
    }
}

impl From<reqwest::Error> for HarrierError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HarrierError::Transport("webhook timeout".to_string())
        } else {
            HarrierError::Transport(err.to_string())
        }
    }
}
