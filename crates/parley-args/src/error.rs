//! Error types for argument runs.
//!
//! A failed cast is not an error: it is a `Null` or `Fail` outcome that the
//! argument recovers from locally. Errors here are programmer mistakes in
//! argument configuration and failures of the outside world.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown match kind: '{0}'")]
    UnknownMatch(String),

    #[error("Invalid argument configuration: {0}")]
    Config(String),

    #[error("Conversation error: {0}")]
    Transport(String),

    #[error("Caster error: {0}")]
    Caster(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Error::Transport(message.into())
    }

    pub fn caster(message: impl Into<String>) -> Self {
        Error::Caster(message.into())
    }
}
