use std::time::Duration;
use thiserror::Error;

use crate::process::CommandResult;

pub type Result<T> = std::result::Result<T, DeployError>;

#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Environment not initialized. Please run 'initialize_environment' first")]
    NotInitialized,

    #[error("{program} is not installed or not on PATH")]
    BinaryNotFound { program: String },

    #[error("{program} timed out after {}", format_duration(*after))]
    TimedOut {
        program: String,
        after: Duration,
        partial: CommandResult,
    },

    #[error("{program} was cancelled before it finished")]
    Cancelled { program: String },

    #[error("{program} failed: {message}")]
    Execution { program: String, message: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    Relay(String),
}

impl DeployError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn relay(message: impl Into<String>) -> Self {
        Self::Relay(message.into())
    }

    pub fn is_binary_not_found(&self) -> bool {
        matches!(self, Self::BinaryNotFound { .. })
    }
}

/// Render a duration the way operators read it ("5 minutes", "90 seconds").
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        let minutes = secs / 60;
        if minutes == 1 {
            "1 minute".to_string()
        } else {
            format!("{minutes} minutes")
        }
    } else if secs == 1 {
        "1 second".to_string()
    } else if secs == 0 {
        format!("{} ms", duration.as_millis())
    } else {
        format!("{secs} seconds")
    }
}
