use rdb_deploy::DeployError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of one tool call. Rendered to text only at the MCP boundary.
#[derive(Debug, Error)]
pub(crate) enum ToolError {
    #[error("Environment not initialized. Please run 'initialize_environment' first")]
    NotInitialized,

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for tool '{tool}': {reason}")]
    InvalidArguments { tool: &'static str, reason: String },

    #[error("{label} not found at {}", path.display())]
    MissingArtifact { label: &'static str, path: PathBuf },

    /// Operation ran but did not succeed; the message is already operator-facing.
    #[error("{0}")]
    Failed(String),

    #[error("{context}: {source}")]
    Deploy {
        context: &'static str,
        #[source]
        source: DeployError,
    },
}

impl ToolError {
    pub(crate) fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    pub(crate) fn deploy(context: &'static str, source: DeployError) -> Self {
        Self::Deploy { context, source }
    }
}

impl From<DeployError> for ToolError {
    fn from(err: DeployError) -> Self {
        match err {
            DeployError::NotInitialized => Self::NotInitialized,
            other => Self::Failed(other.to_string()),
        }
    }
}
