use rmcp::schemars;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct InitializeEnvironmentRequest {
    /// Remove an existing checkout and clone again.
    #[serde(default)]
    #[schemars(description = "Force re-initialization even if already set up")]
    pub force: bool,
}
