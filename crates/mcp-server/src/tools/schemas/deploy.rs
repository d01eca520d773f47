use rdb_deploy::docker::DEFAULT_IMAGE_TAG;
use rdb_deploy::playbook::{PlaybookRun, ALL};
use rmcp::schemars;
use serde::Deserialize;

fn default_true() -> bool {
    true
}

fn default_all() -> String {
    ALL.to_string()
}

fn default_image_tag() -> String {
    DEFAULT_IMAGE_TAG.to_string()
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct InstallDependenciesRequest {
    #[serde(default = "default_true")]
    #[schemars(description = "Use sudo for installation")]
    pub use_sudo: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RunPlaybookRequest {
    /// Comma-separated tag filter
    #[serde(default = "default_all")]
    #[schemars(description = "Comma-separated tags; 'all' runs every role")]
    pub tags: String,

    #[serde(default = "default_all")]
    #[schemars(description = "Limit to specific hosts")]
    pub limit: String,

    #[serde(default)]
    #[schemars(description = "Run in check mode (dry run)")]
    pub check: bool,
}

impl From<RunPlaybookRequest> for PlaybookRun {
    fn from(request: RunPlaybookRequest) -> Self {
        PlaybookRun {
            tags: request.tags,
            limit: request.limit,
            check: request.check,
        }
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DockerBuildRequest {
    #[serde(default = "default_image_tag")]
    #[schemars(description = "Docker image tag")]
    pub tag: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DockerRunRequest {
    #[serde(default = "default_image_tag")]
    #[schemars(description = "Docker image tag to run")]
    pub tag: String,

    #[serde(default = "default_true")]
    #[schemars(description = "Run container in background")]
    pub detach: bool,
}
