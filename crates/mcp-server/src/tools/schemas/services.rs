use rdb_deploy::{RestartTarget, ServiceName};
use rmcp::schemars;
use serde::Deserialize;

fn default_lines() -> u32 {
    50
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RestartServiceRequest {
    /// One unit name, or `all`
    #[schemars(with = "String", description = "Service to restart (or 'all' for all services)")]
    pub service: RestartTarget,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ViewLogsRequest {
    #[schemars(with = "String", description = "Service name to view logs for")]
    pub service: ServiceName,

    #[serde(default = "default_lines")]
    #[schemars(description = "Number of log lines to retrieve")]
    pub lines: u32,
}
