use rmcp::schemars;
use serde::Deserialize;
use std::fmt;

/// Configuration slice selectable through `view_config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    Resilientdb,
    Crow,
    Graphql,
    Nginx,
    All,
}

impl Component {
    pub const ALL: [Component; 5] = [
        Component::Resilientdb,
        Component::Crow,
        Component::Graphql,
        Component::Nginx,
        Component::All,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Component::Resilientdb => "resilientdb",
            Component::Crow => "crow",
            Component::Graphql => "graphql",
            Component::Nginx => "nginx",
            Component::All => "all",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ViewConfigRequest {
    #[schemars(description = "Component configuration to view")]
    pub component: Component,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateConfigRequest {
    #[schemars(description = "Configuration key to update (e.g., 'crow_port', 'bazel_jobs')")]
    pub key: String,

    #[schemars(description = "New value for the configuration key")]
    pub value: String,
}
