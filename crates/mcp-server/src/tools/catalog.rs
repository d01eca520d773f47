use rdb_deploy::docker::DEFAULT_IMAGE_TAG;
use rdb_deploy::ServiceName;
use rmcp::model::{JsonObject, Tool};
use serde_json::{json, Value};
use std::sync::Arc;

use super::schemas::Component;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ToolGroup {
    Lifecycle,
    Deployment,
    Services,
    Api,
    Diagnostics,
}

impl ToolGroup {
    fn heading(self) -> &'static str {
        match self {
            ToolGroup::Lifecycle => "Setup",
            ToolGroup::Deployment => "Deployment",
            ToolGroup::Services => "Services",
            ToolGroup::Api => "Ledger API",
            ToolGroup::Diagnostics => "Diagnostics",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct ToolDescriptor {
    pub(crate) name: &'static str,
    pub(crate) description: &'static str,
    pub(crate) group: ToolGroup,
    /// Requires a successful `initialize_environment` first.
    pub(crate) gated: bool,
    input_schema: fn() -> Value,
}

impl ToolDescriptor {
    pub(crate) fn input_schema(&self) -> JsonObject {
        match (self.input_schema)() {
            Value::Object(map) => map,
            _ => JsonObject::new(),
        }
    }

    /// Names listed under `required` in the input schema.
    pub(crate) fn required_fields(&self) -> Vec<String> {
        self.input_schema()
            .get("required")
            .and_then(Value::as_array)
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

pub(crate) const TOOL_CATALOG: &[ToolDescriptor] = &[
    ToolDescriptor {
        name: "initialize_environment",
        description: "Initialize the ResilientDB environment by cloning the repository and checking dependencies",
        group: ToolGroup::Lifecycle,
        gated: false,
        input_schema: initialize_environment_schema,
    },
    ToolDescriptor {
        name: "check_dependencies",
        description: "Check if all required dependencies (ansible, git, python, etc.) are installed",
        group: ToolGroup::Deployment,
        gated: false,
        input_schema: empty_schema,
    },
    ToolDescriptor {
        name: "install_dependencies",
        description: "Attempt to install missing dependencies (requires appropriate permissions)",
        group: ToolGroup::Deployment,
        gated: false,
        input_schema: install_dependencies_schema,
    },
    ToolDescriptor {
        name: "run_playbook",
        description: "Run the Ansible playbook to deploy ResilientDB",
        group: ToolGroup::Deployment,
        gated: true,
        input_schema: run_playbook_schema,
    },
    ToolDescriptor {
        name: "quick_deploy",
        description: "Quick deployment using the complete-startup.sh script for all services",
        group: ToolGroup::Deployment,
        gated: true,
        input_schema: empty_schema,
    },
    ToolDescriptor {
        name: "docker_build",
        description: "Build the Docker image for containerized deployment",
        group: ToolGroup::Deployment,
        gated: true,
        input_schema: docker_build_schema,
    },
    ToolDescriptor {
        name: "docker_run",
        description: "Run the ResilientDB container",
        group: ToolGroup::Deployment,
        gated: false,
        input_schema: docker_run_schema,
    },
    ToolDescriptor {
        name: "check_services",
        description: "Check the status of all ResilientDB services",
        group: ToolGroup::Services,
        gated: false,
        input_schema: empty_schema,
    },
    ToolDescriptor {
        name: "restart_service",
        description: "Restart a specific service",
        group: ToolGroup::Services,
        gated: false,
        input_schema: restart_service_schema,
    },
    ToolDescriptor {
        name: "view_logs",
        description: "View logs for a specific service",
        group: ToolGroup::Services,
        gated: false,
        input_schema: view_logs_schema,
    },
    ToolDescriptor {
        name: "commit_transaction",
        description: "Commit a transaction via the Crow HTTP API",
        group: ToolGroup::Api,
        gated: false,
        input_schema: commit_transaction_schema,
    },
    ToolDescriptor {
        name: "get_transaction",
        description: "Get a transaction by ID",
        group: ToolGroup::Api,
        gated: false,
        input_schema: get_transaction_schema,
    },
    ToolDescriptor {
        name: "graphql_query",
        description: "Execute a GraphQL query",
        group: ToolGroup::Api,
        gated: false,
        input_schema: graphql_query_schema,
    },
    ToolDescriptor {
        name: "check_ports",
        description: "Check which ports are listening",
        group: ToolGroup::Diagnostics,
        gated: false,
        input_schema: empty_schema,
    },
    ToolDescriptor {
        name: "view_config",
        description: "View configuration for a specific component",
        group: ToolGroup::Diagnostics,
        gated: true,
        input_schema: view_config_schema,
    },
    ToolDescriptor {
        name: "update_config",
        description: "Update configuration values in the Ansible inventory",
        group: ToolGroup::Diagnostics,
        gated: true,
        input_schema: update_config_schema,
    },
];

pub(crate) fn find(name: &str) -> Option<&'static ToolDescriptor> {
    TOOL_CATALOG.iter().find(|tool| tool.name == name)
}

/// `tools/list` payload, in catalog order.
pub(crate) fn tools() -> Vec<Tool> {
    TOOL_CATALOG
        .iter()
        .map(|tool| Tool::new(tool.name, tool.description, Arc::new(tool.input_schema())))
        .collect()
}

pub(crate) fn tool_instructions() -> String {
    let mut out = String::new();
    out.push_str("ResilientDB deployment tools. Start with `initialize_environment`, then ");
    out.push_str("`check_dependencies`; tools marked (*) refuse to run until the environment ");
    out.push_str("is initialized.\n");

    let mut current: Option<ToolGroup> = None;
    for tool in TOOL_CATALOG {
        if current != Some(tool.group) {
            out.push('\n');
            out.push_str(tool.group.heading());
            out.push_str(":\n");
            current = Some(tool.group);
        }
        out.push_str("- ");
        out.push_str(tool.name);
        if tool.gated {
            out.push_str(" (*)");
        }
        out.push_str(": ");
        out.push_str(tool.description);
        out.push('\n');
    }
    out
}

fn object(properties: Value, required: &[&str]) -> Value {
    let mut schema = json!({
        "type": "object",
        "properties": properties,
    });
    if !required.is_empty() {
        schema["required"] = json!(required);
    }
    schema
}

fn empty_schema() -> Value {
    object(json!({}), &[])
}

fn service_names() -> Vec<&'static str> {
    ServiceName::ALL.iter().map(|svc| svc.as_str()).collect()
}

fn initialize_environment_schema() -> Value {
    object(
        json!({
            "force": {
                "type": "boolean",
                "description": "Force re-initialization even if already set up",
                "default": false
            }
        }),
        &[],
    )
}

fn install_dependencies_schema() -> Value {
    object(
        json!({
            "use_sudo": {
                "type": "boolean",
                "description": "Use sudo for installation",
                "default": true
            }
        }),
        &[],
    )
}

fn run_playbook_schema() -> Value {
    object(
        json!({
            "tags": {
                "type": "string",
                "description": "Comma-separated tags (e.g., 'resilientdb,nginx'). Options: all, common, resilientdb, crow, graphql, nginx",
                "default": "all"
            },
            "limit": {
                "type": "string",
                "description": "Limit to specific hosts",
                "default": "all"
            },
            "check": {
                "type": "boolean",
                "description": "Run in check mode (dry run)",
                "default": false
            }
        }),
        &[],
    )
}

fn docker_build_schema() -> Value {
    object(
        json!({
            "tag": {
                "type": "string",
                "description": "Docker image tag",
                "default": DEFAULT_IMAGE_TAG
            }
        }),
        &[],
    )
}

fn docker_run_schema() -> Value {
    object(
        json!({
            "tag": {
                "type": "string",
                "description": "Docker image tag to run",
                "default": DEFAULT_IMAGE_TAG
            },
            "detach": {
                "type": "boolean",
                "description": "Run container in background",
                "default": true
            }
        }),
        &[],
    )
}

fn restart_service_schema() -> Value {
    let mut targets = service_names();
    targets.push("all");
    object(
        json!({
            "service": {
                "type": "string",
                "enum": targets,
                "description": "Service to restart (or 'all' for all services)"
            }
        }),
        &["service"],
    )
}

fn view_logs_schema() -> Value {
    object(
        json!({
            "service": {
                "type": "string",
                "enum": service_names(),
                "description": "Service name to view logs for"
            },
            "lines": {
                "type": "integer",
                "description": "Number of log lines to retrieve",
                "default": 50
            }
        }),
        &["service"],
    )
}

fn commit_transaction_schema() -> Value {
    object(
        json!({
            "transaction_id": {
                "type": "string",
                "description": "Transaction ID"
            },
            "value": {
                "type": "string",
                "description": "Transaction value/data"
            }
        }),
        &["transaction_id", "value"],
    )
}

fn get_transaction_schema() -> Value {
    object(
        json!({
            "transaction_id": {
                "type": "string",
                "description": "Transaction ID to retrieve"
            }
        }),
        &["transaction_id"],
    )
}

fn graphql_query_schema() -> Value {
    object(
        json!({
            "query": {
                "type": "string",
                "description": "GraphQL query string"
            },
            "variables": {
                "type": "object",
                "description": "Optional GraphQL variables",
                "default": {}
            }
        }),
        &["query"],
    )
}

fn view_config_schema() -> Value {
    let components: Vec<&str> = Component::ALL.iter().map(|c| c.as_str()).collect();
    object(
        json!({
            "component": {
                "type": "string",
                "enum": components,
                "description": "Component configuration to view"
            }
        }),
        &["component"],
    )
}

fn update_config_schema() -> Value {
    object(
        json!({
            "key": {
                "type": "string",
                "description": "Configuration key to update (e.g., 'crow_port', 'bazel_jobs')"
            },
            "value": {
                "type": "string",
                "description": "New value for the configuration key"
            }
        }),
        &["key", "value"],
    )
}
