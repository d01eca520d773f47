use super::{ServiceState, ToolError, ToolResult};
use crate::tools::schemas::diagnostics::{UpdateConfigRequest, ViewConfigRequest};
use crate::tools::schemas::Component;
use rdb_deploy::config_store::{display_value, filter_by_component, render};
use rdb_deploy::ports::{netstat_command, port_tokens, ss_command};
use rdb_deploy::summary::filter_lines;
use rdb_deploy::{ConfigStore, DeployError};
use tokio_util::sync::CancellationToken;

pub(super) async fn check_ports(state: &mut ServiceState, cancel: &CancellationToken) -> ToolResult {
    let timeout = state.settings.command_timeout;
    let netstat = netstat_command().timeout(timeout);
    match state.runner.run(&netstat, cancel).await {
        Ok(result) => {
            let tokens = port_tokens();
            let tokens: Vec<&str> = tokens.iter().map(String::as_str).collect();
            let listening = filter_lines(&result.stdout, &tokens);
            if listening.is_empty() {
                Ok("No ResilientDB-related ports found listening".to_string())
            } else {
                Ok(format!("Listening ports:\n{}", listening.join("\n")))
            }
        }
        Err(DeployError::BinaryNotFound { .. }) => {
            let ss = ss_command().timeout(timeout);
            match state.runner.run(&ss, cancel).await {
                Ok(result) => Ok(format!("Listening sockets:\n{}", result.stdout)),
                Err(err) => {
                    log::debug!("ss fallback failed: {err}");
                    Err(ToolError::failed(
                        "Neither netstat nor ss available for port checking",
                    ))
                }
            }
        }
        Err(err) => Err(ToolError::deploy("Error checking ports", err)),
    }
}

fn config_store(state: &ServiceState) -> ConfigStore {
    ConfigStore::new(state.gate.layout().config_file())
}

pub(super) fn view_config(state: &ServiceState, request: ViewConfigRequest) -> ToolResult {
    let store = config_store(state);
    if !store.exists() {
        return Err(ToolError::MissingArtifact {
            label: "Configuration file",
            path: store.path().to_path_buf(),
        });
    }
    let context = "Error reading configuration";
    let doc = store
        .read()
        .map_err(|err| ToolError::deploy(context, err))?;

    let component = request.component;
    if component == Component::All {
        let rendered = render(&doc).map_err(|err| ToolError::deploy(context, err))?;
        return Ok(format!("Full configuration:\n{rendered}"));
    }
    let filtered = filter_by_component(&doc, component.as_str());
    if filtered.is_empty() {
        return Ok(format!("No configuration found for component: {component}"));
    }
    let rendered = render(&filtered).map_err(|err| ToolError::deploy(context, err))?;
    Ok(format!("Configuration for {component}:\n{rendered}"))
}

pub(super) fn update_config(state: &ServiceState, request: UpdateConfigRequest) -> ToolResult {
    let stored = config_store(state)
        .update(&request.key, &request.value)
        .map_err(|err| ToolError::deploy("Error updating configuration", err))?;
    Ok(format!(
        "Updated {} = {} in configuration",
        request.key,
        display_value(&stored)
    ))
}
