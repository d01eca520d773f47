use super::{ServiceState, ToolError, ToolResult};
use crate::tools::schemas::services::{RestartServiceRequest, ViewLogsRequest};
use rdb_deploy::summary::first_line;
use rdb_deploy::systemd::{is_active_command, journal_command, restart_command};
use rdb_deploy::{RestartTarget, ServiceName};
use tokio_util::sync::CancellationToken;

pub(super) async fn check_services(
    state: &mut ServiceState,
    cancel: &CancellationToken,
) -> ToolResult {
    let mut lines = vec!["Service Status:".to_string()];
    for service in ServiceName::STATUS_ORDER {
        let spec = is_active_command(service).timeout(state.settings.command_timeout);
        match state.runner.run(&spec, cancel).await {
            Ok(result) => {
                let status = result.stdout.trim();
                let status = if status.is_empty() { "unknown" } else { status };
                let mark = if status == "active" { "✓" } else { "✗" };
                lines.push(format!("{mark} {service}: {status}"));
            }
            Err(err) => {
                log::debug!("systemctl is-active {service} failed: {err}");
                lines.push(format!("? {service}: error checking"));
            }
        }
    }
    Ok(lines.join("\n"))
}

pub(super) async fn restart_service(
    state: &mut ServiceState,
    request: RestartServiceRequest,
    cancel: &CancellationToken,
) -> ToolResult {
    match request.service {
        RestartTarget::One(service) => {
            let spec = restart_command(service).timeout(state.settings.command_timeout);
            match state.runner.run(&spec, cancel).await {
                Ok(result) if result.success() => {
                    Ok(format!("Service {service} restarted successfully"))
                }
                Ok(result) => Err(ToolError::failed(format!(
                    "Error restarting {service}: {}",
                    result.diagnostic_output().trim_end()
                ))),
                Err(err) => Err(ToolError::deploy("Error restarting service", err)),
            }
        }
        target @ RestartTarget::All(_) => {
            let mut lines = Vec::new();
            let mut failures = 0usize;
            for service in target.services() {
                let spec = restart_command(service).timeout(state.settings.command_timeout);
                match state.runner.run(&spec, cancel).await {
                    Ok(result) if result.success() => lines.push(format!("Restarted {service}")),
                    Ok(result) => {
                        failures += 1;
                        lines.push(format!(
                            "Failed to restart {service}: {}",
                            first_line(result.diagnostic_output())
                        ));
                    }
                    Err(err) => {
                        failures += 1;
                        lines.push(format!("Failed to restart {service}: {err}"));
                    }
                }
            }
            if failures == 0 {
                Ok(lines.join("\n"))
            } else {
                Err(ToolError::failed(lines.join("\n")))
            }
        }
    }
}

pub(super) async fn view_logs(
    state: &mut ServiceState,
    request: ViewLogsRequest,
    cancel: &CancellationToken,
) -> ToolResult {
    let spec = journal_command(request.service, request.lines)
        .timeout(state.settings.command_timeout);
    match state.runner.run(&spec, cancel).await {
        Ok(result) if result.success() => Ok(format!(
            "=== Last {} lines of {} logs ===\n{}",
            request.lines, request.service, result.stdout
        )),
        Ok(result) => Err(ToolError::failed(format!(
            "Error fetching logs: {}",
            result.diagnostic_output().trim_end()
        ))),
        Err(err) => Err(ToolError::deploy("Error viewing logs", err)),
    }
}
