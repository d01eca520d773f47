use super::{ServiceState, ToolError, ToolResult};
use crate::tools::schemas::lifecycle::InitializeEnvironmentRequest;
use rdb_deploy::{DeployError, InitOutcome};
use tokio_util::sync::CancellationToken;

pub(super) async fn initialize_environment(
    state: &mut ServiceState,
    request: InitializeEnvironmentRequest,
    cancel: &CancellationToken,
) -> ToolResult {
    let mut lines: Vec<String> = Vec::new();
    match state
        .gate
        .initialize(request.force, state.runner.as_ref(), cancel)
        .await
    {
        Ok(report) => {
            let dir = report.deploy_dir.display();
            match report.outcome {
                InitOutcome::AlreadyPresent => {
                    lines.push(format!("Repository already exists at {dir}"));
                }
                InitOutcome::Cloned { replaced } => {
                    if replaced {
                        lines.push("Removed existing repository".to_string());
                    }
                    lines.push(format!("Successfully cloned repository to {dir}"));
                }
            }
            for artifact in report.artifacts {
                let presence = if artifact.present { "found" } else { "missing" };
                lines.push(format!(
                    "{} {presence}: {}",
                    artifact.label,
                    artifact.path.display()
                ));
            }
            Ok(lines.join("\n"))
        }
        Err(failure) => {
            if failure.removed_existing {
                lines.push("Removed existing repository".to_string());
            }
            lines.push(match failure.source {
                DeployError::BinaryNotFound { .. } => {
                    "Error: git is not installed. Please run 'install_dependencies' first"
                        .to_string()
                }
                DeployError::Execution { message, .. } => {
                    format!("Failed to clone repository: {message}")
                }
                other => format!("Failed to clone repository: {other}"),
            });
            Err(ToolError::failed(lines.join("\n")))
        }
    }
}
