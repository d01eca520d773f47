use super::{ServiceState, ToolError, ToolResult};
use crate::tools::schemas::deploy::{
    DockerBuildRequest, DockerRunRequest, InstallDependenciesRequest, RunPlaybookRequest,
};
use rdb_deploy::docker;
use rdb_deploy::playbook::PlaybookRun;
use rdb_deploy::settings::DEFAULT_NGINX_URL;
use rdb_deploy::summary::{recap_lines, tail_chars, PLAY_RECAP_MARKER};
use rdb_deploy::toolchain::{self, DependencyState, PackageManager, Requirement};
use rdb_deploy::{format_duration, CommandSpec, DeployError};
use std::path::Path;
use tokio_util::sync::CancellationToken;

const SUMMARY_HEADER: &str = "\n=== DEPLOYMENT SUMMARY ===";
const SUCCESS_SUMMARY_LINES: usize = 10;
const PLAYBOOK_ERROR_CHARS: usize = 500;
const QUICK_DEPLOY_OUTPUT_CHARS: usize = 2000;
const QUICK_DEPLOY_DONE_MARKER: &str = "All services started";
const DOCKER_BUILD_ERROR_CHARS: usize = 1000;
const DOCKER_RUN_ERROR_CHARS: usize = 500;
const INSTALL_ERROR_CHARS: usize = 1000;

pub(super) async fn check_dependencies(
    state: &mut ServiceState,
    cancel: &CancellationToken,
) -> ToolResult {
    let statuses = toolchain::check_dependencies(state.runner.as_ref(), cancel).await;
    let mut lines = Vec::with_capacity(statuses.len() + 2);
    for status in &statuses {
        let program = status.dependency.program;
        lines.push(match &status.state {
            DependencyState::Installed {
                version: Some(version),
            } => format!("{program}: {version}"),
            DependencyState::Installed { version: None } => format!("{program}: installed"),
            DependencyState::Missing => {
                format!("{program}: NOT FOUND - {}", status.dependency.description)
            }
        });
    }

    let missing = toolchain::missing_with(&statuses, Requirement::Critical);
    if missing.is_empty() {
        lines.push("\nAll critical dependencies are installed!".to_string());
    } else {
        lines.push(format!(
            "\nMissing critical dependencies: {}",
            missing.join(", ")
        ));
        lines.push("Run 'install_dependencies' to attempt automatic installation".to_string());
    }
    Ok(lines.join("\n"))
}

pub(super) async fn install_dependencies(
    state: &mut ServiceState,
    request: InstallDependenciesRequest,
    cancel: &CancellationToken,
) -> ToolResult {
    let runner = state.runner.as_ref();
    let statuses = toolchain::check_dependencies(runner, cancel).await;
    let missing = toolchain::missing_with(&statuses, Requirement::Critical);
    if missing.is_empty() {
        return Ok("All critical dependencies are already installed".to_string());
    }

    let Some(manager) = PackageManager::detect(runner) else {
        return Err(ToolError::failed(format!(
            "No supported package manager found (tried apt-get, dnf, yum, brew). \
             Install manually: {}",
            missing.join(", ")
        )));
    };

    let mut lines = vec![format!(
        "Installing {} with {}",
        missing.join(", "),
        manager.program()
    )];
    for spec in manager.install_plan(&missing, request.use_sudo, state.settings.command_timeout) {
        lines.push(format!("$ {}", spec.display()));
        match runner.run(&spec, cancel).await {
            Ok(result) if result.success() => {}
            Ok(result) => {
                lines.push(format!(
                    "Command failed (exit {}):\n{}",
                    result.exit_code,
                    tail_chars(result.diagnostic_output().trim_end(), INSTALL_ERROR_CHARS)
                ));
                return Err(ToolError::failed(lines.join("\n")));
            }
            Err(err) => {
                lines.push(err.to_string());
                return Err(ToolError::failed(lines.join("\n")));
            }
        }
    }

    let after = toolchain::check_dependencies(runner, cancel).await;
    let still_missing = toolchain::missing_with(&after, Requirement::Critical);
    if still_missing.is_empty() {
        lines.push("All critical dependencies are installed!".to_string());
        Ok(lines.join("\n"))
    } else {
        lines.push(format!("Still missing: {}", still_missing.join(", ")));
        Err(ToolError::failed(lines.join("\n")))
    }
}

pub(super) async fn run_playbook(
    state: &mut ServiceState,
    request: RunPlaybookRequest,
    cancel: &CancellationToken,
) -> ToolResult {
    let layout = state.gate.layout();
    require_file("Playbook", &layout.playbook())?;

    let spec = PlaybookRun::from(request)
        .command(layout)
        .timeout(state.settings.command_timeout);
    let result = match state.runner.run(&spec, cancel).await {
        Ok(result) => result,
        Err(DeployError::BinaryNotFound { .. }) => {
            return Err(ToolError::failed(
                "Error: ansible-playbook not found. Please run 'install_dependencies' first",
            ));
        }
        Err(DeployError::TimedOut { after, partial, .. }) => {
            let summary = deployment_summary(&partial.stdout);
            return Err(ToolError::failed(format!(
                "Playbook timed out after {}:\n{}\n{}",
                format_duration(after),
                tail_chars(partial.diagnostic_output(), PLAYBOOK_ERROR_CHARS),
                summary.join("\n")
            )));
        }
        Err(err) => return Err(ToolError::deploy("Error running playbook", err)),
    };

    let summary = deployment_summary(&result.stdout);
    if result.success() {
        let keep = summary.len().saturating_sub(SUCCESS_SUMMARY_LINES);
        Ok(format!(
            "Playbook executed successfully!\n{}",
            summary[keep..].join("\n")
        ))
    } else {
        Err(ToolError::failed(format!(
            "Playbook failed:\n{}\n{}",
            tail_chars(result.diagnostic_output(), PLAYBOOK_ERROR_CHARS),
            summary.join("\n")
        )))
    }
}

/// Header plus the recap block, or nothing when ansible never reached the recap.
fn deployment_summary(stdout: &str) -> Vec<&str> {
    if !stdout.lines().any(|line| line.contains(PLAY_RECAP_MARKER)) {
        return Vec::new();
    }
    let mut summary = vec![SUMMARY_HEADER];
    summary.extend(recap_lines(stdout, PLAY_RECAP_MARKER, usize::MAX));
    summary
}

pub(super) async fn quick_deploy(state: &mut ServiceState, cancel: &CancellationToken) -> ToolResult {
    let layout = state.gate.layout();
    let script = layout.startup_script();
    require_file("Startup script", &script)?;
    make_executable(&script)
        .map_err(|err| ToolError::deploy("Error during quick deployment", err))?;

    let spec = CommandSpec::new("bash")
        .arg(&script)
        .current_dir(layout.root())
        .timeout(Some(state.settings.quick_deploy_timeout));
    match state.runner.run(&spec, cancel).await {
        Ok(result) => {
            let output = tail_chars(&result.stdout, QUICK_DEPLOY_OUTPUT_CHARS);
            if output.contains(QUICK_DEPLOY_DONE_MARKER) {
                Ok(format!("Quick deployment completed successfully!\n{output}"))
            } else if result.success() {
                Ok(format!("Quick deployment output:\n{output}"))
            } else {
                Err(ToolError::failed(format!(
                    "Quick deployment output (exit {}):\n{output}",
                    result.exit_code
                )))
            }
        }
        Err(DeployError::TimedOut { after, .. }) => Err(ToolError::failed(format!(
            "Deployment timed out after {}. Services may still be starting.",
            format_duration(after)
        ))),
        Err(err) => Err(ToolError::deploy("Error during quick deployment", err)),
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> rdb_deploy::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).map_err(|source| {
        DeployError::Io {
            context: format!("Failed to mark {} executable", path.display()),
            source,
        }
    })
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> rdb_deploy::Result<()> {
    Ok(())
}

pub(super) async fn docker_build(
    state: &mut ServiceState,
    request: DockerBuildRequest,
    cancel: &CancellationToken,
) -> ToolResult {
    let layout = state.gate.layout();
    require_file("Dockerfile", &layout.dockerfile())?;

    let spec = docker::build_command(layout, &request.tag).timeout(state.settings.command_timeout);
    match state.runner.run(&spec, cancel).await {
        Ok(result) if result.success() => {
            Ok(format!("Docker image built successfully: {}", request.tag))
        }
        Ok(result) => Err(ToolError::failed(format!(
            "Docker build failed:\n{}",
            tail_chars(result.diagnostic_output(), DOCKER_BUILD_ERROR_CHARS)
        ))),
        Err(DeployError::BinaryNotFound { .. }) => Err(docker_missing()),
        Err(err) => Err(ToolError::deploy("Error building Docker image", err)),
    }
}

pub(super) async fn docker_run(
    state: &mut ServiceState,
    request: DockerRunRequest,
    cancel: &CancellationToken,
) -> ToolResult {
    let spec = docker::run_command(&request.tag, request.detach)
        .timeout(state.settings.command_timeout);
    match state.runner.run(&spec, cancel).await {
        Ok(result) if result.success() => Ok(format!(
            "Container started successfully: {}\n\
             Access services at:\n\
             - Nginx: {DEFAULT_NGINX_URL}\n\
             - GraphQL: {}\n\
             - Crow API: {}",
            docker::short_container_id(&result.stdout),
            state.settings.graphql_url,
            state.settings.crow_base_url
        )),
        Ok(result) if result.stderr.contains("already in use") => Err(ToolError::failed(format!(
            "Container name already in use. Stop existing container first:\n{}",
            docker::remove_container_hint()
        ))),
        Ok(result) => Err(ToolError::failed(format!(
            "Failed to start container:\n{}",
            tail_chars(result.diagnostic_output(), DOCKER_RUN_ERROR_CHARS)
        ))),
        Err(DeployError::BinaryNotFound { .. }) => Err(docker_missing()),
        Err(err) => Err(ToolError::deploy("Error running container", err)),
    }
}

fn docker_missing() -> ToolError {
    ToolError::failed("Docker is not installed. Please install Docker first.")
}

fn require_file(label: &'static str, path: &Path) -> Result<(), ToolError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ToolError::MissingArtifact {
            label,
            path: path.to_path_buf(),
        })
    }
}
