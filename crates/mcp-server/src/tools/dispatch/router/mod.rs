//! Validated tool calls and their handlers, grouped like the catalog.

mod api;
mod deploy;
mod diagnostics;
mod lifecycle;
mod services;

use super::args::parse_args;
use super::{ServiceState, ToolError, ToolResult};
use crate::tools::catalog::ToolDescriptor;
use crate::tools::schemas::api::{
    CommitTransactionRequest, GetTransactionRequest, GraphqlQueryRequest,
};
use crate::tools::schemas::deploy::{
    DockerBuildRequest, DockerRunRequest, InstallDependenciesRequest, RunPlaybookRequest,
};
use crate::tools::schemas::diagnostics::{UpdateConfigRequest, ViewConfigRequest};
use crate::tools::schemas::lifecycle::InitializeEnvironmentRequest;
use crate::tools::schemas::services::{RestartServiceRequest, ViewLogsRequest};
use rmcp::model::JsonObject;
use tokio_util::sync::CancellationToken;

/// A catalog tool with its arguments already deserialized.
#[derive(Debug)]
pub(super) enum ToolCall {
    InitializeEnvironment(InitializeEnvironmentRequest),
    CheckDependencies,
    InstallDependencies(InstallDependenciesRequest),
    RunPlaybook(RunPlaybookRequest),
    QuickDeploy,
    DockerBuild(DockerBuildRequest),
    DockerRun(DockerRunRequest),
    CheckServices,
    RestartService(RestartServiceRequest),
    ViewLogs(ViewLogsRequest),
    CommitTransaction(CommitTransactionRequest),
    GetTransaction(GetTransactionRequest),
    GraphqlQuery(GraphqlQueryRequest),
    CheckPorts,
    ViewConfig(ViewConfigRequest),
    UpdateConfig(UpdateConfigRequest),
}

impl ToolCall {
    pub(super) fn parse(
        tool: &ToolDescriptor,
        arguments: Option<JsonObject>,
    ) -> Result<Self, ToolError> {
        let call = match tool.name {
            "initialize_environment" => Self::InitializeEnvironment(parse_args(tool, arguments)?),
            "check_dependencies" => Self::CheckDependencies,
            "install_dependencies" => Self::InstallDependencies(parse_args(tool, arguments)?),
            "run_playbook" => Self::RunPlaybook(parse_args(tool, arguments)?),
            "quick_deploy" => Self::QuickDeploy,
            "docker_build" => Self::DockerBuild(parse_args(tool, arguments)?),
            "docker_run" => Self::DockerRun(parse_args(tool, arguments)?),
            "check_services" => Self::CheckServices,
            "restart_service" => Self::RestartService(parse_args(tool, arguments)?),
            "view_logs" => Self::ViewLogs(parse_args(tool, arguments)?),
            "commit_transaction" => Self::CommitTransaction(parse_args(tool, arguments)?),
            "get_transaction" => Self::GetTransaction(parse_args(tool, arguments)?),
            "graphql_query" => Self::GraphqlQuery(parse_args(tool, arguments)?),
            "check_ports" => Self::CheckPorts,
            "view_config" => Self::ViewConfig(parse_args(tool, arguments)?),
            "update_config" => Self::UpdateConfig(parse_args(tool, arguments)?),
            other => return Err(ToolError::UnknownTool(other.to_string())),
        };
        Ok(call)
    }

    pub(super) async fn execute(
        self,
        state: &mut ServiceState,
        cancel: &CancellationToken,
    ) -> ToolResult {
        match self {
            Self::InitializeEnvironment(request) => {
                lifecycle::initialize_environment(state, request, cancel).await
            }
            Self::CheckDependencies => deploy::check_dependencies(state, cancel).await,
            Self::InstallDependencies(request) => {
                deploy::install_dependencies(state, request, cancel).await
            }
            Self::RunPlaybook(request) => deploy::run_playbook(state, request, cancel).await,
            Self::QuickDeploy => deploy::quick_deploy(state, cancel).await,
            Self::DockerBuild(request) => deploy::docker_build(state, request, cancel).await,
            Self::DockerRun(request) => deploy::docker_run(state, request, cancel).await,
            Self::CheckServices => services::check_services(state, cancel).await,
            Self::RestartService(request) => {
                services::restart_service(state, request, cancel).await
            }
            Self::ViewLogs(request) => services::view_logs(state, request, cancel).await,
            Self::CommitTransaction(request) => {
                api::commit_transaction(state, request, cancel).await
            }
            Self::GetTransaction(request) => api::get_transaction(state, request, cancel).await,
            Self::GraphqlQuery(request) => api::graphql_query(state, request, cancel).await,
            Self::CheckPorts => diagnostics::check_ports(state, cancel).await,
            Self::ViewConfig(request) => diagnostics::view_config(state, request),
            Self::UpdateConfig(request) => diagnostics::update_config(state, request),
        }
    }
}
