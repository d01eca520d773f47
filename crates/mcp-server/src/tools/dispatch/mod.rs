//! MCP tool dispatch for ResilientDB deployments
//!
//! One call runs to completion at a time: the service state (lifecycle gate included) sits
//! behind an async mutex held for the whole invocation.

mod args;
mod error;
mod router;
mod service;
#[cfg(test)]
mod tests;

pub(crate) use error::ToolError;

use crate::tools::catalog;
use rdb_deploy::{CommandRunner, HttpRelay, LifecycleGate, Settings, SystemRunner};
use rmcp::model::{CallToolResult, Content, JsonObject};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

pub(super) type ToolResult = Result<String, ToolError>;

/// ResilientDB deployment MCP service
#[derive(Clone)]
pub struct DeployService {
    state: Arc<Mutex<ServiceState>>,
}

pub(super) struct ServiceState {
    settings: Settings,
    runner: Arc<dyn CommandRunner>,
    gate: LifecycleGate,
    relay: HttpRelay,
}

impl DeployService {
    pub fn new(settings: Settings) -> rdb_deploy::Result<Self> {
        Self::with_runner(settings, Arc::new(SystemRunner))
    }

    /// Service backed by an arbitrary process runner.
    pub fn with_runner(
        settings: Settings,
        runner: Arc<dyn CommandRunner>,
    ) -> rdb_deploy::Result<Self> {
        let relay = HttpRelay::new(&settings.crow_base_url, &settings.graphql_url)?;
        let gate = LifecycleGate::new(
            settings.layout(),
            settings.repo_url.clone(),
            settings.command_timeout,
        );
        Ok(Self {
            state: Arc::new(Mutex::new(ServiceState {
                settings,
                runner,
                gate,
                relay,
            })),
        })
    }

    /// Run one tool call. Never fails: every error becomes an error-flagged text outcome.
    pub(crate) async fn invoke(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
        cancel: &CancellationToken,
    ) -> Outcome {
        let Some(tool) = catalog::find(name) else {
            log::info!("Rejected call to unknown tool {name:?}");
            return Outcome::from_result(Err(ToolError::UnknownTool(name.to_string())));
        };

        let mut state = self.state.lock().await;
        log::debug!("tools/call {name}");
        // The gate answers before argument validation.
        let gate = if tool.gated {
            state.gate.require_initialized().map_err(ToolError::from)
        } else {
            Ok(())
        };
        let result = match gate.and_then(|()| router::ToolCall::parse(tool, arguments)) {
            Ok(call) => call.execute(&mut state, cancel).await,
            Err(err) => Err(err),
        };
        if let Err(err) = &result {
            log::info!("{name} failed: {err}");
        }
        Outcome::from_result(result)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Outcome {
    pub(crate) text: String,
    pub(crate) is_error: bool,
}

impl Outcome {
    fn from_result(result: ToolResult) -> Self {
        match result {
            Ok(text) => Self {
                text,
                is_error: false,
            },
            Err(err) => Self {
                text: err.to_string(),
                is_error: true,
            },
        }
    }

    pub(crate) fn into_call_result(self) -> CallToolResult {
        let content = vec![Content::text(self.text)];
        if self.is_error {
            CallToolResult::error(content)
        } else {
            CallToolResult::success(content)
        }
    }
}
