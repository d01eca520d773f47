//! Lifecycle gate: `Uninitialized -> Initialized` once the deployment repository is present.
//!
//! The flag lives in memory for the life of the server, but every check re-verifies the
//! checkout on disk; removing the directory behind our back drops the gate again.

use crate::error::{DeployError, Result};
use crate::layout::{ArtifactStatus, DeploymentLayout};
use crate::process::{CommandRunner, CommandSpec};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Uninitialized,
    Initialized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// Checkout already existed and `force` was not requested.
    AlreadyPresent,
    /// Fresh clone; `replaced` is true when a previous checkout was removed first.
    Cloned { replaced: bool },
}

#[derive(Debug, Clone)]
pub struct InitReport {
    pub outcome: InitOutcome,
    pub deploy_dir: PathBuf,
    pub artifacts: Vec<ArtifactStatus>,
}

#[derive(Debug, Error)]
#[error("{source}")]
pub struct InitFailure {
    /// A previous checkout was deleted before the failure happened.
    pub removed_existing: bool,
    #[source]
    pub source: DeployError,
}

#[derive(Debug)]
pub struct LifecycleGate {
    layout: DeploymentLayout,
    repo_url: String,
    clone_timeout: Option<Duration>,
    state: LifecycleState,
}

impl LifecycleGate {
    pub fn new(
        layout: DeploymentLayout,
        repo_url: impl Into<String>,
        clone_timeout: Option<Duration>,
    ) -> Self {
        Self {
            layout,
            repo_url: repo_url.into(),
            clone_timeout,
            state: LifecycleState::Uninitialized,
        }
    }

    pub fn layout(&self) -> &DeploymentLayout {
        &self.layout
    }

    /// Current state after re-checking the checkout on disk.
    pub fn state(&mut self) -> LifecycleState {
        if self.state == LifecycleState::Initialized && !self.layout.root().is_dir() {
            log::warn!(
                "Deployment directory {} disappeared; lifecycle reset to uninitialized",
                self.layout.root().display()
            );
            self.state = LifecycleState::Uninitialized;
        }
        self.state
    }

    pub fn require_initialized(&mut self) -> Result<()> {
        match self.state() {
            LifecycleState::Initialized => Ok(()),
            LifecycleState::Uninitialized => Err(DeployError::NotInitialized),
        }
    }

    pub async fn initialize(
        &mut self,
        force: bool,
        runner: &dyn CommandRunner,
        cancel: &CancellationToken,
    ) -> std::result::Result<InitReport, InitFailure> {
        let deploy_dir = self.layout.root().to_path_buf();
        let fail = |removed_existing: bool, source: DeployError| InitFailure {
            removed_existing,
            source,
        };

        let work_dir = deploy_dir
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        std::fs::create_dir_all(&work_dir).map_err(|source| {
            fail(
                false,
                DeployError::Io {
                    context: format!("Failed to create work directory {}", work_dir.display()),
                    source,
                },
            )
        })?;

        let exists = deploy_dir.exists();
        if exists && !force {
            self.state = LifecycleState::Initialized;
            log::info!("Deployment repository already present at {}", deploy_dir.display());
            return Ok(self.report(InitOutcome::AlreadyPresent));
        }

        let mut removed_existing = false;
        if exists {
            std::fs::remove_dir_all(&deploy_dir).map_err(|source| {
                fail(
                    false,
                    DeployError::Io {
                        context: format!("Failed to remove {}", deploy_dir.display()),
                        source,
                    },
                )
            })?;
            removed_existing = true;
            self.state = LifecycleState::Uninitialized;
            log::info!("Removed existing deployment repository at {}", deploy_dir.display());
        }

        let clone = CommandSpec::new("git")
            .arg("clone")
            .arg(&self.repo_url)
            .arg(&deploy_dir)
            .current_dir(&work_dir)
            .timeout(self.clone_timeout);
        let result = match runner.run(&clone, cancel).await {
            Ok(result) if result.success() => result,
            Ok(result) => {
                self.discard_partial_checkout();
                return Err(fail(
                    removed_existing,
                    DeployError::Execution {
                        program: "git clone".to_string(),
                        message: result.diagnostic_output().trim().to_string(),
                    },
                ));
            }
            Err(source) => {
                self.discard_partial_checkout();
                return Err(fail(removed_existing, source));
            }
        };
        log::debug!("git clone: {}", result.diagnostic_output().trim());

        self.state = LifecycleState::Initialized;
        log::info!("Cloned {} into {}", self.repo_url, deploy_dir.display());
        Ok(self.report(InitOutcome::Cloned {
            replaced: removed_existing,
        }))
    }

    /// A killed or failed clone can leave a partial tree that would later pass as a checkout.
    fn discard_partial_checkout(&self) {
        let root = self.layout.root();
        if !root.exists() {
            return;
        }
        match std::fs::remove_dir_all(root) {
            Ok(()) => log::info!("Removed partial checkout at {}", root.display()),
            Err(err) => log::warn!("Failed to remove partial checkout at {}: {err}", root.display()),
        }
    }

    fn report(&self, outcome: InitOutcome) -> InitReport {
        InitReport {
            outcome,
            deploy_dir: self.layout.root().to_path_buf(),
            artifacts: self.layout.artifacts(),
        }
    }
}
