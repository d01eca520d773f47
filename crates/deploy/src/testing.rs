//! Scripted [`CommandRunner`] for exercising orchestration without touching the host.

use crate::error::{DeployError, Result};
use crate::process::{CommandResult, CommandRunner, CommandSpec};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

type Handler = Box<dyn Fn(&CommandSpec) -> Result<CommandResult> + Send + Sync>;

/// Programs default to "installed, exits 0 with no output". Register handlers with [`on`]
/// and mark binaries absent with [`without`]. Every `run` call is recorded.
///
/// [`on`]: ScriptedRunner::on
/// [`without`]: ScriptedRunner::without
#[derive(Default)]
pub struct ScriptedRunner {
    handlers: HashMap<String, Handler>,
    missing: HashSet<String>,
    calls: Mutex<Vec<CommandSpec>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(
        mut self,
        program: &str,
        handler: impl Fn(&CommandSpec) -> Result<CommandResult> + Send + Sync + 'static,
    ) -> Self {
        self.handlers.insert(program.to_string(), Box::new(handler));
        self
    }

    pub fn without(mut self, program: &str) -> Self {
        self.missing.insert(program.to_string());
        self
    }

    /// `git clone <url> <dir>` creates `<dir>/.git` and succeeds; other git calls report a
    /// version.
    pub fn simulate_git_clone(self) -> Self {
        self.on("git", |spec| {
            if spec.args.first().map(String::as_str) != Some("clone") {
                return Ok(exited(0, "git version 2.43.0\n", ""));
            }
            if let Some(target) = spec.args.last() {
                let target = PathBuf::from(target);
                std::fs::create_dir_all(target.join(".git")).map_err(|source| {
                    DeployError::Io {
                        context: "simulated clone".to_string(),
                        source,
                    }
                })?;
            }
            Ok(exited(0, "", "Cloning into 'incubator-resilientdb-ansible'...\n"))
        })
    }

    pub fn calls(&self) -> Vec<CommandSpec> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls().into_iter().map(|spec| spec.program).collect()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, spec: &CommandSpec, _cancel: &CancellationToken) -> Result<CommandResult> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(spec.clone());
        }
        if self.missing.contains(&spec.program) {
            return Err(DeployError::BinaryNotFound {
                program: spec.program.clone(),
            });
        }
        match self.handlers.get(&spec.program) {
            Some(handler) => handler(spec),
            None => Ok(CommandResult::default()),
        }
    }

    fn which(&self, program: &str) -> Option<PathBuf> {
        (!self.missing.contains(program)).then(|| PathBuf::from("/usr/bin").join(program))
    }
}

pub fn exited(exit_code: i32, stdout: &str, stderr: &str) -> CommandResult {
    CommandResult {
        exit_code,
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
        timed_out: false,
    }
}
