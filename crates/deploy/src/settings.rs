use anyhow::{Context as AnyhowContext, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::layout::DeploymentLayout;

pub const DEFAULT_REPO_URL: &str = "https://github.com/apache/incubator-resilientdb-ansible.git";
pub const DEFAULT_CROW_BASE_URL: &str = "http://localhost:18000";
pub const DEFAULT_GRAPHQL_URL: &str = "http://localhost:8000/graphql";
pub const DEFAULT_NGINX_URL: &str = "http://localhost";

const WORK_DIR_NAME: &str = ".resilientdb-mcp";
const DEFAULT_COMMAND_TIMEOUT_SECS: u64 = 30 * 60;
const DEFAULT_QUICK_DEPLOY_TIMEOUT_SECS: u64 = 5 * 60;

/// Runtime settings: defaults, then an optional TOML file (`RDB_MCP_CONFIG`), then env vars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub repo_url: String,
    pub work_dir: PathBuf,
    pub crow_base_url: String,
    pub graphql_url: String,
    /// Deadline applied to every external command that has no explicit budget.
    /// `None` means unbounded.
    pub command_timeout: Option<Duration>,
    pub quick_deploy_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            repo_url: DEFAULT_REPO_URL.to_string(),
            work_dir: home.join(WORK_DIR_NAME),
            crow_base_url: DEFAULT_CROW_BASE_URL.to_string(),
            graphql_url: DEFAULT_GRAPHQL_URL.to_string(),
            command_timeout: Some(Duration::from_secs(DEFAULT_COMMAND_TIMEOUT_SECS)),
            quick_deploy_timeout: Duration::from_secs(DEFAULT_QUICK_DEPLOY_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    repo_url: Option<String>,
    work_dir: Option<PathBuf>,
    crow_base_url: Option<String>,
    graphql_url: Option<String>,
    command_timeout_secs: Option<u64>,
    quick_deploy_timeout_secs: Option<u64>,
}

impl Settings {
    /// An unreadable or invalid settings file is logged and skipped; startup never fails here.
    pub fn from_env() -> Self {
        Self::from_lookup(env_value)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();
        if let Some(path) = lookup("RDB_MCP_CONFIG") {
            if let Err(err) = settings.apply_file(Path::new(&path)) {
                log::warn!("Ignoring RDB_MCP_CONFIG: {err:#}");
            }
        }
        settings.apply_env_with(lookup);
        settings
    }

    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = work_dir.into();
        self
    }

    /// Local checkout of the deployment repository.
    pub fn deploy_dir(&self) -> PathBuf {
        self.work_dir.join(repo_dir_name(&self.repo_url))
    }

    pub fn layout(&self) -> DeploymentLayout {
        DeploymentLayout::new(self.deploy_dir())
    }

    fn apply_file(&mut self, path: &Path) -> Result<()> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let file: SettingsFile = toml::from_str(&raw)
            .with_context(|| format!("Invalid settings file {}", path.display()))?;

        if let Some(value) = file.repo_url {
            self.repo_url = value;
        }
        if let Some(value) = file.work_dir {
            self.work_dir = value;
        }
        if let Some(value) = file.crow_base_url {
            self.crow_base_url = value;
        }
        if let Some(value) = file.graphql_url {
            self.graphql_url = value;
        }
        if let Some(secs) = file.command_timeout_secs {
            self.command_timeout = timeout_from_secs(secs);
        }
        if let Some(secs) = file.quick_deploy_timeout_secs {
            self.quick_deploy_timeout = Duration::from_secs(secs.max(1));
        }
        Ok(())
    }

    fn apply_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup("RDB_MCP_REPO_URL") {
            self.repo_url = value;
        }
        if let Some(value) = lookup("RDB_MCP_WORK_DIR") {
            self.work_dir = PathBuf::from(value);
        }
        if let Some(value) = lookup("RDB_MCP_CROW_URL") {
            self.crow_base_url = value;
        }
        if let Some(value) = lookup("RDB_MCP_GRAPHQL_URL") {
            self.graphql_url = value;
        }
        if let Some(secs) = parse_secs(&lookup, "RDB_MCP_COMMAND_TIMEOUT_SECS") {
            self.command_timeout = timeout_from_secs(secs);
        }
        if let Some(secs) = parse_secs(&lookup, "RDB_MCP_QUICK_DEPLOY_TIMEOUT_SECS") {
            self.quick_deploy_timeout = Duration::from_secs(secs.max(1));
        }
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_secs(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<u64> {
    let raw = lookup(key)?;
    match raw.parse::<u64>() {
        Ok(secs) => Some(secs),
        Err(_) => {
            log::warn!("Ignoring {key}={raw:?}: expected a whole number of seconds");
            None
        }
    }
}

fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// `https://host/org/name.git` -> `name`
fn repo_dir_name(repo_url: &str) -> String {
    let tail = repo_url
        .trim_end_matches('/')
        .rsplit(['/', ':'])
        .next()
        .unwrap_or_default();
    let name = tail.strip_suffix(".git").unwrap_or(tail);
    if name.is_empty() {
        "deployment".to_string()
    } else {
        name.to_string()
    }
}
