//! `ansible-playbook` invocation against the production inventory.

use crate::layout::DeploymentLayout;
use crate::process::CommandSpec;

/// Tag/limit value meaning "no filter".
pub const ALL: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybookRun {
    /// Comma-separated tag filter.
    pub tags: String,
    pub limit: String,
    /// Dry run (`--check`).
    pub check: bool,
}

impl Default for PlaybookRun {
    fn default() -> Self {
        Self {
            tags: ALL.to_string(),
            limit: ALL.to_string(),
            check: false,
        }
    }
}

impl PlaybookRun {
    pub fn command(&self, layout: &DeploymentLayout) -> CommandSpec {
        let mut spec = CommandSpec::new("ansible-playbook")
            .arg(layout.playbook())
            .arg("-i")
            .arg(layout.inventory())
            .args(["--tags", self.tags.as_str()]);
        if self.limit != ALL {
            spec = spec.args(["--limit", self.limit.as_str()]);
        }
        if self.check {
            spec = spec.arg("--check");
        }
        spec.current_dir(layout.root())
    }
}
