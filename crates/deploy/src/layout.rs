use std::path::{Path, PathBuf};

/// Fixed relative paths inside the deployment repository checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentLayout {
    root: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactStatus {
    pub label: &'static str,
    pub path: PathBuf,
    pub present: bool,
}

impl DeploymentLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn playbook(&self) -> PathBuf {
        self.root.join("site.yml")
    }

    pub fn inventory(&self) -> PathBuf {
        self.root.join("inventories/production/hosts")
    }

    pub fn dockerfile(&self) -> PathBuf {
        self.root.join("dockerfile")
    }

    pub fn startup_script(&self) -> PathBuf {
        self.root.join("complete-startup.sh")
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join("inventories/production/group_vars/all.yml")
    }

    /// Advisory presence check of the files the deployment tools rely on.
    pub fn artifacts(&self) -> Vec<ArtifactStatus> {
        [
            ("Playbook", self.playbook()),
            ("Inventory", self.inventory()),
            ("Dockerfile", self.dockerfile()),
            ("Complete startup script", self.startup_script()),
        ]
        .into_iter()
        .map(|(label, path)| ArtifactStatus {
            label,
            present: path.exists(),
            path,
        })
        .collect()
    }
}
