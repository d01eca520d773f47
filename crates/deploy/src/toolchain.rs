//! Host tools the deployment needs, and best-effort installation through the system package
//! manager.

use crate::process::{CommandRunner, CommandSpec};
use crate::summary::first_line;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const VERSION_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Deployment cannot proceed without it.
    Critical,
    Recommended,
    Optional,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    pub program: &'static str,
    pub description: &'static str,
    pub requirement: Requirement,
    /// Whether `<program> --version` is a meaningful probe.
    pub probe_version: bool,
}

pub const DEPENDENCIES: [Dependency; 7] = [
    Dependency {
        program: "git",
        description: "Version control for cloning repositories",
        requirement: Requirement::Critical,
        probe_version: true,
    },
    Dependency {
        program: "ansible",
        description: "Configuration management tool",
        requirement: Requirement::Critical,
        probe_version: true,
    },
    Dependency {
        program: "ansible-playbook",
        description: "Ansible playbook executor",
        requirement: Requirement::Critical,
        probe_version: true,
    },
    Dependency {
        program: "python3",
        description: "Python interpreter",
        requirement: Requirement::Critical,
        probe_version: true,
    },
    Dependency {
        program: "pip",
        description: "Python package manager",
        requirement: Requirement::Recommended,
        probe_version: true,
    },
    Dependency {
        program: "docker",
        description: "Container runtime (optional)",
        requirement: Requirement::Optional,
        probe_version: true,
    },
    Dependency {
        program: "netstat",
        description: "Network diagnostics (optional)",
        requirement: Requirement::Optional,
        probe_version: false,
    },
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyState {
    Installed { version: Option<String> },
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyStatus {
    pub dependency: Dependency,
    pub state: DependencyState,
}

impl DependencyStatus {
    pub fn is_missing(&self) -> bool {
        self.state == DependencyState::Missing
    }
}

/// PATH lookup for every dependency, plus a bounded `--version` probe for installed ones.
pub async fn check_dependencies(
    runner: &dyn CommandRunner,
    cancel: &CancellationToken,
) -> Vec<DependencyStatus> {
    let mut statuses = Vec::with_capacity(DEPENDENCIES.len());
    for dependency in DEPENDENCIES {
        let state = if runner.which(dependency.program).is_none() {
            DependencyState::Missing
        } else if dependency.probe_version {
            DependencyState::Installed {
                version: probe_version(runner, dependency.program, cancel).await,
            }
        } else {
            DependencyState::Installed { version: None }
        };
        statuses.push(DependencyStatus { dependency, state });
    }
    statuses
}

async fn probe_version(
    runner: &dyn CommandRunner,
    program: &str,
    cancel: &CancellationToken,
) -> Option<String> {
    let spec = CommandSpec::new(program)
        .arg("--version")
        .timeout(Some(VERSION_PROBE_TIMEOUT));
    match runner.run(&spec, cancel).await {
        Ok(result) => {
            let line = first_line(&result.stdout);
            (!line.is_empty()).then(|| line.to_string())
        }
        Err(err) => {
            log::debug!("version probe for {program} failed: {err}");
            None
        }
    }
}

pub fn missing_with(statuses: &[DependencyStatus], requirement: Requirement) -> Vec<&'static str> {
    statuses
        .iter()
        .filter(|s| s.is_missing() && s.dependency.requirement == requirement)
        .map(|s| s.dependency.program)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageManager {
    Apt,
    Dnf,
    Yum,
    Brew,
}

impl PackageManager {
    const PREFERENCE: [PackageManager; 4] = [
        PackageManager::Apt,
        PackageManager::Dnf,
        PackageManager::Yum,
        PackageManager::Brew,
    ];

    pub fn detect(runner: &dyn CommandRunner) -> Option<Self> {
        Self::PREFERENCE
            .into_iter()
            .find(|pm| runner.which(pm.program()).is_some())
    }

    pub fn program(self) -> &'static str {
        match self {
            PackageManager::Apt => "apt-get",
            PackageManager::Dnf => "dnf",
            PackageManager::Yum => "yum",
            PackageManager::Brew => "brew",
        }
    }

    /// Distribution package providing `program`; `None` when it ships with another package.
    pub fn package_for(self, program: &str) -> Option<&'static str> {
        match (self, program) {
            (_, "git") => Some("git"),
            (_, "ansible" | "ansible-playbook") => Some("ansible"),
            (PackageManager::Brew, "python3") => Some("python"),
            (_, "python3") => Some("python3"),
            (PackageManager::Brew, "pip") => None,
            (_, "pip") => Some("python3-pip"),
            (PackageManager::Brew, "docker") => Some("docker"),
            (PackageManager::Apt, "docker") => Some("docker.io"),
            (_, "docker") => Some("docker"),
            (PackageManager::Brew, "netstat") => None,
            (_, "netstat") => Some("net-tools"),
            _ => None,
        }
    }

    /// Commands to install `programs`, in order. Homebrew refuses to run under sudo.
    pub fn install_plan(
        self,
        programs: &[&str],
        use_sudo: bool,
        timeout: Option<Duration>,
    ) -> Vec<CommandSpec> {
        let mut packages: Vec<&'static str> = Vec::new();
        for program in programs {
            if let Some(package) = self.package_for(program) {
                if !packages.contains(&package) {
                    packages.push(package);
                }
            }
        }
        if packages.is_empty() {
            return Vec::new();
        }

        let sudo = use_sudo && self != PackageManager::Brew;
        let elevate = |args: Vec<&str>| -> CommandSpec {
            let mut argv = args.into_iter();
            let spec = if sudo {
                CommandSpec::new("sudo").args(argv)
            } else {
                let program = argv.next().unwrap_or_default();
                CommandSpec::new(program).args(argv)
            };
            spec.timeout(timeout)
        };

        let mut plan = Vec::new();
        match self {
            PackageManager::Apt => {
                plan.push(elevate(vec!["apt-get", "update"]));
                let mut args = vec!["apt-get", "install", "-y"];
                args.extend(packages.iter().copied());
                plan.push(elevate(args));
            }
            PackageManager::Dnf | PackageManager::Yum => {
                let mut args = vec![self.program(), "install", "-y"];
                args.extend(packages.iter().copied());
                plan.push(elevate(args));
            }
            PackageManager::Brew => {
                let mut args = vec!["brew", "install"];
                args.extend(packages.iter().copied());
                plan.push(elevate(args));
            }
        }
        plan
    }
}
