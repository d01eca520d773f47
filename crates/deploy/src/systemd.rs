//! systemd units installed by the playbook, and the `systemctl`/`journalctl` calls against them.

use crate::process::CommandSpec;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum ServiceName {
    #[serde(rename = "resilientdb-kv@1")]
    Kv1,
    #[serde(rename = "resilientdb-kv@2")]
    Kv2,
    #[serde(rename = "resilientdb-kv@3")]
    Kv3,
    #[serde(rename = "resilientdb-kv@4")]
    Kv4,
    #[serde(rename = "resilientdb-client")]
    Client,
    #[serde(rename = "crow-http")]
    CrowHttp,
    #[serde(rename = "graphql")]
    Graphql,
    #[serde(rename = "nginx")]
    Nginx,
}

impl ServiceName {
    /// Declaration order; used for tool schemas.
    pub const ALL: [ServiceName; 8] = [
        ServiceName::Kv1,
        ServiceName::Kv2,
        ServiceName::Kv3,
        ServiceName::Kv4,
        ServiceName::Client,
        ServiceName::CrowHttp,
        ServiceName::Graphql,
        ServiceName::Nginx,
    ];

    /// Front-to-back order used for status reports and bulk restarts.
    pub const STATUS_ORDER: [ServiceName; 8] = [
        ServiceName::Nginx,
        ServiceName::CrowHttp,
        ServiceName::Graphql,
        ServiceName::Client,
        ServiceName::Kv1,
        ServiceName::Kv2,
        ServiceName::Kv3,
        ServiceName::Kv4,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceName::Kv1 => "resilientdb-kv@1",
            ServiceName::Kv2 => "resilientdb-kv@2",
            ServiceName::Kv3 => "resilientdb-kv@3",
            ServiceName::Kv4 => "resilientdb-kv@4",
            ServiceName::Client => "resilientdb-client",
            ServiceName::CrowHttp => "crow-http",
            ServiceName::Graphql => "graphql",
            ServiceName::Nginx => "nginx",
        }
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServiceName::ALL
            .into_iter()
            .find(|svc| svc.as_str() == s)
            .ok_or_else(|| format!("unknown service {s:?}"))
    }
}

/// A restart target: one unit or every unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RestartTarget {
    All(AllServices),
    One(ServiceName),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllServices {
    All,
}

impl RestartTarget {
    pub fn services(self) -> Vec<ServiceName> {
        match self {
            RestartTarget::All(_) => ServiceName::STATUS_ORDER.to_vec(),
            RestartTarget::One(svc) => vec![svc],
        }
    }
}

pub fn is_active_command(service: ServiceName) -> CommandSpec {
    CommandSpec::new("systemctl").args(["is-active", service.as_str()])
}

pub fn restart_command(service: ServiceName) -> CommandSpec {
    CommandSpec::new("systemctl").args(["restart", service.as_str()])
}

pub fn journal_command(service: ServiceName, lines: u32) -> CommandSpec {
    CommandSpec::new("journalctl")
        .args(["-u", service.as_str(), "-n"])
        .arg(lines.to_string())
        .arg("--no-pager")
}
