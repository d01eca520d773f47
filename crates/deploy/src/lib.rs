//! # ResilientDB deployment engine
//!
//! Process orchestration behind the `rdb-mcp` tool surface.
//!
//! ## Pieces
//!
//! ```text
//! Settings ──> DeploymentLayout
//!                 │
//!                 ├──> LifecycleGate (clone / re-check checkout)
//!                 ├──> ConfigStore   (group_vars/all.yml)
//!                 └──> command builders (playbook, docker, systemd, ports, toolchain)
//!                            │
//!                            └──> CommandRunner ──> CommandResult ──> summary
//!
//! HttpRelay ──> Crow transactions API / GraphQL API
//! ```

mod error;

pub mod config_store;
pub mod docker;
pub mod layout;
pub mod lifecycle;
pub mod playbook;
pub mod ports;
pub mod process;
pub mod relay;
pub mod settings;
pub mod summary;
pub mod systemd;
pub mod toolchain;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use config_store::{ConfigDocument, ConfigStore};
pub use error::{format_duration, DeployError, Result};
pub use layout::{ArtifactStatus, DeploymentLayout};
pub use lifecycle::{InitFailure, InitOutcome, InitReport, LifecycleGate, LifecycleState};
pub use process::{CommandResult, CommandRunner, CommandSpec, SystemRunner};
pub use relay::{HttpRelay, RelayResponse};
pub use settings::Settings;
pub use systemd::{RestartTarget, ServiceName};
