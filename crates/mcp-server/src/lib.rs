//! ResilientDB deployment MCP server
//!
//! Lets an agent drive a ResilientDB deployment end to end over MCP stdio: fetch the
//! Ansible deployment repository, provision with the playbook or the container image,
//! operate the systemd services, and relay the Crow and GraphQL APIs.
//!
//! ## Usage
//!
//! Add to your MCP client configuration:
//! ```json
//! {
//!   "mcpServers": {
//!     "resilientdb": {
//!       "command": "rdb-mcp"
//!     }
//!   }
//! }
//! ```

use anyhow::{Context as AnyhowContext, Result};
use rdb_deploy::Settings;
use rmcp::transport::stdio;
use rmcp::ServiceExt;

mod tools;

pub use tools::DeployService;

pub async fn main_entry() -> Result<()> {
    // stdout carries the MCP protocol; logs go to stderr only.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    let settings = Settings::from_env();
    log::info!(
        "Starting ResilientDB MCP server (deployment dir {})",
        settings.deploy_dir().display()
    );

    let service = DeployService::new(settings).context("build deploy service")?;
    let server = service.serve(stdio()).await?;
    server.waiting().await?;

    log::info!("ResilientDB MCP server stopped");
    Ok(())
}
