//! MCP tools for ResilientDB deployments

pub(crate) mod catalog;
mod dispatch;
mod schemas;

pub use dispatch::DeployService;
