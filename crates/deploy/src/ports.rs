//! Listening-socket inspection for the deployed services.

use crate::process::CommandSpec;

/// nginx, GraphQL, Crow HTTP, and the KV replicas/client.
pub const RELEVANT_PORTS: [u16; 8] = [80, 8000, 18000, 10001, 10002, 10003, 10004, 10005];

pub fn netstat_command() -> CommandSpec {
    CommandSpec::new("netstat").arg("-tlnp")
}

pub fn ss_command() -> CommandSpec {
    CommandSpec::new("ss").arg("-tlnp")
}

/// `:<port>` needles for substring filtering of socket listings.
pub fn port_tokens() -> Vec<String> {
    RELEVANT_PORTS.iter().map(|port| format!(":{port}")).collect()
}
