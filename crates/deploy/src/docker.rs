//! Container image build/run for the all-in-one deployment.

use crate::layout::DeploymentLayout;
use crate::process::CommandSpec;

pub const DEFAULT_IMAGE_TAG: &str = "resilientdb-ansible:latest";
pub const CONTAINER_NAME: &str = "resilientdb-container";

/// Host ports published by the container: nginx, Crow HTTP, GraphQL.
pub const PUBLISHED_PORTS: [u16; 3] = [80, 18000, 8000];

/// systemd inside the container needs the host cgroup tree and runtime dirs.
const BIND_MOUNTS: [&str; 3] = ["/sys/fs/cgroup:/sys/fs/cgroup:ro", "/tmp:/tmp", "/run:/run"];

pub fn build_command(layout: &DeploymentLayout, tag: &str) -> CommandSpec {
    CommandSpec::new("docker")
        .args(["build", "-t", tag])
        .arg(layout.root())
        .current_dir(layout.root())
}

pub fn run_command(tag: &str, detach: bool) -> CommandSpec {
    let mut spec = CommandSpec::new("docker").args(["run", "--privileged"]);
    for mount in BIND_MOUNTS {
        spec = spec.args(["-v", mount]);
    }
    for port in PUBLISHED_PORTS {
        spec = spec.arg("-p").arg(format!("{port}:{port}"));
    }
    spec = spec.args(["--name", CONTAINER_NAME]);
    if detach {
        spec = spec.arg("-d");
    }
    spec.arg(tag)
}

/// Shell recipe for clearing a stale container with our fixed name.
pub fn remove_container_hint() -> String {
    format!("docker stop {CONTAINER_NAME} && docker rm {CONTAINER_NAME}")
}

/// `docker run -d` prints the full id; operators only need the short form.
pub fn short_container_id(stdout: &str) -> &str {
    let id = stdout.trim();
    match id.char_indices().nth(12) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}
