use super::{DeployService, Outcome};
use crate::tools::catalog::{self, TOOL_CATALOG};
use crate::tools::schemas::{api, deploy, diagnostics, lifecycle, services};
use pretty_assertions::assert_eq;
use rdb_deploy::testing::{exited, ScriptedRunner};
use rdb_deploy::{CommandResult, CommandRunner, DeployError, Settings};
use rmcp::schemars;
use serde_json::{json, Value};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const NOT_INITIALIZED: &str =
    "Environment not initialized. Please run 'initialize_environment' first";

const SAMPLE_CONFIG: &str = "\
components:
  - resilientdb
  - crow
bazel_version: 6.0.0
java_home_map:
  amd64: /usr/lib/jvm/java-11-openjdk-amd64
crow_port: 18000
nginx_server_name: localhost
graphql_port: 8000
";

struct Harness {
    _dir: tempfile::TempDir,
    service: DeployService,
    runner: Arc<ScriptedRunner>,
    deploy_dir: PathBuf,
}

impl Harness {
    fn new(runner: ScriptedRunner) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let settings = Settings::default().with_work_dir(dir.path().join("work"));
        let deploy_dir = settings.deploy_dir();
        let runner = Arc::new(runner);
        let service =
            DeployService::with_runner(settings, Arc::clone(&runner) as Arc<dyn CommandRunner>)
                .expect("service");
        Self {
            _dir: dir,
            service,
            runner,
            deploy_dir,
        }
    }

    /// Checkout already on disk, so `initialize_environment` takes the idempotent path.
    fn with_checkout(runner: ScriptedRunner, files: &[(&str, &str)]) -> Self {
        let harness = Self::new(runner);
        std::fs::create_dir_all(&harness.deploy_dir).expect("mkdir checkout");
        for (relative, contents) in files {
            let path = harness.deploy_dir.join(relative);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).expect("mkdir parent");
            }
            std::fs::write(path, contents).expect("write fixture file");
        }
        harness
    }

    async fn call(&self, name: &str, args: Value) -> Outcome {
        self.service
            .invoke(name, args.as_object().cloned(), &CancellationToken::new())
            .await
    }

    async fn initialize(&self) {
        let outcome = self.call("initialize_environment", json!({})).await;
        assert!(!outcome.is_error, "initialize failed: {}", outcome.text);
    }

    fn config_path(&self) -> PathBuf {
        self.deploy_dir
            .join("inventories/production/group_vars/all.yml")
    }
}

fn arg_after<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|idx| args.get(idx + 1))
        .map(String::as_str)
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

#[tokio::test]
async fn unknown_tool_yields_literal_text() {
    let harness = Harness::new(ScriptedRunner::new());
    let outcome = harness.call("deploy_everything", json!({})).await;
    assert_eq!(outcome.text, "Unknown tool: deploy_everything");
    assert!(outcome.is_error);
    assert!(harness.runner.calls().is_empty());
}

#[tokio::test]
async fn gated_tools_are_blocked_before_initialize_without_side_effects() {
    let harness = Harness::new(ScriptedRunner::new());
    let calls = [
        ("run_playbook", json!({})),
        ("quick_deploy", json!({})),
        ("docker_build", json!({})),
        ("view_config", json!({"component": "all"})),
        ("update_config", json!({"key": "crow_port", "value": "1"})),
    ];
    for (name, args) in calls {
        let outcome = harness.call(name, args).await;
        assert_eq!(outcome.text, NOT_INITIALIZED, "{name}");
        assert!(outcome.is_error, "{name}");
    }
    assert!(harness.runner.calls().is_empty());
    assert!(!harness.config_path().exists());
}

#[tokio::test]
async fn gate_answers_before_argument_validation() {
    let harness = Harness::new(ScriptedRunner::new().simulate_git_clone());
    let bad_calls = [
        ("view_config", json!({"component": "postgres"})),
        ("run_playbook", json!({"check": "yes"})),
        ("update_config", json!({})),
    ];
    for (name, args) in bad_calls.clone() {
        let outcome = harness.call(name, args).await;
        assert_eq!(outcome.text, NOT_INITIALIZED, "{name}");
        assert!(outcome.is_error, "{name}");
    }
    assert!(harness.runner.calls().is_empty());

    harness.initialize().await;
    for (name, args) in bad_calls {
        let outcome = harness.call(name, args).await;
        assert!(outcome.is_error, "{name}");
        assert!(
            outcome
                .text
                .starts_with(&format!("Invalid arguments for tool '{name}'")),
            "{name}: {}",
            outcome.text
        );
    }
}

#[tokio::test]
async fn view_config_is_blocked_before_initialize_even_when_file_exists() {
    let harness = Harness::with_checkout(
        ScriptedRunner::new(),
        &[("inventories/production/group_vars/all.yml", SAMPLE_CONFIG)],
    );
    let outcome = harness.call("view_config", json!({"component": "crow"})).await;
    assert_eq!(outcome.text, NOT_INITIALIZED);

    harness.initialize().await;
    let outcome = harness.call("view_config", json!({"component": "crow"})).await;
    assert!(!outcome.is_error, "{}", outcome.text);
    assert!(outcome.text.starts_with("Configuration for crow:\n"));
}

#[tokio::test]
async fn initialize_is_idempotent_without_force() {
    let harness = Harness::new(ScriptedRunner::new().simulate_git_clone());
    let dir = display(&harness.deploy_dir);

    let first = harness.call("initialize_environment", json!({})).await;
    assert!(!first.is_error, "{}", first.text);
    assert!(first
        .text
        .starts_with(&format!("Successfully cloned repository to {dir}")));

    let second = harness
        .call("initialize_environment", json!({"force": false}))
        .await;
    assert!(second
        .text
        .starts_with(&format!("Repository already exists at {dir}")));
    assert_eq!(harness.runner.programs(), vec!["git".to_string()]);
}

#[tokio::test]
async fn force_initialize_removes_and_reclones() {
    let harness = Harness::with_checkout(
        ScriptedRunner::new().simulate_git_clone(),
        &[("stale.txt", "old")],
    );
    let outcome = harness
        .call("initialize_environment", json!({"force": true}))
        .await;
    assert!(!outcome.is_error, "{}", outcome.text);
    let lines: Vec<&str> = outcome.text.lines().collect();
    assert_eq!(lines[0], "Removed existing repository");
    assert!(lines[1].starts_with("Successfully cloned repository to"));
    assert!(!harness.deploy_dir.join("stale.txt").exists());
    assert!(harness.deploy_dir.join(".git").is_dir());
}

#[tokio::test]
async fn failed_clone_leaves_environment_uninitialized() {
    let runner = ScriptedRunner::new().on("git", |_| {
        Ok(exited(128, "", "fatal: repository not found\n"))
    });
    let harness = Harness::new(runner);

    let outcome = harness.call("initialize_environment", json!({})).await;
    assert!(outcome.is_error);
    assert_eq!(
        outcome.text,
        "Failed to clone repository: fatal: repository not found"
    );

    let blocked = harness.call("run_playbook", json!({})).await;
    assert_eq!(blocked.text, NOT_INITIALIZED);
}

#[tokio::test]
async fn missing_git_points_at_install_dependencies() {
    let harness = Harness::new(ScriptedRunner::new().without("git"));
    let outcome = harness.call("initialize_environment", json!({})).await;
    assert!(outcome.is_error);
    assert_eq!(
        outcome.text,
        "Error: git is not installed. Please run 'install_dependencies' first"
    );
}

#[tokio::test]
async fn fresh_environment_reports_missing_playbook_without_running_ansible() {
    let harness = Harness::new(ScriptedRunner::new().simulate_git_clone());

    let init = harness.call("initialize_environment", json!({})).await;
    let playbook = harness.deploy_dir.join("site.yml");
    assert!(init
        .text
        .contains(&format!("Playbook missing: {}", display(&playbook))));
    assert!(init.text.contains("Complete startup script missing:"));

    let deps = harness.call("check_dependencies", json!({})).await;
    assert!(!deps.is_error);
    assert!(deps.text.starts_with("git: git version 2.43.0\n"), "{}", deps.text);
    assert!(deps.text.ends_with("\nAll critical dependencies are installed!"));

    let calls_before = harness.runner.calls().len();
    let run = harness.call("run_playbook", json!({})).await;
    assert!(run.is_error);
    assert_eq!(
        run.text,
        format!("Playbook not found at {}", display(&playbook))
    );
    assert_eq!(harness.runner.calls().len(), calls_before);
    assert!(harness
        .runner
        .calls()
        .iter()
        .filter(|spec| spec.program == "ansible-playbook")
        .all(|spec| spec.args == ["--version"]));
}

#[tokio::test]
async fn check_dependencies_flags_missing_critical_tools() {
    let runner = ScriptedRunner::new()
        .without("ansible")
        .without("docker")
        .on("git", |_| Ok(exited(0, "git version 2.43.0\n", "")));
    let harness = Harness::new(runner);
    let outcome = harness.call("check_dependencies", json!({})).await;
    let text = outcome.text;
    assert!(text.contains("git: git version 2.43.0\n"), "{text}");
    assert!(text.contains("ansible: NOT FOUND - Configuration management tool"));
    assert!(text.contains("docker: NOT FOUND - Container runtime (optional)"));
    assert!(text.ends_with(
        "\nMissing critical dependencies: ansible\n\
         Run 'install_dependencies' to attempt automatic installation"
    ));
}

#[tokio::test]
async fn run_playbook_reports_recap_summary() {
    let stdout = "\
PLAY [all] *****
TASK [resilientdb : build] *****
changed: [node1]

PLAY RECAP *****
node1 : ok=12 changed=4 unreachable=0 failed=0
";
    let runner = ScriptedRunner::new().on("ansible-playbook", move |_| Ok(exited(0, stdout, "")));
    let harness = Harness::with_checkout(runner, &[("site.yml", "- hosts: all\n")]);
    harness.initialize().await;

    let outcome = harness
        .call(
            "run_playbook",
            json!({"tags": "crow,graphql", "limit": "node1", "check": true}),
        )
        .await;
    assert!(!outcome.is_error, "{}", outcome.text);
    assert_eq!(
        outcome.text,
        "Playbook executed successfully!\n\n=== DEPLOYMENT SUMMARY ===\n\
         node1 : ok=12 changed=4 unreachable=0 failed=0"
    );

    let calls = harness.runner.calls();
    let spec = calls
        .iter()
        .find(|spec| spec.program == "ansible-playbook")
        .expect("ansible-playbook ran");
    assert_eq!(arg_after(&spec.args, "--tags"), Some("crow,graphql"));
    assert_eq!(arg_after(&spec.args, "--limit"), Some("node1"));
    assert!(spec.args.iter().any(|arg| arg == "--check"));
    assert_eq!(spec.cwd.as_deref(), Some(harness.deploy_dir.as_path()));
}

#[tokio::test]
async fn failed_playbook_prefers_stderr_excerpt() {
    let runner = ScriptedRunner::new().on("ansible-playbook", |_| {
        Ok(exited(2, "PLAY RECAP\nnode1 : ok=1 failed=1\n", "ERROR! role not found\n"))
    });
    let harness = Harness::with_checkout(runner, &[("site.yml", "- hosts: all\n")]);
    harness.initialize().await;

    let outcome = harness.call("run_playbook", json!({})).await;
    assert!(outcome.is_error);
    assert_eq!(
        outcome.text,
        "Playbook failed:\nERROR! role not found\n\n\n=== DEPLOYMENT SUMMARY ===\nnode1 : ok=1 failed=1"
    );
}

#[tokio::test]
async fn quick_deploy_timeout_is_reported_in_minutes() {
    let runner = ScriptedRunner::new().on("bash", |spec| {
        Err(DeployError::TimedOut {
            program: spec.program.clone(),
            after: spec.timeout.unwrap_or_default(),
            partial: CommandResult::default(),
        })
    });
    let harness = Harness::with_checkout(runner, &[("complete-startup.sh", "#!/bin/bash\n")]);
    harness.initialize().await;

    let outcome = harness.call("quick_deploy", json!({})).await;
    assert!(outcome.is_error);
    assert_eq!(
        outcome.text,
        "Deployment timed out after 5 minutes. Services may still be starting."
    );
}

#[tokio::test]
async fn quick_deploy_detects_completion_marker() {
    let runner = ScriptedRunner::new().on("bash", |_| {
        Ok(exited(0, "starting kv...\nAll services started\n", ""))
    });
    let harness = Harness::with_checkout(runner, &[("complete-startup.sh", "#!/bin/bash\n")]);
    harness.initialize().await;

    let outcome = harness.call("quick_deploy", json!({})).await;
    assert!(!outcome.is_error, "{}", outcome.text);
    assert!(outcome
        .text
        .starts_with("Quick deployment completed successfully!\nstarting kv..."));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(harness.deploy_dir.join("complete-startup.sh"))
            .expect("script metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}

#[tokio::test]
async fn docker_build_requires_dockerfile_then_builds() {
    let harness = Harness::with_checkout(ScriptedRunner::new(), &[]);
    harness.initialize().await;
    let outcome = harness.call("docker_build", json!({})).await;
    assert_eq!(
        outcome.text,
        format!(
            "Dockerfile not found at {}",
            display(&harness.deploy_dir.join("dockerfile"))
        )
    );

    std::fs::write(harness.deploy_dir.join("dockerfile"), "FROM ubuntu:22.04\n")
        .expect("write dockerfile");
    let outcome = harness
        .call("docker_build", json!({"tag": "rdb:test"}))
        .await;
    assert_eq!(outcome.text, "Docker image built successfully: rdb:test");
}

#[tokio::test]
async fn docker_run_explains_name_conflicts() {
    let runner = ScriptedRunner::new().on("docker", |_| {
        Ok(exited(
            125,
            "",
            "docker: Error response from daemon: Conflict. The container name \
             \"/resilientdb-container\" is already in use by container \"4f1c\".\n",
        ))
    });
    let harness = Harness::new(runner);
    let outcome = harness.call("docker_run", json!({})).await;
    assert!(outcome.is_error);
    assert_eq!(
        outcome.text,
        "Container name already in use. Stop existing container first:\n\
         docker stop resilientdb-container && docker rm resilientdb-container"
    );
}

#[tokio::test]
async fn docker_run_prints_short_id_and_endpoints() {
    let runner = ScriptedRunner::new().on("docker", |_| {
        Ok(exited(0, "4f1c2d3e4b5a6978ffeeddccbbaa\n", ""))
    });
    let harness = Harness::new(runner);
    let outcome = harness.call("docker_run", json!({"detach": true})).await;
    assert!(!outcome.is_error, "{}", outcome.text);
    assert_eq!(
        outcome.text,
        "Container started successfully: 4f1c2d3e4b5a\n\
         Access services at:\n\
         - Nginx: http://localhost\n\
         - GraphQL: http://localhost:8000/graphql\n\
         - Crow API: http://localhost:18000"
    );
}

#[tokio::test]
async fn check_services_marks_active_units() {
    let runner = ScriptedRunner::new().on("systemctl", |spec| {
        let unit = spec.args.get(1).map(String::as_str).unwrap_or_default();
        let status = if unit == "nginx" { "active\n" } else { "inactive\n" };
        Ok(exited(if unit == "nginx" { 0 } else { 3 }, status, ""))
    });
    let harness = Harness::new(runner);
    let outcome = harness.call("check_services", json!({})).await;
    let lines: Vec<&str> = outcome.text.lines().collect();
    assert_eq!(lines.len(), 9);
    assert_eq!(lines[0], "Service Status:");
    assert_eq!(lines[1], "✓ nginx: active");
    assert_eq!(lines[2], "✗ crow-http: inactive");
    assert_eq!(lines[8], "✗ resilientdb-kv@4: inactive");
}

#[tokio::test]
async fn restart_all_reports_each_unit() {
    let runner = ScriptedRunner::new().on("systemctl", |spec| {
        if spec.args.get(1).map(String::as_str) == Some("graphql") {
            Ok(exited(1, "", "Job for graphql.service failed.\n"))
        } else {
            Ok(exited(0, "", ""))
        }
    });
    let harness = Harness::new(runner);
    let outcome = harness.call("restart_service", json!({"service": "all"})).await;
    assert!(outcome.is_error);
    let lines: Vec<&str> = outcome.text.lines().collect();
    assert_eq!(lines.len(), 8);
    assert_eq!(lines[0], "Restarted nginx");
    assert_eq!(lines[2], "Failed to restart graphql: Job for graphql.service failed.");
    assert_eq!(lines[7], "Restarted resilientdb-kv@4");
}

#[tokio::test]
async fn restart_single_unit() {
    let harness = Harness::new(ScriptedRunner::new());
    let outcome = harness
        .call("restart_service", json!({"service": "crow-http"}))
        .await;
    assert_eq!(outcome.text, "Service crow-http restarted successfully");
    let calls = harness.runner.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].display(), "systemctl restart crow-http");
}

#[tokio::test]
async fn view_logs_uses_default_line_count() {
    let runner = ScriptedRunner::new().on("journalctl", |_| Ok(exited(0, "line a\nline b\n", "")));
    let harness = Harness::new(runner);
    let outcome = harness
        .call("view_logs", json!({"service": "resilientdb-kv@1"}))
        .await;
    assert_eq!(
        outcome.text,
        "=== Last 50 lines of resilientdb-kv@1 logs ===\nline a\nline b\n"
    );
    assert_eq!(
        harness.runner.calls()[0].display(),
        "journalctl -u resilientdb-kv@1 -n 50 --no-pager"
    );
}

#[tokio::test]
async fn invalid_arguments_are_reported_not_executed() {
    let harness = Harness::new(ScriptedRunner::new());

    let outcome = harness.call("restart_service", json!({})).await;
    assert!(outcome.is_error);
    assert!(
        outcome
            .text
            .starts_with("Invalid arguments for tool 'restart_service': missing field `service`"),
        "{}",
        outcome.text
    );

    let outcome = harness
        .call("view_logs", json!({"service": "redis"}))
        .await;
    assert!(outcome.is_error);
    assert!(outcome
        .text
        .starts_with("Invalid arguments for tool 'view_logs':"));

    let outcome = harness
        .call("view_config", json!({"component": "postgres"}))
        .await;
    assert!(outcome
        .text
        .starts_with("Invalid arguments for tool 'view_config':"));
    assert!(harness.runner.calls().is_empty());
}

#[tokio::test]
async fn check_ports_filters_netstat_listing() {
    let runner = ScriptedRunner::new().on("netstat", |_| {
        Ok(exited(
            0,
            "Proto Recv-Q Send-Q Local Address   State\n\
             tcp   0      0      0.0.0.0:18000   LISTEN\n\
             tcp   0      0      0.0.0.0:22      LISTEN\n\
             tcp   0      0      0.0.0.0:10003   LISTEN\n",
            "",
        ))
    });
    let harness = Harness::new(runner);
    let outcome = harness.call("check_ports", json!({})).await;
    assert_eq!(
        outcome.text,
        "Listening ports:\n\
         tcp   0      0      0.0.0.0:18000   LISTEN\n\
         tcp   0      0      0.0.0.0:10003   LISTEN"
    );
}

#[tokio::test]
async fn check_ports_falls_back_to_ss_then_gives_up() {
    let runner = ScriptedRunner::new()
        .without("netstat")
        .on("ss", |_| Ok(exited(0, "LISTEN 0 4096 *:8000 *:*\n", "")));
    let harness = Harness::new(runner);
    let outcome = harness.call("check_ports", json!({})).await;
    assert_eq!(outcome.text, "Listening sockets:\nLISTEN 0 4096 *:8000 *:*\n");

    let harness = Harness::new(ScriptedRunner::new().without("netstat").without("ss"));
    let outcome = harness.call("check_ports", json!({})).await;
    assert!(outcome.is_error);
    assert_eq!(
        outcome.text,
        "Neither netstat nor ss available for port checking"
    );
}

#[tokio::test]
async fn update_config_coerces_and_persists() {
    let harness = Harness::with_checkout(
        ScriptedRunner::new(),
        &[("inventories/production/group_vars/all.yml", SAMPLE_CONFIG)],
    );
    harness.initialize().await;

    let outcome = harness
        .call("update_config", json!({"key": "crow_port", "value": "18080"}))
        .await;
    assert_eq!(outcome.text, "Updated crow_port = 18080 in configuration");
    let outcome = harness
        .call("update_config", json!({"key": "enable_tls", "value": "TRUE"}))
        .await;
    assert_eq!(outcome.text, "Updated enable_tls = true in configuration");

    let raw = std::fs::read_to_string(harness.config_path()).expect("read config");
    let doc: serde_yaml::Value = serde_yaml::from_str(&raw).expect("yaml");
    assert_eq!(doc["crow_port"].as_u64(), Some(18080));
    assert_eq!(doc["enable_tls"].as_bool(), Some(true));

    let outcome = harness.call("view_config", json!({"component": "crow"})).await;
    assert!(outcome.text.contains("crow_port: 18080"), "{}", outcome.text);
    assert!(!outcome.text.contains("nginx_server_name"));
    assert!(outcome.text.contains("bazel_version"));
}

#[tokio::test]
async fn view_config_reports_missing_file_and_empty_slices() {
    let harness = Harness::with_checkout(ScriptedRunner::new(), &[]);
    harness.initialize().await;
    let outcome = harness.call("view_config", json!({"component": "all"})).await;
    assert!(outcome.is_error);
    assert_eq!(
        outcome.text,
        format!(
            "Configuration file not found at {}",
            display(&harness.config_path())
        )
    );

    std::fs::create_dir_all(harness.config_path().parent().expect("parent"))
        .expect("mkdir group_vars");
    std::fs::write(harness.config_path(), "crow_port: 18000\n").expect("write config");
    let outcome = harness.call("view_config", json!({"component": "nginx"})).await;
    assert!(!outcome.is_error);
    assert_eq!(outcome.text, "No configuration found for component: nginx");

    let outcome = harness.call("view_config", json!({"component": "all"})).await;
    assert_eq!(outcome.text, "Full configuration:\ncrow_port: 18000\n");
}

#[tokio::test]
async fn removing_checkout_closes_the_gate_again() {
    let harness = Harness::with_checkout(ScriptedRunner::new(), &[]);
    harness.initialize().await;
    std::fs::remove_dir_all(&harness.deploy_dir).expect("remove checkout");
    let outcome = harness.call("docker_build", json!({})).await;
    assert_eq!(outcome.text, NOT_INITIALIZED);
}

#[tokio::test]
async fn install_dependencies_uses_detected_package_manager() {
    let harness = Harness::new(
        ScriptedRunner::new()
            .without("ansible")
            .without("ansible-playbook"),
    );
    let outcome = harness
        .call("install_dependencies", json!({"use_sudo": false}))
        .await;
    let rendered: Vec<String> = harness
        .runner
        .calls()
        .iter()
        .filter(|spec| spec.program == "apt-get")
        .map(|spec| spec.display())
        .collect();
    assert_eq!(
        rendered,
        vec![
            "apt-get update".to_string(),
            "apt-get install -y ansible".to_string()
        ]
    );
    // The scripted host never gains the binaries, so the re-check still reports them.
    assert!(outcome.is_error);
    assert!(outcome
        .text
        .ends_with("Still missing: ansible, ansible-playbook"));
}

#[tokio::test]
async fn install_dependencies_is_a_no_op_when_nothing_is_missing() {
    let harness = Harness::new(ScriptedRunner::new());
    let outcome = harness.call("install_dependencies", json!({})).await;
    assert_eq!(
        outcome.text,
        "All critical dependencies are already installed"
    );
    assert!(!harness.runner.programs().contains(&"sudo".to_string()));
}

#[tokio::test]
async fn relay_failures_are_error_text() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let dir = tempfile::tempdir().expect("tempdir");
    let mut settings = Settings::default().with_work_dir(dir.path());
    settings.crow_base_url = format!("http://{addr}");
    settings.graphql_url = format!("http://{addr}/graphql");
    let service = DeployService::with_runner(settings, Arc::new(ScriptedRunner::new()))
        .expect("service");

    let outcome = service
        .invoke(
            "get_transaction",
            json!({"transaction_id": "k1"}).as_object().cloned(),
            &CancellationToken::new(),
        )
        .await;
    assert!(outcome.is_error);
    assert!(
        outcome.text.starts_with("Error fetching transaction: "),
        "{}",
        outcome.text
    );
}

fn derived_fields<T: schemars::JsonSchema>() -> (BTreeSet<String>, BTreeSet<String>) {
    let schema = serde_json::to_value(schemars::schema_for!(T)).expect("schema json");
    fields_of(&schema)
}

fn fields_of(schema: &Value) -> (BTreeSet<String>, BTreeSet<String>) {
    let properties = schema["properties"]
        .as_object()
        .map(|props| props.keys().cloned().collect())
        .unwrap_or_default();
    let required = schema["required"]
        .as_array()
        .map(|fields| {
            fields
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    (properties, required)
}

#[test]
fn advertised_schemas_match_request_types() {
    let cases = [
        (
            "initialize_environment",
            derived_fields::<lifecycle::InitializeEnvironmentRequest>(),
        ),
        (
            "install_dependencies",
            derived_fields::<deploy::InstallDependenciesRequest>(),
        ),
        ("run_playbook", derived_fields::<deploy::RunPlaybookRequest>()),
        ("docker_build", derived_fields::<deploy::DockerBuildRequest>()),
        ("docker_run", derived_fields::<deploy::DockerRunRequest>()),
        (
            "restart_service",
            derived_fields::<services::RestartServiceRequest>(),
        ),
        ("view_logs", derived_fields::<services::ViewLogsRequest>()),
        (
            "commit_transaction",
            derived_fields::<api::CommitTransactionRequest>(),
        ),
        (
            "get_transaction",
            derived_fields::<api::GetTransactionRequest>(),
        ),
        ("graphql_query", derived_fields::<api::GraphqlQueryRequest>()),
        (
            "view_config",
            derived_fields::<diagnostics::ViewConfigRequest>(),
        ),
        (
            "update_config",
            derived_fields::<diagnostics::UpdateConfigRequest>(),
        ),
    ];
    for (name, derived) in cases {
        let tool = catalog::find(name).expect("catalog entry");
        let advertised = fields_of(&Value::Object(tool.input_schema()));
        assert_eq!(advertised, derived, "{name}");
    }

    let argumentless: Vec<&str> = TOOL_CATALOG
        .iter()
        .filter(|tool| fields_of(&Value::Object(tool.input_schema())).0.is_empty())
        .map(|tool| tool.name)
        .collect();
    assert_eq!(
        argumentless,
        vec!["check_dependencies", "quick_deploy", "check_services", "check_ports"]
    );
}

#[test]
fn call_results_carry_error_flag() {
    let ok = Outcome {
        text: "fine".to_string(),
        is_error: false,
    }
    .into_call_result();
    assert_ne!(ok.is_error, Some(true));

    let failed = Outcome {
        text: "Unknown tool: x".to_string(),
        is_error: true,
    }
    .into_call_result();
    assert_eq!(failed.is_error, Some(true));
    let text = failed
        .content
        .first()
        .and_then(|c| c.as_text())
        .map(|t| t.text.clone());
    assert_eq!(text.as_deref(), Some("Unknown tool: x"));
}

#[tokio::test]
async fn cancelled_calls_surface_cancellation() {
    let runner = ScriptedRunner::new().on("journalctl", |spec| {
        Err(DeployError::Cancelled {
            program: spec.program.clone(),
        })
    });
    let harness = Harness::new(runner);
    let outcome = harness
        .call("view_logs", json!({"service": "nginx", "lines": 5}))
        .await;
    assert!(outcome.is_error);
    assert_eq!(
        outcome.text,
        "Error viewing logs: journalctl was cancelled before it finished"
    );
}
