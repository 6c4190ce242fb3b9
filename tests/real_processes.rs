// End-to-end executions with real processes and a temporary workspace.
#![cfg(unix)]

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use coderunner::engine::{ExecutionCoordinator, ExecutionRequest, ExecutionSettings, ExecutionStatus};
use coderunner::exec::ProcessRunner;
use coderunner::language::LanguageRegistry;
use coderunner::types::DuplicateRunPolicy;
use coderunner_test_utils::{LanguageBuilder, init_tracing, wait_until, with_timeout};
use tempfile::TempDir;

fn coordinator(registry: LanguageRegistry, workspace: &Path) -> ExecutionCoordinator {
    ExecutionCoordinator::builder(registry)
        .settings(ExecutionSettings {
            workspace_dir: workspace.to_path_buf(),
            run_timeout: Duration::from_secs(20),
            on_duplicate: DuplicateRunPolicy::Supersede,
        })
        .launcher(Arc::new(
            ProcessRunner::new().with_drain_grace(Duration::from_millis(200)),
        ))
        .build()
}

fn tool_available(program: &str) -> bool {
    std::process::Command::new(program)
        .arg("--version")
        .output()
        .is_ok_and(|out| out.status.success())
}

/// `sleep` with a duration no other process on the box will use, so `pgrep`
/// can find exactly the one a script started.
fn unique_sleep() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .subsec_nanos();
    format!("sleep {}", 300_000 + nanos % 600_000)
}

/// Wait until no process has exactly `cmdline`. No-op without `pgrep`.
async fn assert_no_survivor(cmdline: &str) {
    if !tool_available("pgrep") {
        eprintln!("pgrep not installed; not checking for '{cmdline}'");
        return;
    }
    let pattern = format!("^{cmdline}$");
    wait_until(&format!("'{cmdline}' to be gone"), || {
        !std::process::Command::new("pgrep")
            .args(["-f", &pattern])
            .status()
            .is_ok_and(|s| s.success())
    })
    .await;
}

/// `sh`-only stand-in for a compiled language: the "compiler" syntax-checks
/// the script and copies it to the artifact path.
fn checked_shell() -> LanguageRegistry {
    LanguageRegistry::from_languages(vec![
        LanguageBuilder::new("checked-sh", "csh")
            .display_name("Checked shell")
            .compiled(
                &["sh", "-c", "sh -n \"$0\" && cp \"$0\" \"$1\"", "{source}", "{artifact}"],
                "{dir}/{stem}.checked",
                &["sh", "{artifact}"],
            )
            .build(),
    ])
    .unwrap()
}

#[tokio::test]
async fn shell_output_and_exit_code() {
    init_tracing();
    let ws = TempDir::new().unwrap();
    let c = coordinator(LanguageRegistry::builtin(), ws.path());

    let req = ExecutionRequest::new("sh-ok", "shell").with_source_content("echo hello\necho oops >&2\n");
    let result = with_timeout(c.run(req)).await;

    assert!(result.success, "{result:?}");
    assert_eq!(result.status, ExecutionStatus::Completed);
    assert!(result.output.contains("hello"));
    assert!(result.output.contains("oops"));
    assert!(result.error.is_empty());

    let req = ExecutionRequest::new("sh-fail", "sh").with_source_content("echo bye\nexit 4\n");
    let result = with_timeout(c.run(req)).await;
    assert!(!result.success);
    assert_eq!(result.exit_code, 4);
    assert_eq!(result.status, ExecutionStatus::RuntimeFailed);
    assert!(result.output.contains("bye"));
}

#[tokio::test]
async fn runs_in_the_source_directory_by_default() {
    let ws = TempDir::new().unwrap();
    let c = coordinator(LanguageRegistry::builtin(), ws.path());

    let req = ExecutionRequest::new("pwd", "shell").with_source_content("pwd\n");
    let result = with_timeout(c.run(req)).await;

    let build_dir = std::fs::canonicalize(ws.path().join(coderunner::engine::key_dir_name("pwd"))).unwrap();
    let printed = std::fs::canonicalize(result.output.trim()).unwrap();
    assert_eq!(printed, build_dir);
}

#[tokio::test]
async fn long_running_process_is_killed_at_timeout() {
    init_tracing();
    let ws = TempDir::new().unwrap();
    let c = coordinator(LanguageRegistry::builtin(), ws.path());
    let sleeper = unique_sleep();

    let req = ExecutionRequest::new("sleepy", "shell")
        .with_source_content(format!("echo started\n{sleeper}\n"))
        .with_run_timeout(Duration::from_millis(300));

    let started = Instant::now();
    let result = with_timeout(c.run(req)).await;

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(result.status, ExecutionStatus::TimedOut);
    assert!(result.error.contains("timed out"));
    assert_eq!(result.exit_code, -1);
    assert!(result.output.contains("started"));
    assert!(!c.is_executing("sleepy"));
    assert_no_survivor(&sleeper).await;
}

#[tokio::test]
async fn stop_kills_a_running_process_and_its_children() {
    init_tracing();
    let ws = TempDir::new().unwrap();
    let c = coordinator(LanguageRegistry::builtin(), ws.path());
    let marker = ws.path().join("started");
    let sleeper = unique_sleep();

    let script = format!("touch '{}'\n{sleeper}\n", marker.display());
    let pending = c.execute(ExecutionRequest::new("loop", "shell").with_source_content(script));

    wait_until("script started", || marker.exists()).await;
    assert!(c.stop("loop"));

    let result = with_timeout(pending.wait()).await;
    assert_eq!(result.status, ExecutionStatus::Cancelled);
    assert!(!c.is_executing("loop"));
    assert_no_survivor(&sleeper).await;
}

#[tokio::test]
async fn background_children_do_not_outlive_a_timeout() {
    let ws = TempDir::new().unwrap();
    let c = coordinator(LanguageRegistry::builtin(), ws.path());
    let first = unique_sleep();
    let second = format!("{first}1");

    // Two levels deep and detached from the script's own wait.
    let script = format!("sh -c '{second} & {first}' &\nwait\n");
    let req = ExecutionRequest::new("bg", "shell")
        .with_source_content(script)
        .with_run_timeout(Duration::from_millis(300));
    let result = with_timeout(c.run(req)).await;

    assert_eq!(result.status, ExecutionStatus::TimedOut);
    assert_no_survivor(&first).await;
    assert_no_survivor(&second).await;
}

#[tokio::test]
async fn compiled_pipeline_runs_artifact_only_after_successful_compile() {
    init_tracing();
    let ws = TempDir::new().unwrap();
    let c = coordinator(checked_shell(), ws.path());

    let ok = ExecutionRequest::new("good", "checked-sh").with_source_content("echo compiled ok\n");
    let result = with_timeout(c.run(ok)).await;
    assert!(result.success, "{result:?}");
    assert!(result.output.contains("compiled ok"));

    let bad = ExecutionRequest::new("bad", "checked-sh")
        .with_source_content("echo should not run\nif then fi (\n");
    let result = with_timeout(c.run(bad)).await;
    assert!(!result.success);
    assert_eq!(result.status, ExecutionStatus::CompileFailed);
    assert!(result.error.starts_with("Compilation failed:"));
    assert!(!result.output.contains("should not run"));

    let artifact = ws
        .path()
        .join(coderunner::engine::key_dir_name("bad"))
        .join("main.checked");
    assert!(!artifact.exists());
}

#[tokio::test]
async fn missing_interpreter_is_a_launch_failure() {
    let ws = TempDir::new().unwrap();
    let registry = LanguageRegistry::from_languages(vec![
        LanguageBuilder::new("ghost", "ghost")
            .interpreted(&["definitely-not-an-installed-interpreter", "{source}"])
            .build(),
    ])
    .unwrap();
    let c = coordinator(registry, ws.path());

    let result = with_timeout(c.run(ExecutionRequest::new("g", "ghost").with_source_content("x"))).await;
    assert_eq!(result.status, ExecutionStatus::LaunchFailed);
    assert!(result.error.starts_with("Execution error:"));
    assert!(result.error.contains("definitely-not-an-installed-interpreter"));
}

#[tokio::test]
async fn python_hello_world() {
    if !tool_available("python3") {
        eprintln!("python3 not installed; skipping");
        return;
    }
    let ws = TempDir::new().unwrap();
    let c = coordinator(LanguageRegistry::builtin(), ws.path());

    let req = ExecutionRequest::new("file-1", "python").with_source_content("print(\"hi\")");
    let result = with_timeout(c.run(req)).await;

    assert!(result.success, "{result:?}");
    assert_eq!(result.exit_code, 0);
    assert_eq!(result.output.trim(), "hi");
}

#[tokio::test]
async fn cpp_syntax_error_is_a_compile_failure() {
    if !tool_available("g++") {
        eprintln!("g++ not installed; skipping");
        return;
    }
    let ws = TempDir::new().unwrap();
    let c = coordinator(LanguageRegistry::builtin(), ws.path());

    let req = ExecutionRequest::new("broken", "cpp")
        .with_source_content("#include <cstdio>\nint main() { std::puts(\"x\") return 0; }\n");
    let result = with_timeout(c.run(req)).await;

    assert!(!result.success);
    assert_eq!(result.status, ExecutionStatus::CompileFailed);
    assert!(result.error.starts_with("Compilation failed:"));
}
