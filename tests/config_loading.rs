// tests/config_loading.rs

use std::io::Write;
use std::time::Duration;

use coderunner::config::{load_and_validate, load_or_default};
use coderunner::engine::ExecutionCoordinator;
use coderunner::errors::CoderunnerError;
use coderunner::language::{LanguageRegistry, PipelineKind};
use coderunner::types::DuplicateRunPolicy;
use tempfile::{NamedTempFile, TempDir};

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let dir = TempDir::new().unwrap();
    let cfg = load_or_default(dir.path().join("Coderunner.toml")).unwrap();
    assert_eq!(cfg.config.run_timeout(), Duration::from_secs(60));
    assert_eq!(cfg.config.on_duplicate, DuplicateRunPolicy::Supersede);
    assert!(cfg.language.is_empty());
}

#[test]
fn missing_file_is_an_error_when_loaded_explicitly() {
    let dir = TempDir::new().unwrap();
    let err = load_and_validate(dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, CoderunnerError::IoError(_)), "got {err:?}");
}

#[test]
fn global_settings_flow_into_the_coordinator() {
    let file = config_file(
        r#"
[config]
workspace_dir = "/tmp/coderunner-ws"
run_timeout_secs = 5
compile_timeout_secs = 9
on_duplicate = "reject"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    let coordinator = ExecutionCoordinator::from_config(&cfg).unwrap();
    let settings = coordinator.settings();

    assert_eq!(settings.run_timeout, Duration::from_secs(5));
    assert_eq!(settings.on_duplicate, DuplicateRunPolicy::Reject);
    assert_eq!(settings.workspace_dir.to_str(), Some("/tmp/coderunner-ws"));

    let registry = coordinator.registry();
    match registry.pipeline_for("rust") {
        coderunner::language::Pipeline::CompileThenRun {
            compile_timeout, ..
        } => assert_eq!(compile_timeout, Duration::from_secs(9)),
        other => panic!("expected a compiled pipeline, got {other:?}"),
    }
}

#[test]
fn overlay_enables_ruby_and_adds_a_language() {
    let file = config_file(
        r#"
[language.ruby]
run = ["ruby", "{source}"]
run_timeout_secs = 3

[language.lua]
display_name = "Lua"
extension = "lua"
run = ["lua", "{source}"]
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    let registry = LanguageRegistry::from_config(&cfg).unwrap();

    let ruby = registry.get("rb").unwrap();
    assert_eq!(ruby.kind(), PipelineKind::Interpreted);
    assert_eq!(ruby.run_timeout, Some(Duration::from_secs(3)));

    let lua = registry
        .language_for_path(std::path::Path::new("game/init.lua"))
        .unwrap();
    assert_eq!(lua.display_name, "Lua");
    assert_eq!(lua.file_name, "main.lua");
    assert!(lua.supports_execution());
}

#[test]
fn unknown_placeholder_is_a_config_error() {
    let file = config_file(
        r#"
[language.python]
run = ["python3", "{sauce}"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(CoderunnerError::ConfigError(msg)) => {
            assert!(msg.contains("[language.python]"), "{msg}");
            assert!(msg.contains("sauce"), "{msg}");
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn compile_without_artifact_is_a_config_error() {
    let file = config_file(
        r#"
[language.zig]
extension = "zig"
compile = ["zig", "build-exe", "{source}"]
run = ["{artifact}"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(CoderunnerError::ConfigError(msg)) => assert!(msg.contains("artifact"), "{msg}"),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn new_language_needs_an_extension() {
    let file = config_file("[language.lua]\nrun = [\"lua\", \"{source}\"]\n");
    let err = load_and_validate(file.path()).unwrap_err();
    assert!(err.to_string().contains("extension"), "{err}");
}

#[test]
fn extension_clash_is_a_config_error() {
    let file = config_file(
        r#"
[language.ruby]
extension = "py"
"#,
    );
    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, CoderunnerError::ConfigError(_)));
    assert!(err.to_string().contains("'py'"), "{err}");
}

#[test]
fn unknown_keys_and_bad_toml_are_rejected() {
    let file = config_file("[config]\nrun_timeout = 5\n");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(CoderunnerError::TomlError(_))
    ));

    let file = config_file("[config\n");
    assert!(matches!(
        load_or_default(file.path()),
        Err(CoderunnerError::TomlError(_))
    ));
}

#[test]
fn zero_language_timeout_is_rejected() {
    let file = config_file("[language.python]\nrun_timeout_secs = 0\n");
    let err = load_and_validate(file.path()).unwrap_err();
    assert!(err.to_string().contains("[language.python]"), "{err}");
}
