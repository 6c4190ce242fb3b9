// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod language;
pub mod logging;
pub mod store;
pub mod types;

use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::{CliArgs, Command, RunArgs};
use crate::config::{default_config_path, load_and_validate, load_or_default};
use crate::engine::result::NO_EXIT_CODE;
use crate::engine::{ExecutionCoordinator, ExecutionRequest, ExecutionResult, ExecutionStatus};
use crate::errors::CoderunnerError;

/// High-level entry point used by `main.rs`.
///
/// Loads the config, builds a coordinator with real processes and runs the
/// requested subcommand. Returns the process exit status.
pub async fn run(args: CliArgs) -> Result<i32> {
    // Only the default path may be absent.
    let cfg = if args.config == default_config_path() {
        load_or_default(&args.config)?
    } else {
        load_and_validate(&args.config)?
    };
    let coordinator = ExecutionCoordinator::from_config(&cfg)?;

    match args.command {
        Command::Languages => {
            print_languages(&coordinator);
            Ok(0)
        }
        Command::Run(run_args) => run_file(&coordinator, run_args).await,
    }
}

async fn run_file(coordinator: &ExecutionCoordinator, args: RunArgs) -> Result<i32> {
    let language = match args.language {
        Some(lang) => lang,
        None => coordinator
            .registry()
            .language_for_path(&args.file)
            .map(|l| l.id.clone())
            .ok_or_else(|| {
                CoderunnerError::UnknownLanguage(format!(
                    "cannot infer language of {}; pass --language",
                    args.file.display()
                ))
            })?,
    };
    let key = args
        .key
        .unwrap_or_else(|| args.file.to_string_lossy().into_owned());

    let mut request = ExecutionRequest::new(key, language).with_source_path(&args.file);
    if let Some(secs) = args.timeout {
        request = request.with_run_timeout(Duration::from_secs(secs));
    }

    // Ctrl-C kills whatever is running; the pending result then reports it.
    {
        let coordinator = coordinator.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let stopped = coordinator.stop_all();
            info!(stopped, "Ctrl+C received; stopping executions");
        });
    }

    let result = coordinator.execute(request).await;
    debug!(
        status = ?result.status,
        elapsed_ms = result.execution_time_ms,
        "run finished"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result);
    }

    Ok(if result.success { 0 } else { 1 })
}

fn print_result(result: &ExecutionResult) {
    print!("{}", result.output);
    if !result.output.is_empty() && !result.output.ends_with('\n') {
        println!();
    }

    match result.status {
        ExecutionStatus::Completed => {}
        ExecutionStatus::RuntimeFailed => {
            eprintln!("process exited with code {}", result.exit_code);
        }
        // Compiler diagnostics are already on stdout as the output.
        ExecutionStatus::CompileFailed if result.exit_code != NO_EXIT_CODE => {
            eprintln!("Compilation failed (exit code {})", result.exit_code);
        }
        _ => eprintln!("{}", result.error),
    }
}

fn print_languages(coordinator: &ExecutionCoordinator) {
    println!("languages ({}):", coordinator.languages().count());
    for lang in coordinator.languages() {
        let mark = if lang.supports_execution() { "+" } else { "-" };
        print!("  {mark} {:<12} {:<12} .{:<5}", lang.id, lang.display_name, lang.extension);
        if !lang.aliases.is_empty() {
            print!(" aliases: {}", lang.aliases.join(", "));
        }
        println!();
        for (label, command) in lang.pipeline.describe() {
            println!("      {label:<9}{command}");
        }
    }
}
