//! podbridge - sandbox lifecycle CLI for the hyper pod engine
//!
//! Drives the same operations a node agent uses, against a running hyperd.
//!
//! ## Usage
//!
//! ```sh
//! podbridge run sandbox.yaml
//! podbridge inspect <pod-id>
//! podbridge list --state ready --label app=web
//! podbridge stop <pod-id>
//! podbridge rm <pod-id>
//! ```
//!
//! ## Configuration
//!
//! Defaults, then `--config <path>` (YAML), then `PODBRIDGE_*` environment
//! variables, then `--endpoint <uri>`.

use podbridge::{
    HyperClient, HyperRuntime, RuntimeConfig, SandboxConfig, SandboxFilter, SandboxState,
};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::FmtSubscriber;

// =============================================================================
// CLI Parsing
// =============================================================================

#[derive(Debug)]
struct Cli {
    config: Option<PathBuf>,
    endpoint: Option<String>,
    command: Command,
}

#[derive(Debug)]
enum Command {
    Version,
    Status,
    List { filter: SandboxFilter },
    Inspect { id: String },
    Run { manifest: PathBuf },
    Stop { id: String },
    Remove { id: String },
    Help,
}

fn parse_args(args: &[String]) -> Result<Cli, String> {
    let mut config = None;
    let mut endpoint = None;
    let mut rest = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                let value = args.get(i + 1).ok_or("--config requires a path")?;
                config = Some(PathBuf::from(value));
                i += 2;
            }
            "--endpoint" | "-e" => {
                let value = args.get(i + 1).ok_or("--endpoint requires a uri")?;
                endpoint = Some(value.clone());
                i += 2;
            }
            _ => {
                rest.push(args[i].clone());
                i += 1;
            }
        }
    }

    let Some(name) = rest.first() else {
        return Ok(Cli {
            config,
            endpoint,
            command: Command::Help,
        });
    };

    let id_arg = |cmd: &str| -> Result<String, String> {
        rest.get(1)
            .cloned()
            .ok_or_else(|| format!("{cmd} requires <pod-id>"))
    };

    let command = match name.as_str() {
        "version" | "--version" | "-v" => Command::Version,
        "status" => Command::Status,
        "list" | "ls" => Command::List {
            filter: parse_filter(&rest[1..])?,
        },
        "inspect" => Command::Inspect { id: id_arg("inspect")? },
        "run" => Command::Run {
            manifest: rest
                .get(1)
                .map(PathBuf::from)
                .ok_or("run requires <sandbox.yaml>")?,
        },
        "stop" => Command::Stop { id: id_arg("stop")? },
        "rm" | "delete" => Command::Remove { id: id_arg("rm")? },
        "help" | "--help" | "-h" => Command::Help,
        unknown => return Err(format!("unknown command: {unknown}")),
    };

    Ok(Cli {
        config,
        endpoint,
        command,
    })
}

fn parse_filter(args: &[String]) -> Result<SandboxFilter, String> {
    let mut filter = SandboxFilter::new();
    let mut i = 0;
    while i < args.len() {
        let value = args
            .get(i + 1)
            .ok_or_else(|| format!("{} requires a value", args[i]))?;
        match args[i].as_str() {
            "--id" => filter = filter.with_id(value.clone()),
            "--state" => filter = filter.with_state(value.parse::<SandboxState>()?),
            "--label" | "-l" => {
                let (k, v) = value
                    .split_once('=')
                    .ok_or_else(|| format!("label selector '{value}' must be key=value"))?;
                filter = filter.with_label(k, v);
            }
            other => return Err(format!("unknown list option: {other}")),
        }
        i += 2;
    }
    Ok(filter)
}

// =============================================================================
// Setup
// =============================================================================

fn load_config(cli: &Cli) -> Result<RuntimeConfig, String> {
    let config = match &cli.config {
        Some(path) => RuntimeConfig::from_file(path).map_err(|e| e.to_string())?,
        None => RuntimeConfig::default(),
    };
    let mut config = config.apply_env().map_err(|e| e.to_string())?;
    if let Some(endpoint) = &cli.endpoint {
        config = config.with_endpoint(endpoint.clone());
        config.validate().map_err(|e| e.to_string())?;
    }
    Ok(config)
}

fn init_tracing(config: &RuntimeConfig) -> Result<(), String> {
    let level = config
        .log_level
        .parse::<tracing::Level>()
        .map_err(|e| format!("invalid log level: {e}"))?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|_| "failed to set tracing subscriber".to_string())
}

/// Builds a runtime without the engine version handshake, for commands that
/// must work while the daemon is down or outdated.
fn unchecked_runtime(config: &RuntimeConfig) -> Result<HyperRuntime, String> {
    let client = HyperClient::new(&config.endpoint)
        .map_err(|e| e.to_string())?
        .with_timeout(config.connection_timeout());
    let span = tracing::info_span!("hyper_runtime", endpoint = %config.endpoint);
    Ok(HyperRuntime::new(Arc::new(client)).with_span(span))
}

// =============================================================================
// Command Implementations
// =============================================================================

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| format!("serialize: {e}"))?;
    println!("{json}");
    Ok(())
}

async fn run_command(command: Command, config: &RuntimeConfig) -> Result<(), String> {
    match command {
        Command::Version => {
            let runtime = unchecked_runtime(config)?;
            let version = runtime.version().await.map_err(|e| e.to_string())?;
            print_json(&version)
        }
        Command::Status => {
            let runtime = unchecked_runtime(config)?;
            print_json(&runtime.status().await)
        }
        Command::List { filter } => {
            let runtime = HyperRuntime::connect(config).await.map_err(|e| e.to_string())?;
            let sandboxes = runtime
                .list_pod_sandbox(Some(&filter))
                .await
                .map_err(|e| e.to_string())?;
            print_json(&sandboxes)
        }
        Command::Inspect { id } => {
            let runtime = HyperRuntime::connect(config).await.map_err(|e| e.to_string())?;
            let status = runtime
                .pod_sandbox_status(&id)
                .await
                .map_err(|e| e.to_string())?;
            print_json(&status)
        }
        Command::Run { manifest } => {
            let bytes = std::fs::read(&manifest)
                .map_err(|e| format!("read {}: {e}", manifest.display()))?;
            let sandbox = SandboxConfig::from_yaml(&bytes).map_err(|e| e.to_string())?;
            let runtime = HyperRuntime::connect(config).await.map_err(|e| e.to_string())?;
            let id = runtime
                .run_pod_sandbox(&sandbox)
                .await
                .map_err(|e| e.to_string())?;
            print_json(&serde_json::json!({ "id": id }))
        }
        Command::Stop { id } => {
            let runtime = HyperRuntime::connect(config).await.map_err(|e| e.to_string())?;
            runtime.stop_pod_sandbox(&id).await.map_err(|e| e.to_string())?;
            print_json(&serde_json::json!({ "id": id, "stopped": true }))
        }
        Command::Remove { id } => {
            let runtime = HyperRuntime::connect(config).await.map_err(|e| e.to_string())?;
            runtime
                .delete_pod_sandbox(&id)
                .await
                .map_err(|e| e.to_string())?;
            print_json(&serde_json::json!({ "id": id, "removed": true }))
        }
        Command::Help => {
            cmd_help();
            Ok(())
        }
    }
}

fn cmd_help() {
    println!(
        r#"podbridge - sandbox lifecycle for the hyper pod engine

USAGE:
    podbridge [--config <path>] [--endpoint <uri>] <command> [options]

COMMANDS:
    version                 Show engine version info (JSON)
    status                  Show runtime conditions (JSON)
    list [filters]          List sandboxes, oldest first (JSON)
    inspect <pod-id>        Show sandbox status (JSON)
    run <sandbox.yaml>      Create and start a sandbox
    stop <pod-id>           Stop a sandbox
    rm <pod-id>             Remove a sandbox
    help                    Show this help

OPTIONS:
    --config, -c <path>     YAML config file
    --endpoint, -e <uri>    Engine endpoint (unix:///path or tcp://host:port)

LIST FILTERS:
    --id <pod-id>           Match one pod ID
    --state <state>         ready | notready
    --label, -l <k=v>       Require a label (repeatable)

EXAMPLES:
    podbridge run ./web.yaml
    podbridge list --state ready --label app=web
    podbridge --endpoint tcp://127.0.0.1:22318 status
"#
    );
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("error: {e}");
            cmd_help();
            return ExitCode::FAILURE;
        }
    };

    if matches!(cli.command, Command::Help) {
        cmd_help();
        return ExitCode::SUCCESS;
    }

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_tracing(&config) {
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }

    match run_command(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn test_global_flags_anywhere() {
        let cli = parse_args(&args("list --endpoint tcp://h:1 --state ready")).unwrap();
        assert_eq!(cli.endpoint.as_deref(), Some("tcp://h:1"));
        let Command::List { filter } = cli.command else {
            panic!("expected list");
        };
        assert_eq!(filter.state, Some(SandboxState::Ready));
    }

    #[test]
    fn test_list_labels() {
        let cli = parse_args(&args("list -l app=web --label tier=fe")).unwrap();
        let Command::List { filter } = cli.command else {
            panic!("expected list");
        };
        assert_eq!(filter.label_selector.map(|s| s.len()), Some(2));
    }

    #[test]
    fn test_errors() {
        assert!(parse_args(&args("inspect")).is_err());
        assert!(parse_args(&args("list --label nokv")).is_err());
        assert!(parse_args(&args("frobnicate")).is_err());
        assert!(matches!(parse_args(&[]).unwrap().command, Command::Help));
    }
}
