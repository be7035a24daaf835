//! apibot CLI: run the Telegram bot, check a commands file, or execute one command once.
//! Config from env (and `.env`) with CLI overrides.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use apibot::{load_config, run_bot, BaseConfig, EndpointRegistry, ReqwestHttpClient};
use clap::{Parser, Subcommand};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "apibot")]
#[command(about = "Chat commands answered from JSON APIs: run, check, exec", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the Telegram bot (token can override BOT_TOKEN).
    Run {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        token: Option<String>,
    },
    /// Validate a commands file and list its bindings.
    Check {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Run one command once and print the rendered text.
    Exec {
        command: String,
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, token } => {
            let base = load_base(config, token)?;
            run_bot(base).await
        }
        Commands::Check { config } => handle_check(load_base(config, None)?),
        Commands::Exec { command, config } => {
            handle_exec(load_base(config, None)?, &command).await
        }
    }
}

/// Env config with the `--config` path applied over COMMANDS_CONFIG.
fn load_base(config: Option<PathBuf>, token: Option<String>) -> Result<BaseConfig> {
    let mut base = BaseConfig::load(token)?;
    if let Some(path) = config {
        base.commands_config = path;
    }
    base.validate()?;
    Ok(base)
}

fn init_console_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();
}

/// Handle the check command: parse, validate, list.
fn handle_check(base: BaseConfig) -> Result<()> {
    init_console_tracing();

    let path = &base.commands_config;
    let config = load_config(path)
        .with_context(|| format!("Invalid commands config {}", path.display()))?;
    info!(config = %path.display(), commands = config.commands.len(), "Commands config is valid");

    println!("{}: {} command(s)", path.display(), config.commands.len());
    for binding in &config.commands {
        println!(
            "  {}{:<16} {}",
            base.command_prefix, binding.command_name, binding.api_url
        );
    }
    Ok(())
}

/// Handle the exec command: one pipeline run against the live API.
async fn handle_exec(base: BaseConfig, command: &str) -> Result<()> {
    init_console_tracing();

    let config = load_config(&base.commands_config).with_context(|| {
        format!("Invalid commands config {}", base.commands_config.display())
    })?;
    let client = ReqwestHttpClient::new(&base.http)?;
    let registry = EndpointRegistry::from_config(config, Arc::new(client))?;

    info!(command = %command, "Executing command");
    let result = registry
        .execute(command)
        .await
        .with_context(|| format!("Unknown command: {command}"))?;
    let text = result.inspect_err(|e| error!(command = %command, error = %e, "Command failed"))?;
    println!("{text}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_exec_args() {
        let cli = Cli::try_parse_from(["apibot", "exec", "joke", "--config", "c.yaml"]).unwrap();
        match cli.command {
            Commands::Exec { command, config } => {
                assert_eq!(command, "joke");
                assert_eq!(config, Some(PathBuf::from("c.yaml")));
            }
            _ => panic!("expected exec"),
        }
    }

    #[test]
    fn test_parse_run_args() {
        let cli = Cli::try_parse_from(["apibot", "run", "-t", "123:abc"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Run { token: Some(ref t), config: None } if t == "123:abc"
        ));
    }

    fn base_config(commands_config: PathBuf) -> BaseConfig {
        BaseConfig {
            bot_token: None,
            telegram_api_url: None,
            log_file: "logs/apibot.log".to_string(),
            commands_config,
            command_prefix: ".".to_string(),
            http: apibot::HttpConfig::default(),
        }
    }

    /// **Test: check accepts a valid commands file and rejects a broken one.**
    ///
    /// **Setup:** Temp dir with a valid file and a file whose template never closes.
    /// **Action:** `handle_check` on each.
    /// **Expected:** Ok for the valid file; an error naming the file for the broken one.
    #[test]
    fn test_handle_check() {
        let dir = tempfile::tempdir().unwrap();
        let valid = dir.path().join("commands.yaml");
        std::fs::write(
            &valid,
            "commands:\n  - command: fact\n    apiUrl: https://example.com/fact\n    template: \"{{ .text }}\"\n",
        )
        .unwrap();
        let broken = dir.path().join("broken.yaml");
        std::fs::write(
            &broken,
            "commands:\n  - command: fact\n    apiUrl: https://example.com/fact\n    template: \"{{ if .text }}\"\n",
        )
        .unwrap();

        assert!(handle_check(base_config(valid)).is_ok());
        let err = handle_check(base_config(broken)).unwrap_err();
        assert!(err.to_string().contains("broken.yaml"));
    }

    /// **Test: exec reports an unknown command.**
    #[tokio::test]
    async fn test_handle_exec_unknown_command() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("commands.yaml");
        std::fs::write(
            &path,
            "commands:\n  - command: fact\n    apiUrl: https://example.com/fact\n    template: \"{{ .text }}\"\n",
        )
        .unwrap();

        let err = handle_exec(base_config(path), "joke").await.unwrap_err();
        assert_eq!(err.to_string(), "Unknown command: joke");
    }
}
