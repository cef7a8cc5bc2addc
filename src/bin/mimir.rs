//! mimir: code review and refactoring from the command line
//!
//! Loads config and secrets the same way a long-running service would and
//! runs one operation against the active provider.

use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mimir::{Config, Mimir, ProviderId, Secrets};

/// Mimir CLI
#[derive(Parser)]
#[command(name = "mimir")]
#[command(version = mimir::version::PKG_VERSION)]
#[command(about = "Cached LLM code review and refactoring")]
struct Args {
    /// Config file (default: ~/.mimir/config.toml, then /etc/mimir/config.toml)
    #[arg(short, long, env = "MIMIR_CONFIG")]
    config: Option<PathBuf>,

    /// Provider to use for this run ("openai" or "llama")
    #[arg(short, long)]
    provider: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Review code for style, performance and security issues
    Analyze {
        /// Source file (omit or "-" to read from stdin)
        file: Option<PathBuf>,
    },

    /// Refactor code
    Refactor {
        /// Source file (omit or "-" to read from stdin)
        file: Option<PathBuf>,
    },

    /// List configured providers
    Providers,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    tracing::debug!(version = %mimir::version::version_string(), "starting");

    let config = Config::load(args.config.as_deref())?;
    let secrets = Secrets::load()?;
    let reviewer = Mimir::builder().from_config(&config, &secrets).build()?;

    if let Some(provider) = &args.provider {
        reviewer.select_model(provider)?;
    }

    match args.command {
        Command::Analyze { file } => {
            let code = read_code(file, "analyze")?;
            let result = reviewer.analyze(&code).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Command::Refactor { file } => {
            let code = read_code(file, "refactor")?;
            let result = reviewer.refactor(&code).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }

        Command::Providers => {
            let active = reviewer.current_model();
            let available = reviewer.available_models();
            for id in ProviderId::ALL {
                let marker = if id == active { "*" } else { " " };
                let status = if available.contains(&id) {
                    "configured"
                } else {
                    "no credential"
                };
                println!("{marker} {:<8} {status}", id.as_str());
            }
        }
    }

    Ok(())
}

/// Read code verbatim from `file`, or stdin when omitted or `-`.
fn read_code(file: Option<PathBuf>, command: &str) -> Result<String, Box<dyn std::error::Error>> {
    let code = match file {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(&path)
            .map_err(|e| format!("{command}: cannot read {}: {e}", path.display()))?,
        _ => {
            if io::stdin().is_terminal() {
                return Err(format!("{command}: no input provided (pass a file or pipe code via stdin)").into());
            }
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    if code.trim().is_empty() {
        return Err(format!("{command}: input is empty").into());
    }
    Ok(code)
}
