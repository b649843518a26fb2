mod commands;

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, fmt};

use valen_core::config::{ConfigError, ValenConfig};

#[derive(Parser)]
#[command(name = "valen")]
#[command(about = "Show facility status from monitor snapshots", long_about = None)]
struct Cli {
    /// Config file (defaults to $VALEN_CONFIG or valen.yaml in this or a parent directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the current status of every facility
    Status {
        #[arg(long)]
        json: bool,
        /// Include facilities marked hidden
        #[arg(short, long)]
        all: bool,
    },
    /// Re-print a summary on every refresh boundary
    Watch,
    /// Check the config, snapshot and notice files
    Doctor,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "valen=info".into());
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(explicit: Option<PathBuf>) -> Result<(Option<PathBuf>, ValenConfig), ConfigError> {
    if let Some(path) = explicit {
        let config = ValenConfig::load(&path)?;
        return Ok((Some(path), config));
    }

    let cwd = std::env::current_dir()?;
    match ValenConfig::discover(&cwd) {
        Ok((path, config)) => {
            debug!(path = %path.display(), "using config");
            Ok((Some(path), config))
        }
        Err(ConfigError::NotFound { .. }) => {
            debug!("no config file found, using defaults");
            Ok((None, ValenConfig::default()))
        }
        Err(e) => Err(e),
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    let (config_path, config) = match load_config(cli.config) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Watch) => commands::run_watch(&config).await,
        Some(Commands::Doctor) => {
            let color = std::io::stdout().is_terminal();
            if let Err(e) = commands::run_doctor(&config, config_path.as_deref(), color) {
                warn!("{}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Status { json, all }) => {
            let code = commands::run_status(&config, json, all, std::io::stdout().is_terminal());
            std::process::exit(code);
        }
        None => {
            let code = commands::run_status(&config, false, false, std::io::stdout().is_terminal());
            std::process::exit(code);
        }
    }
}
