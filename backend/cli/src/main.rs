mod config_cmd;
mod extract_cmd;
mod status_cmd;
mod terminal_output;
mod wiring;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use textlift_config::{config_dir, config_file_path, load_effective, validate, TextliftConfig};
use textlift_core::ExtractionMode;
use textlift_gateway::{start_server, GatewayState};
use textlift_logging::init_logger;

#[derive(Parser)]
#[command(name = "textlift")]
#[command(about = "textlift: pull text, form fields, and tables out of document images")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.textlift/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the browser front end
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
        /// Answer with canned sample data instead of calling a model
        #[arg(long)]
        mock: bool,
    },
    /// Extract from one image file and print the result
    Extract {
        /// Image to read (JPG, PNG, WEBP, ...)
        path: PathBuf,
        /// text, forms, or tables
        #[arg(short, long, default_value = "text")]
        mode: ExtractionMode,
        /// Ask for a summary alongside the extraction
        #[arg(short, long)]
        summarize: bool,
        /// Print the raw JSON payload instead of the rendered view
        #[arg(long)]
        json: bool,
        #[arg(long)]
        mock: bool,
    },
    /// Check whether a gateway is running
    Status {
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective config with secrets masked
    Show,
    /// Validate the effective config
    Validate,
    /// Print the config file path
    Path,
    /// Write a default config file
    Init {
        #[arg(long)]
        force: bool,
    },
}

/// Exit status when the effective config fails validation.
const INVALID_CONFIG_EXIT: u8 = 2;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    run(Cli::parse()).await
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| config_file_path(&config_dir()));
    let mut config = load_effective(&config_path).await?;

    init_logger(
        &config.logging.level,
        config.logging.json,
        config.logging.log_dir.as_deref().map(Path::new),
    );

    let ok = match cli.command {
        Commands::Serve { port, mock } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            if mock {
                config.model.provider = "mock".into();
            }
            if !config_is_usable(&config) {
                return Ok(ExitCode::from(INVALID_CONFIG_EXIT));
            }
            run_server(config).await?;
            true
        }
        Commands::Extract {
            path,
            mode,
            summarize,
            json,
            mock,
        } => {
            if mock {
                config.model.provider = "mock".into();
            }
            if !config_is_usable(&config) {
                return Ok(ExitCode::from(INVALID_CONFIG_EXIT));
            }
            let ingestor = wiring::build_ingestor(&config);
            let client = wiring::build_client(&config)?;
            extract_cmd::run(&ingestor, &client, &path, mode, summarize, json).await?
        }
        Commands::Status { port } => {
            let port = port.unwrap_or(config.server.port);
            status_cmd::run(&config.server.bind_address, port).await?
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                config_cmd::show(&config)?;
                true
            }
            ConfigAction::Validate => config_cmd::check(&config),
            ConfigAction::Path => {
                println!("{}", config_path.display());
                true
            }
            ConfigAction::Init { force } => config_cmd::init(&config_path, force).await?,
        },
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// Log validation findings; false when there are errors.
fn config_is_usable(config: &TextliftConfig) -> bool {
    let report = validate(config);
    for warning in &report.warnings {
        warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for err in &report.errors {
        error!(path = %err.path, message = %err.message, "Config error");
    }
    report.is_valid()
}

async fn run_server(config: TextliftConfig) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid bind address {}:{}",
                config.server.bind_address, config.server.port
            )
        })?;

    let ingestor = wiring::build_ingestor(&config);
    let client = wiring::build_client(&config)?;
    info!(
        addr = %addr,
        provider = %client.provider_name(),
        model = %client.model_id(),
        max_upload_bytes = ingestor.max_bytes(),
        "Starting textlift gateway"
    );

    start_server(addr, GatewayState::new(ingestor, client)).await
}
