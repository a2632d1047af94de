//! ad_report_sync CLI application
//!
//! Command-line interface for fetching Yandex Direct, Metrica and AppMetrica
//! reports into per-client cache files.

use std::process;

use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use ad_report_sync::cli::{
    handle_config, handle_decompose, handle_run, handle_tokens, Cli, Commands, ConfigAction,
    ConfigArgs, GlobalArgs,
};
use ad_report_sync::config::{AppConfig, LoggingConfig};
use ad_report_sync::errors::{AppError, Result};

#[tokio::main]
async fn main() {
    let result = run().await;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();

    // `config init` must work even when the current config file is broken
    let config = match &cli.command {
        Commands::Config(ConfigArgs {
            action: ConfigAction::Init { .. },
        }) => AppConfig::default(),
        _ => load_config(&cli.global).await?,
    };

    // Held until `run` returns so buffered log lines reach the file
    let _log_guard = init_logging(&cli, &config.logging)?;
    info!("ad_report_sync v{} starting", env!("CARGO_PKG_VERSION"));

    let Cli { global, command } = cli;
    match command {
        Commands::Run(args) => {
            info!("Executing run command");
            handle_run(args, config).await
        }
        Commands::Tokens => handle_tokens(),
        Commands::Config(args) => handle_config(args, &global, &config).await,
        Commands::Decompose(args) => handle_decompose(args, &config),
    }
}

/// Load the configuration and apply command-line overrides
async fn load_config(global: &GlobalArgs) -> Result<AppConfig> {
    let mut config = AppConfig::load(global.config.clone()).await?;
    if let Some(dir) = &global.output_dir {
        config.output.folder = dir.clone();
    }
    Ok(config)
}

/// Initialize logging from the CLI flags and the logging config
///
/// Flags win over `logging.level`; `RUST_LOG` can still add directives for
/// other crates. The returned guard flushes the log file when dropped.
fn init_logging(cli: &Cli, logging: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let filter = logging.env_filter(EnvFilter::from_default_env(), cli.log_level())?;

    let (file_layer, guard) = if logging.file_logging {
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_suffix("log")
            .max_log_files(logging.max_log_files)
            .build(&logging.log_dir)
            .map_err(|e| {
                AppError::generic(format!(
                    "Failed to open log directory {}: {}",
                    logging.log_dir.display(),
                    e
                ))
            })?;
        let (writer, guard) = tracing_appender::non_blocking(appender);
        (
            Some(fmt::layer().with_writer(writer).with_ansi(false)),
            Some(guard),
        )
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(cli.global.very_verbose),
        )
        .with(file_layer)
        .try_init()
        .map_err(|e| AppError::generic(format!("Failed to initialize logging: {}", e)))?;

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
    Ok(guard)
}
