//! Command handlers for the ad_report_sync CLI
//!
//! Each handler takes its parsed arguments plus the loaded configuration and
//! drives the library. Human-facing summaries go to stdout, diagnostics go
//! through tracing.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::Local;
use tracing::{debug, info};

use crate::app::client::HttpHandler;
use crate::app::coordinator::{Coordinator, RunOptions, RunReport, RunStats};
use crate::app::dates::DateRange;
use crate::auth::{get_token_status, Tokens};
use crate::cli::{ConfigAction, ConfigArgs, DecomposeArgs, GlobalArgs, RunArgs};
use crate::config::AppConfig;
use crate::errors::Result;

/// Handle the run command
///
/// Loads the tokens before any network call, runs the coordinator and always
/// emits the completion markers, whether the run succeeded or not.
pub async fn handle_run(args: RunArgs, config: AppConfig) -> Result<()> {
    let started_at = Local::now();
    let timer = Instant::now();
    info!("Run started at {}", started_at.format("%Y-%m-%d %H:%M:%S"));

    let result = execute_run(args, config).await;

    let report = match &result {
        Ok(_) => RunReport::success("run", started_at, timer.elapsed()),
        Err(e) => RunReport::failure("run", started_at, timer.elapsed(), e),
    };
    report.log();

    let stats = result?;
    print_run_summary(&stats);
    Ok(())
}

async fn execute_run(args: RunArgs, config: AppConfig) -> Result<RunStats> {
    let tokens = Tokens::from_env()?;
    let transport = Arc::new(HttpHandler::from_config(&config.http)?);

    let anchor = args.anchor_date.unwrap_or_else(DateRange::today);
    let options = RunOptions::all(anchor)
        .with_clients(args.clients)
        .with_sources(args.sources);
    debug!("Run options: {:?}", options);

    let coordinator = Coordinator::new(config, &tokens, transport)?;
    coordinator.run(&options).await
}

fn print_run_summary(stats: &RunStats) {
    println!("✅ Run completed in {:.1}s", stats.duration.as_secs_f64());
    for source in &stats.sources {
        println!(
            "   {:<16} {:<11} fetched {:>6}  saved {:>6}",
            source.client,
            source.source.name(),
            source.rows_fetched,
            source.rows_saved()
        );
    }
    println!("   Total rows saved: {}", stats.rows_saved());
}

/// Handle the tokens command
pub fn handle_tokens() -> Result<()> {
    let status = get_token_status();

    println!("API tokens:");
    for (var, present) in &status.entries {
        let mark = if *present { "✅" } else { "❌" };
        println!("   {} {}", mark, var);
    }

    if status.is_complete() {
        println!("All tokens are available.");
    } else {
        println!();
        println!(
            "Missing: {}. Set them in the environment or a .env file.",
            status.missing().join(", ")
        );
    }
    Ok(())
}

/// Handle configuration commands
pub async fn handle_config(args: ConfigArgs, global: &GlobalArgs, config: &AppConfig) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
        ConfigAction::Init { force, path } => {
            let target = resolve_init_path(path, global)?;
            AppConfig::write_default(&target, force).await?;
            println!("✅ Wrote default configuration to {}", target.display());
            Ok(())
        }
    }
}

fn resolve_init_path(path: Option<PathBuf>, global: &GlobalArgs) -> Result<PathBuf> {
    match path.or_else(|| global.config.clone()) {
        Some(path) => Ok(path),
        None => AppConfig::get_default_config_path(),
    }
}

/// Handle the decompose command
pub fn handle_decompose(args: DecomposeArgs, config: &AppConfig) -> Result<()> {
    let schema = &config.campaign;
    let attributes = schema.decompose(&args.name);

    println!("Campaign: {}", args.name);
    if !schema.is_tagged(&args.name) {
        println!("(no '{}' delimiter, every attribute is padded)", schema.delimiter);
    }
    for (column, value) in attributes.iter() {
        println!("   {:<16} {}", column, value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn global(config: Option<PathBuf>) -> GlobalArgs {
        GlobalArgs {
            verbose: false,
            very_verbose: false,
            quiet: false,
            config,
            output_dir: None,
        }
    }

    #[test]
    fn test_init_path_precedence() {
        let explicit = PathBuf::from("explicit.toml");
        let from_flag = PathBuf::from("flag.toml");

        assert_eq!(
            resolve_init_path(Some(explicit.clone()), &global(Some(from_flag.clone()))).unwrap(),
            explicit
        );
        assert_eq!(
            resolve_init_path(None, &global(Some(from_flag.clone()))).unwrap(),
            from_flag
        );
    }

    #[tokio::test]
    async fn test_config_init_writes_loadable_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let args = ConfigArgs {
            action: ConfigAction::Init {
                force: false,
                path: Some(path.clone()),
            },
        };

        handle_config(args, &global(None), &AppConfig::default())
            .await
            .unwrap();

        let loaded = AppConfig::load(Some(path)).await.unwrap();
        assert_eq!(loaded.clients, AppConfig::default().clients);
    }

    #[tokio::test]
    async fn test_config_init_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "# mine\n").unwrap();

        let args = ConfigArgs {
            action: ConfigAction::Init {
                force: false,
                path: Some(path.clone()),
            },
        };
        assert!(handle_config(args, &global(None), &AppConfig::default())
            .await
            .is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# mine\n");
    }

    #[test]
    fn test_decompose_runs_for_untagged_name() {
        let args = DecomposeArgs {
            name: "brand".to_string(),
        };
        assert!(handle_decompose(args, &AppConfig::default()).is_ok());
    }
}
