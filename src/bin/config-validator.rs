//! # Interview Configuration Validator
//!
//! Command-line tool for validating interview engine configuration files.
//! Loads the same layers the service does (defaults, `interview.yaml`,
//! `interview.{env}.yaml`, `INTERVIEW__*` variables) and prints the
//! effective result.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use interview_core::config::{ConfigManager, InterviewConfig};
use std::path::PathBuf;
use std::process;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "config-validator")]
#[command(about = "Validate interview engine configuration files")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Environment to validate (development, test, production, ...)
    #[arg(short, long, default_value = "development")]
    environment: String,

    /// Configuration directory path (default: config)
    #[arg(short, long)]
    config_dir: Option<PathBuf>,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format for the effective configuration
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate and print the effective configuration
    Validate,

    /// List environments that have an override file in the config directory
    Environments,

    /// Print the built-in defaults
    Defaults,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let _subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .try_init();

    let result = match &cli.command {
        Some(Commands::Validate) | None => validate(&cli),
        Some(Commands::Environments) => list_environments(&cli),
        Some(Commands::Defaults) => print_config(&InterviewConfig::default(), cli.format),
    };

    match result {
        Ok(()) => {
            info!("Configuration validation completed successfully");
            process::exit(0);
        }
        Err(e) => {
            error!("Configuration validation failed: {:#}", e);
            eprintln!("❌ {e:#}");
            process::exit(1);
        }
    }
}

fn config_dir(cli: &Cli) -> PathBuf {
    cli.config_dir.clone().unwrap_or_else(|| PathBuf::from("config"))
}

fn validate(cli: &Cli) -> anyhow::Result<()> {
    let dir = config_dir(cli);
    if !dir.is_dir() {
        bail!("Configuration directory not found: {}", dir.display());
    }

    eprintln!("🔧 Validating interview configuration");
    eprintln!("Environment: {}", cli.environment);
    eprintln!("Config Directory: {}", dir.display());

    let manager = ConfigManager::load_from_directory_with_env(Some(dir), &cli.environment)
        .context("failed to load configuration")?;
    let config = manager.config();

    eprintln!(
        "   ✅ Session: {} questions, follow-up budget {}",
        config.session.questions_per_session,
        config
            .session
            .max_follow_ups
            .map_or_else(|| "unlimited".to_string(), |n| n.to_string())
    );
    eprintln!(
        "   ✅ Retry: {} attempts, {}ms base delay, {}ms cap",
        config.retry.max_attempts, config.retry.base_delay_ms, config.retry.max_delay_ms
    );
    eprintln!(
        "   ✅ Circuit breakers: {} ({} component override(s))",
        if config.circuit_breakers.enabled {
            "enabled"
        } else {
            "disabled"
        },
        config.circuit_breakers.component_configs.len()
    );
    eprintln!("\n🎉 Configuration is valid\n");

    print_config(config, cli.format)
}

fn print_config(config: &InterviewConfig, format: OutputFormat) -> anyhow::Result<()> {
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(config)?,
        OutputFormat::Yaml => serde_yaml::to_string(config)?,
    };
    println!("{rendered}");
    Ok(())
}

fn list_environments(cli: &Cli) -> anyhow::Result<()> {
    let dir = config_dir(cli);
    if !dir.is_dir() {
        bail!("Configuration directory not found: {}", dir.display());
    }

    let mut environments: Vec<String> = std::fs::read_dir(&dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().into_owned();
            name.strip_prefix("interview.")
                .and_then(|rest| rest.strip_suffix(".yaml"))
                .map(str::to_string)
        })
        .collect();
    environments.sort();

    println!("📋 Available Environments:");
    for env in environments {
        println!("  • {env}");
    }
    Ok(())
}
