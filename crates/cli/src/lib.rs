pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use fuel_core::config::{ConfigOverrides, LoadOptions, LogFormat, LoggingConfig};
use tracing::Level;

#[derive(Debug, Parser)]
#[command(
    name = "fuel",
    about = "Approval policy provisioning CLI",
    long_about = "Create approval types and policies on the approval integration service and assign them to legal entities.",
    after_help = "Examples:\n  fuel plan --entities entities.json\n  fuel provision --entities entities.json --max-concurrency 4\n  fuel doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Config file to load instead of fuel.toml / config/fuel.toml")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Override logging.level")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Provision approval types, policies and assignments against the remote services")]
    Provision {
        #[arg(long, help = "JSON file with the legal entities to provision")]
        entities: PathBuf,
        #[arg(long, help = "Override provisioning.max_concurrency")]
        max_concurrency: Option<usize>,
        #[arg(long, help = "Stop at the first failed legal entity")]
        stop_on_error: bool,
    },
    #[command(about = "Dry run against in-memory services and print the requests a run would send")]
    Plan {
        #[arg(long, help = "JSON file with the legal entities to plan for")]
        entities: PathBuf,
    },
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, admin credentials and service endpoint reachability")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let overrides = ConfigOverrides { log_level: cli.log_level, ..ConfigOverrides::default() };

    let result = match cli.command {
        Command::Provision { entities, max_concurrency, stop_on_error } => {
            let overrides = ConfigOverrides {
                max_concurrency,
                continue_on_error: stop_on_error.then_some(false),
                ..overrides
            };
            commands::provision::run(load_options(cli.config, overrides), &entities)
        }
        Command::Plan { entities } => {
            commands::plan::run(load_options(cli.config, overrides), &entities)
        }
        Command::Config => commands::CommandResult {
            exit_code: 0,
            output: commands::config::run(load_options(cli.config, overrides)),
        },
        Command::Doctor { json } => commands::CommandResult {
            exit_code: 0,
            output: commands::doctor::run(load_options(cli.config, overrides), json),
        },
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// An explicit `--config` must exist; the default candidates are optional.
fn load_options(config_path: Option<PathBuf>, overrides: ConfigOverrides) -> LoadOptions {
    LoadOptions { require_file: config_path.is_some(), config_path, overrides }
}

/// Logs go to stderr so stdout stays a single JSON document. A second call
/// keeps the first subscriber.
pub fn init_logging(config: &LoggingConfig) {
    let log_level = config.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let _ = match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
