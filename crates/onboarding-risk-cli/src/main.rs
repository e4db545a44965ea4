mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::batch::BatchArgs;
use commands::bucket::BucketArgs;
use commands::score::ScoreArgs;
use commands::validate_rules::ValidateRulesArgs;

/// Rule-driven onboarding risk scoring
#[derive(Parser)]
#[command(
    name = "orisk",
    version,
    about = "Rule-driven onboarding risk scoring",
    long_about = "Scores customer onboarding records against a configurable rule table. \
                  Natural persons, legal entities and their shareholders are evaluated \
                  field by field; the average of the triggered rule scores is mapped \
                  to a five-tier risk level."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Path to a YAML engine configuration file
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log level for stderr diagnostics (overridden by RUST_LOG)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Score one entity record
    Score(ScoreArgs),
    /// Score an array of entity records with a shared rule index cache
    Batch(BatchArgs),
    /// Check a rule table export and summarise it
    ValidateRules(ValidateRulesArgs),
    /// Map a raw average score to its risk level
    Bucket(BucketArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config = match input::config::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };
    tracing::debug!(?config, "engine configuration loaded");

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Score(args) => commands::score::run_score(args, config),
        Commands::Batch(args) => commands::batch::run_batch(args, config),
        Commands::ValidateRules(args) => commands::validate_rules::run_validate_rules(args),
        Commands::Bucket(args) => commands::bucket::run_bucket(args),
        Commands::Version => {
            println!("orisk {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
