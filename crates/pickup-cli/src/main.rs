//! CLI application for parcel pickup notifications.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{batch, config, keywords, parse, rules};

/// Pickup - extract pickup codes, stations and addresses from parcel notifications
#[derive(Parser)]
#[command(name = "pickup")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract fields from a single message
    Parse(parse::ParseArgs),

    /// Extract fields from every message in a set of files
    Batch(batch::BatchArgs),

    /// Check, list and test user rules
    Rules(rules::RulesArgs),

    /// Inspect keyword lexicons
    Keywords(keywords::KeywordsArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Parse(args) => parse::run(args, config_path),
        Commands::Batch(args) => batch::run(args, config_path),
        Commands::Rules(args) => rules::run(args, config_path),
        Commands::Keywords(args) => keywords::run(args, config_path),
        Commands::Config(args) => config::run(args, config_path),
    }
}
