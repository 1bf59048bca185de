use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;

use config::GlobalArgs;

#[derive(Parser)]
#[command(name = "moso", about = "Capture and relay referral attribution")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture the referral link carried by a page URL
    Capture(commands::capture::CaptureArgs),
    /// Relay the pending referral link as an event
    RecordEvent(commands::event::RecordEventArgs),
    /// Relay a brand-link click
    RecordClick(commands::click::RecordClickArgs),
    /// Show stored attribution state
    Show(commands::show::ShowArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Capture(args) => commands::capture::run(&cli.global, args).await,
        Commands::RecordEvent(args) => commands::event::run(&cli.global, args).await,
        Commands::RecordClick(args) => commands::click::run(&cli.global, args).await,
        Commands::Show(args) => commands::show::run(&cli.global, args).await,
        Commands::Config(args) => commands::config::run(&cli.global, args),
    }
}
