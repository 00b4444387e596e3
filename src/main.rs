use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use tapewire::app::App;
use tapewire::config::Config;

#[derive(Parser)]
#[command(name = "tapewire", version, about = "Multi-venue trade stream ingestion daemon")]
struct Cli {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the ingestion fleet (default).
    Run,
    /// Validate the configuration and print the venue fleet.
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config))?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            config.init_logging();
            info!("tapewire starting");
            App::run(config).await?;
            info!("tapewire stopped");
        }
        Command::Check => {
            println!("config ok: {} venue(s)", config.venues.len());
            for venue in &config.venues {
                println!(
                    "  {:<16} {:<10} enabled={} whale_threshold={} interval={}s urls={}",
                    venue.name,
                    venue.kind.as_str(),
                    venue.enabled,
                    venue.whale_threshold,
                    venue.candle_interval_secs,
                    venue.feed_urls.len(),
                );
            }
        }
    }

    Ok(())
}
