use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use repoharvest_api::GitHubClient;
use repoharvest_core::{Config, ExportFormat, FileSink, GitHubProvider, Harvester};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "repoharvest")]
#[command(version, about = "Harvest a dataset of popular GitHub repositories with topics and READMEs", long_about = None)]
struct Cli {
    /// Config file (defaults to the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Read the GitHub token from this file
    #[arg(long, global = true)]
    token_file: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Retrieve repositories and write them out in chunks
    Harvest {
        /// Most repositories to write in this run
        #[arg(long)]
        total: Option<usize>,

        /// Repositories per output file
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Only repositories with more stars than this
        #[arg(long)]
        min_stars: Option<u64>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (csv or json)
        #[arg(short, long)]
        format: Option<String>,
    },
    /// Check that the token is accepted by GitHub
    Verify,
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "repoharvest={level},repoharvest_core={level},repoharvest_api={level}",
                    level = level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().context("Failed to load config")?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = load_config(cli.config.as_ref())?;

    // The token is read once; nothing runs without it
    let token = config.resolve_token(cli.token_file.as_deref())?;
    let client = GitHubClient::new(config.client_config(token))
        .context("Failed to build GitHub client")?
        .with_retry_config(config.retry_config());

    match cli.command {
        Commands::Verify => match client.verify().await? {
            Some(login) => println!("Token OK, authenticated as {}", login),
            None => anyhow::bail!("GitHub did not return a user for this token"),
        },
        Commands::Harvest {
            total,
            chunk_size,
            min_stars,
            output,
            format,
        } => {
            if let Some(total) = total {
                config.harvest.total_items = total;
            }
            if let Some(chunk_size) = chunk_size {
                anyhow::ensure!(chunk_size > 0, "--chunk-size must be at least 1");
                config.harvest.chunk_size = chunk_size;
            }
            if let Some(min_stars) = min_stars {
                config.harvest.start_from_stars = min_stars;
            }
            if let Some(output) = output {
                config.output.directory = output;
            }
            if let Some(format) = format {
                config.output.format = ExportFormat::from_extension(&format)
                    .with_context(|| format!("Unknown format '{}', expected csv or json", format))?;
            }

            let mut sink = FileSink::new(&config.output.directory, config.output.format);
            let mut harvester =
                Harvester::new(GitHubProvider::from_client(client), config.harvest_params());
            let summary = harvester
                .run(&mut sink, chrono::Utc::now().date_naive())
                .await?;

            println!(
                "Wrote {} repositories in {} files to {}",
                summary.records_written,
                summary.chunks_written,
                config.output.directory.display()
            );
            if !summary.exhausted && summary.records_written < config.harvest.total_items {
                tracing::warn!(
                    "Stopped before the budget was spent; last star threshold was {}",
                    summary.final_min_stars
                );
            }
        }
    }

    Ok(())
}
