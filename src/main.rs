//! Command-line interface for the nefuda price tracker.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

use nefuda::{BatchRunner, BrandBook, Config, Orchestrator, StatsStore};

#[derive(Parser)]
#[command(name = "nefuda", version, about = "Flea-market price trend tracker")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, env = "NEFUDA_CONFIG")]
    config: Option<PathBuf>,

    /// Override the data directory holding the CSV time series.
    #[arg(long, global = true, env = "NEFUDA_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Override the brand taxonomy file.
    #[arg(long, global = true, env = "NEFUDA_BRAND_FILE")]
    brands: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape every configured (site, brand) pair and save daily statistics.
    Run,
    /// Scrape a single target and print the prices found.
    Scrape {
        site: String,
        keyword: String,
        /// Stop after this many prices (overrides the site default).
        #[arg(long)]
        max_items: Option<usize>,
        /// Also save the daily statistics row.
        #[arg(long)]
        save: bool,
    },
    /// Print the stored time series for a target.
    Show { site: String, keyword: String },
    /// List configured sites.
    Sites,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref())?;
    let (mut settings, sites) = config.into_runtime();
    if let Some(dir) = cli.data_dir {
        settings.data_dir = dir;
    }
    if let Some(path) = cli.brands {
        settings.brand_file = path;
    }

    match cli.command {
        Command::Run => {
            let store = StatsStore::new(&settings.data_dir)?;
            let book = BrandBook::load_or_seed(&settings.brand_file);
            if book.is_empty() {
                println!("{} No brands configured in {}", style("!").yellow(), settings.brand_file.display());
                return Ok(());
            }

            let orchestrator = Orchestrator::new(&settings, &sites);
            let runner = BatchRunner::new(orchestrator, &store, &settings);
            let summary = runner.run(&book).await;
            println!("{} {}", style("✓").green(), summary);
        }

        Command::Scrape {
            site,
            keyword,
            max_items,
            save,
        } => {
            let orchestrator = Orchestrator::new(&settings, &sites);
            let prices = orchestrator.scrape(&site, &keyword, max_items).await;

            if prices.is_empty() {
                println!("{} No prices found for {site}/{keyword}", style("!").yellow());
            } else {
                println!("{} prices for {site}/{keyword}:", prices.len());
                for price in &prices {
                    println!("  ¥{price}");
                }
            }

            if save {
                let store = StatsStore::new(&settings.data_dir)?;
                store.save(&site, &keyword, &prices)?;
            }
        }

        Command::Show { site, keyword } => {
            let store = StatsStore::new(&settings.data_dir)?;
            let rows = store.load(&site, &keyword);
            if rows.is_empty() {
                println!("{} No data for {site}/{keyword}", style("!").yellow());
                return Ok(());
            }

            println!("{:<12} {:>6} {:>12} {:>10} {:>10}", "date", "count", "avg", "min", "max");
            for row in rows {
                println!(
                    "{:<12} {:>6} {:>12.2} {:>10} {:>10}",
                    row.date.to_string(),
                    row.count,
                    row.average_price,
                    row.min_price,
                    row.max_price
                );
            }
        }

        Command::Sites => {
            for (name, site) in &sites {
                println!("{:<12} {}", style(name).bold(), site.url_template);
            }
        }
    }

    Ok(())
}
