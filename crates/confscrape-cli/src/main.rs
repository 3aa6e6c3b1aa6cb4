use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use confscrape_core::validate_conference;
use confscrape_pipeline::{load_conference_file, Pipeline, PipelineConfig, MANUAL_FILE};

#[derive(Debug, Parser)]
#[command(name = "confscrape")]
#[command(about = "Academic conference tracker pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the full scrape + merge pipeline and rewrite the data file.
    Run,
    /// Parse the manual overrides file and report invalid entries.
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = PipelineConfig::from_env();

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let pipeline = Pipeline::new(config)?;
            let summary = pipeline.run_once().await?;
            println!(
                "run complete: run_id={} existing={} scraped={} manual={} total={} output={}",
                summary.run_id,
                summary.existing,
                summary.scraped,
                summary.manual,
                summary.total,
                summary.output_path.display()
            );
            if !summary.failed_sources.is_empty() {
                println!("failed sources: {}", summary.failed_sources.join(", "));
            }
        }
        Commands::Check => {
            let path = config.data_dir.join(MANUAL_FILE);
            let records = load_conference_file(&path).await?;
            let invalid: Vec<_> = records
                .iter()
                .filter(|record| !validate_conference(record))
                .collect();
            println!(
                "{}: {} entries, {} invalid",
                path.display(),
                records.len(),
                invalid.len()
            );
            for record in &invalid {
                println!(
                    "  invalid: name={:?} short_name={:?} year={:?}",
                    record.name, record.short_name, record.year
                );
            }
            if !invalid.is_empty() {
                bail!("manual overrides file has invalid entries");
            }
        }
    }

    Ok(())
}
