use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use review_analyzer::{Analyzer, AnalyzerConfig};

/// Analyze the customer reviews of a product listing and print the report as JSON.
#[derive(Parser, Debug)]
#[command(name = "review-analyzer", version, about)]
struct Cli {
    /// Product listing or review page URL
    #[arg(required_unless_present = "html")]
    url: Option<String>,

    /// Analyze a saved HTML page instead of fetching
    #[arg(long, value_name = "FILE", conflicts_with = "url")]
    html: Option<PathBuf>,

    /// Number of review pages to fetch (overrides REVIEW_PAGES)
    #[arg(short, long)]
    pages: Option<u32>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = AnalyzerConfig::from_env();
    if let Some(pages) = cli.pages {
        config.fetch.review_pages = pages.max(1);
    }
    let analyzer = Analyzer::new(config)?;

    let result = match (&cli.html, &cli.url) {
        (Some(path), _) => {
            let html = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            analyzer.analyze_html(&html).await?
        }
        (None, Some(url)) => analyzer.analyze(url).await?,
        (None, None) => anyhow::bail!("either a URL or --html is required"),
    };

    let json = if cli.pretty {
        serde_json::to_string_pretty(&result)?
    } else {
        serde_json::to_string(&result)?
    };
    println!("{}", json);
    Ok(())
}
