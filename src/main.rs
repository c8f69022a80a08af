//! qcom-crawler - Product-listing extraction for Indian quick-commerce sites

use anyhow::Result;
use clap::{Parser, Subcommand};
use qcom_crawler::commands::{BatchCommand, ExtractCommand};
use qcom_crawler::config::{Config, OutputFormat};
use qcom_crawler::extract::Site;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "qcom-crawler",
    version,
    about = "Product-listing extraction for Indian quick-commerce sites",
    long_about = "Extracts normalized product listings (name, price, MRP, discount, image, URL) \
                  from captured pages of Blinkit, Zepto, Swiggy Instamart, BigBasket, and JioMart."
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "table", global = true)]
    format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract products from one captured page
    #[command(alias = "x")]
    Extract {
        /// Captured HTML file
        file: PathBuf,

        /// Site the page was captured from (defaults to the configured site)
        #[arg(short, long)]
        site: Option<Site>,

        /// Search query that produced the page
        #[arg(short, long)]
        query: String,

        /// Maximum number of products to keep
        #[arg(short, long)]
        max: Option<usize>,
    },

    /// Run captured pages for several sites through the batch pipeline
    #[command(alias = "b")]
    Batch {
        /// Search query the pages were captured for
        #[arg(short, long)]
        query: String,

        /// site=file pair, repeatable
        #[arg(short, long = "page", value_parser = parse_page_pair, required = true)]
        pages: Vec<(Site, PathBuf)>,

        /// Maximum number of products to keep per site
        #[arg(short, long)]
        max: Option<usize>,
    },

    /// List supported sites
    Sites,
}

fn parse_page_pair(s: &str) -> Result<(Site, PathBuf), String> {
    let (site, path) = s
        .split_once('=')
        .ok_or_else(|| format!("expected site=file, got '{}'", s))?;
    let site: Site = site.parse().map_err(|e: qcom_crawler::extract::sites::SiteParseError| {
        e.to_string()
    })?;
    if path.is_empty() {
        return Err(format!("empty file path in '{}'", s));
    }
    Ok((site, PathBuf::from(path)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::from_default_env().add_directive(Level::WARN.into())
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Load config with layered overrides
    let mut config = Config::load(cli.config.as_deref())?.with_env();

    // Apply CLI overrides
    config.format = cli.format;

    match cli.command {
        Commands::Extract { file, site, query, max } => {
            if let Some(max) = max {
                config.max_products = max;
            }
            let site = site.unwrap_or(config.site);

            let cmd = ExtractCommand::new(config);
            let output = cmd.execute(site, &file, &query)?;
            println!("{}", output);
        }

        Commands::Batch { query, pages, max } => {
            if let Some(max) = max {
                config.max_products = max;
            }

            let cmd = BatchCommand::new(config);
            let output = cmd.execute(pages, &query).await?;
            println!("{}", output);
        }

        Commands::Sites => {
            println!("Supported sites:\n");
            println!("{:<12} {:<22} {:<18}", "Code", "Host", "Label");
            println!("{:-<12} {:-<22} {:-<18}", "", "", "");

            for site in Site::all() {
                println!("{:<12} {:<22} {:<18}", site.to_string(), site.host(), site.label());
            }
        }
    }

    Ok(())
}
