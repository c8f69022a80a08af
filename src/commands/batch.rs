//! Multi-site batch extraction command.

use crate::config::Config;
use crate::extract::Site;
use crate::format::Formatter;
use crate::pipeline::{run_batch, FileSource, PageSource};
use anyhow::Result;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Runs several captured pages through the two-phase batch pipeline.
pub struct BatchCommand {
    config: Config,
}

impl BatchCommand {
    /// Creates a new batch command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Executes the batch over `site=file` pairs and returns formatted
    /// output. Later pairs override earlier ones for the same site.
    pub async fn execute(&self, pages: Vec<(Site, PathBuf)>, query: &str) -> Result<String> {
        let map: HashMap<Site, PathBuf> = pages.into_iter().collect();
        let source = FileSource::new(map);
        let sites = source.sites();

        info!("Batch over {} sites for '{}'", sites.len(), query);

        let source: Arc<dyn PageSource> = Arc::new(source);
        let mut report = run_batch(source, &sites, query).await;

        for outcome in &mut report.results {
            if let Some(result) = &mut outcome.result {
                result.truncate(self.config.max_products);
            }
        }
        report.total_products = report.results.iter().map(|o| o.product_count()).sum();

        let formatter = Formatter::new(self.config.format);
        Ok(formatter.format_report(&report))
    }
}
