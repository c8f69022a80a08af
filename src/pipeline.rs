//! Multi-site orchestration: independent extraction jobs with a two-phase
//! barrier.
//!
//! Pages come from a [`PageSource`] — the seam to the external browser-
//! driving fetcher. Every site job is independent; a failing site becomes a
//! soft slot in the aggregate report and never aborts its siblings. One
//! site runs strictly after the concurrent group completes.

use crate::extract::{Extractor, MultiSiteReport, Site, SiteOutcome};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Produces captured page HTML for extraction. Implemented over files for
/// offline runs; a live browser-driving fetcher plugs in the same way.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Returns the post-render HTML for a site/query pair.
    async fn page(&self, site: Site, query: &str) -> Result<String>;

    /// Provenance label for the page, when one exists.
    fn filename(&self, _site: Site) -> Option<String> {
        None
    }
}

/// File-backed page source over pre-captured pages.
pub struct FileSource {
    pages: HashMap<Site, PathBuf>,
}

impl FileSource {
    /// Creates a source over a site-to-file map.
    pub fn new(pages: HashMap<Site, PathBuf>) -> Self {
        Self { pages }
    }

    /// The sites this source can serve, in canonical order.
    pub fn sites(&self) -> Vec<Site> {
        Site::all().iter().copied().filter(|site| self.pages.contains_key(site)).collect()
    }
}

#[async_trait]
impl PageSource for FileSource {
    async fn page(&self, site: Site, _query: &str) -> Result<String> {
        let path = self
            .pages
            .get(&site)
            .with_context(|| format!("no captured page for {}", site))?;
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))
    }

    fn filename(&self, site: Site) -> Option<String> {
        self.pages
            .get(&site)
            .and_then(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
    }
}

/// The site that runs strictly after the concurrent group completes.
pub const DEFERRED_SITE: Site = Site::Bigbasket;

/// Runs extraction for the given sites: everything except
/// [`DEFERRED_SITE`] concurrently, then the deferred site. Outcomes keep
/// request order within each phase.
pub async fn run_batch(
    source: Arc<dyn PageSource>,
    sites: &[Site],
    query: &str,
) -> MultiSiteReport {
    let mut outcomes = Vec::with_capacity(sites.len());
    let mut handles = Vec::new();

    for site in sites.iter().copied().filter(|site| *site != DEFERRED_SITE) {
        let source = Arc::clone(&source);
        let query = query.to_string();
        handles.push((site, tokio::spawn(async move { run_site(source, site, &query).await })));
    }

    for (site, handle) in handles {
        match handle.await {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                warn!("Extraction task for {} panicked: {}", site, e);
                outcomes.push(SiteOutcome::failed(site, format!("task failed: {e}")));
            }
        }
    }

    if sites.contains(&DEFERRED_SITE) {
        outcomes.push(run_site(source, DEFERRED_SITE, query).await);
    }

    MultiSiteReport::new(query, outcomes)
}

/// Runs one site's job, converting every failure into a soft outcome.
async fn run_site(source: Arc<dyn PageSource>, site: Site, query: &str) -> SiteOutcome {
    let html = match source.page(site, query).await {
        Ok(html) => html,
        Err(e) => {
            warn!("Page fetch failed for {}: {:#}", site, e);
            return SiteOutcome::failed(site, format!("page fetch failed: {e:#}"));
        }
    };

    match Extractor::new(site).extract(&html, query) {
        Ok(mut result) => {
            if let Some(name) = source.filename(site) {
                result = result.with_filename(name);
            }
            info!("{}: {} products", site, result.total_products);
            SiteOutcome::ok(result)
        }
        Err(e) => {
            warn!("Extraction failed for {}: {}", site, e);
            SiteOutcome::failed(site, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// In-memory page source for pipeline tests.
    struct MockSource {
        pages: HashMap<Site, String>,
    }

    #[async_trait]
    impl PageSource for MockSource {
        async fn page(&self, site: Site, _query: &str) -> Result<String> {
            self.pages
                .get(&site)
                .cloned()
                .with_context(|| format!("no page for {}", site))
        }
    }

    fn product_page(name: &str, price: u32) -> String {
        format!(
            r#"<html><body><div class="product"><h3>{name}</h3><span>₹{price}</span></div></body></html>"#
        )
    }

    #[tokio::test]
    async fn test_batch_mixed_success_and_failure() {
        let mut pages = HashMap::new();
        pages.insert(Site::Blinkit, product_page("Lays Classic 52g", 20));
        pages.insert(Site::Zepto, String::new()); // unparsable
        pages.insert(Site::Bigbasket, product_page("Tata Salt 1kg Pack", 28));

        let source = Arc::new(MockSource { pages });
        let report = run_batch(
            source,
            &[Site::Blinkit, Site::Zepto, Site::Instamart, Site::Bigbasket],
            "staples",
        )
        .await;

        assert_eq!(report.total_sites, 4);
        assert_eq!(report.successful_sites, 1);
        assert_eq!(report.total_products, 1);
        assert!(!report.all_failed());

        // Zepto: unparsable input becomes a soft failure slot
        let zepto = report.results.iter().find(|o| o.website == "Zepto").unwrap();
        assert!(!zepto.success);
        assert!(zepto.error.as_deref().unwrap().contains("no markup"));

        // Instamart: missing page becomes a fetch failure slot
        let instamart =
            report.results.iter().find(|o| o.website == "Swiggy Instamart").unwrap();
        assert!(!instamart.success);
        assert!(instamart.error.as_deref().unwrap().contains("page fetch failed"));
    }

    #[tokio::test]
    async fn test_deferred_site_runs_last() {
        let mut pages = HashMap::new();
        pages.insert(Site::Blinkit, product_page("Lays Classic 52g", 20));
        pages.insert(Site::Bigbasket, product_page("Tata Salt 1kg Pack", 28));

        let source = Arc::new(MockSource { pages });
        let report = run_batch(source, &[Site::Bigbasket, Site::Blinkit], "staples").await;

        // BigBasket is deferred to the second phase regardless of request order
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.results[0].website, "Blinkit");
        assert_eq!(report.results[1].website, "BigBasket");
        assert_eq!(report.successful_sites, 2);
    }

    #[tokio::test]
    async fn test_all_sites_failing_still_reports() {
        let source = Arc::new(MockSource { pages: HashMap::new() });
        let report = run_batch(source, &[Site::Blinkit, Site::Zepto], "milk").await;

        assert!(report.all_failed());
        assert_eq!(report.total_products, 0);
        assert!(report.results.iter().all(|o| !o.success && o.error.is_some()));
    }

    #[tokio::test]
    async fn test_file_source_reads_and_labels() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blinkit_milk.html");
        std::fs::write(&path, product_page("Amul Taaza Toned Milk 500ml", 27)).unwrap();

        let mut pages = HashMap::new();
        pages.insert(Site::Blinkit, path);
        let source = FileSource::new(pages);

        assert_eq!(source.sites(), vec![Site::Blinkit]);
        assert_eq!(source.filename(Site::Blinkit).as_deref(), Some("blinkit_milk.html"));
        assert!(source.filename(Site::Zepto).is_none());

        let source: Arc<dyn PageSource> = Arc::new(source);
        let report = run_batch(source, &[Site::Blinkit], "milk").await;
        assert_eq!(report.successful_sites, 1);
        let result = report.results[0].result.as_ref().unwrap();
        assert_eq!(result.filename.as_deref(), Some("blinkit_milk.html"));
        assert_eq!(result.products[0].name, "Amul Taaza Toned Milk 500ml");
    }
}
