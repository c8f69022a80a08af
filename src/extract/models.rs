//! Data models for extracted products and result envelopes.

use crate::extract::sites::Site;
use serde::{Deserialize, Serialize};

/// A normalized product from one site's listing page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product display name
    pub name: String,
    /// Current selling price in rupees
    pub price: Option<f64>,
    /// List/strikethrough price; `mrp >= price` when both present
    pub mrp: Option<f64>,
    /// Discount percentage, derived when `mrp > price`
    pub discount: Option<f64>,
    /// Absolute discount (`mrp - price`), derived when `mrp > price`
    pub discount_amount: Option<f64>,
    /// Whether the listing carries an out-of-stock marker
    pub is_out_of_stock: bool,
    /// Absolute image URL
    pub image_url: Option<String>,
    /// Absolute product page URL
    pub product_url: Option<String>,
}

impl Product {
    /// Returns true when the product offers a derivable discount.
    pub fn has_discount(&self) -> bool {
        self.discount.is_some()
    }

    /// Returns the dedup key used across a single extraction result.
    pub fn dedup_key(&self) -> String {
        match &self.product_url {
            Some(url) => url.clone(),
            None => format!("{}|{}", self.name.to_lowercase().trim(), fmt_price(self.price)),
        }
    }
}

fn fmt_price(price: Option<f64>) -> String {
    match price {
        Some(p) => format!("{:.2}", p),
        None => "-".to_string(),
    }
}

/// A partially-populated product produced by one extraction strategy,
/// before validation and dedup.
#[derive(Debug, Clone, Default)]
pub struct Candidate {
    pub name: String,
    pub price: Option<f64>,
    pub mrp: Option<f64>,
    pub image_url: Option<String>,
    pub product_url: Option<String>,
    pub out_of_stock: Option<bool>,
}

impl Candidate {
    /// Creates a candidate with just a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }

    /// Returns true when at least one of price/URL was recovered.
    pub fn has_substance(&self) -> bool {
        self.price.is_some() || self.product_url.is_some()
    }
}

/// One site's extraction result, the envelope shared by all sites.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteResult {
    /// Human-readable site name
    pub website: String,
    /// Delivery location detected from page chrome, if any
    pub location: Option<String>,
    /// The search query that produced the page
    #[serde(rename = "product")]
    pub query: String,
    /// RFC 3339 timestamp generated at envelope-build time
    pub timestamp: String,
    /// Deduplicated products in extraction order
    pub products: Vec<Product>,
    /// Always equals `products.len()`
    pub total_products: usize,
    /// Source file the page was read from, when applicable
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl SiteResult {
    /// Wraps a product list in the shared envelope. The timestamp is taken
    /// at call time, not at product-capture time.
    pub fn new(
        site: Site,
        query: impl Into<String>,
        location: Option<String>,
        products: Vec<Product>,
    ) -> Self {
        let total_products = products.len();
        Self {
            website: site.label().to_string(),
            location,
            query: query.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            products,
            total_products,
            filename: None,
        }
    }

    /// Attaches the source filename as provenance.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Returns true if no products were extracted.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Caps the product list, keeping extraction order and the envelope
    /// count in sync.
    pub fn truncate(&mut self, max: usize) {
        self.products.truncate(max);
        self.total_products = self.products.len();
    }
}

/// Per-site slot in a multi-site batch report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteOutcome {
    pub website: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<SiteResult>,
}

impl SiteOutcome {
    /// A successful slot wrapping a site result.
    pub fn ok(result: SiteResult) -> Self {
        Self { website: result.website.clone(), success: true, error: None, result: Some(result) }
    }

    /// A soft-failure slot carrying the error message.
    pub fn failed(site: Site, error: impl Into<String>) -> Self {
        Self { website: site.label().to_string(), success: false, error: Some(error.into()), result: None }
    }

    /// Number of products in this slot (zero for failures).
    pub fn product_count(&self) -> usize {
        self.result.as_ref().map_or(0, |r| r.products.len())
    }
}

/// Aggregated response of a multi-site batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiSiteReport {
    #[serde(rename = "product")]
    pub query: String,
    pub timestamp: String,
    pub results: Vec<SiteOutcome>,
    pub total_sites: usize,
    pub successful_sites: usize,
    pub total_products: usize,
}

impl MultiSiteReport {
    /// Builds the aggregate from per-site outcomes.
    pub fn new(query: impl Into<String>, results: Vec<SiteOutcome>) -> Self {
        let total_sites = results.len();
        let successful_sites = results.iter().filter(|r| r.success).count();
        let total_products = results.iter().map(SiteOutcome::product_count).sum();
        Self {
            query: query.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            results,
            total_sites,
            successful_sites,
            total_products,
        }
    }

    /// Returns true when every site failed.
    pub fn all_failed(&self) -> bool {
        self.successful_sites == 0 && self.total_sites > 0
    }
}
