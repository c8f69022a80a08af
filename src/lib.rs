//! qcom-crawler - Product-listing extraction for Indian quick-commerce sites
//!
//! Given post-render HTML captured from Blinkit, Zepto, Swiggy Instamart,
//! BigBasket, or JioMart, extracts a deduplicated, normalized product list
//! (name, price, MRP, discount, image, URL, stock) with best-effort field
//! recovery under inconsistent markup. Browser driving lives outside this
//! crate; pages come in as strings through the [`pipeline::PageSource`]
//! seam.

pub mod commands;
pub mod config;
pub mod error;
pub mod extract;
pub mod format;
pub mod pipeline;

pub use config::Config;
pub use error::ExtractError;
pub use extract::{Extractor, MultiSiteReport, Product, Site, SiteOutcome, SiteResult};
