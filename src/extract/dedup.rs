//! Candidate validation, deduplication, and normalization.
//!
//! Every strategy feeds its raw candidates through here; this is the only
//! place that turns a [`Candidate`] into a [`Product`].

use crate::extract::models::{Candidate, Product};
use crate::extract::price::round2;
use crate::extract::profiles::{has_stock_marker, is_blocklisted, SiteProfile};
use crate::extract::url::is_absolute_http;
use std::collections::HashSet;
use tracing::trace;

/// Collapses raw candidates into the canonical product list.
///
/// Rejects names below the site minimum or matching the UI-chrome
/// blocklist, coerces prices, enforces `mrp >= price`, derives discount
/// fields, and dedups by product URL and case-insensitive name with
/// first-seen-wins ordering.
pub fn normalize(candidates: Vec<Candidate>, profile: &SiteProfile) -> Vec<Product> {
    let mut seen_urls: HashSet<String> = HashSet::new();
    let mut seen_names: HashSet<String> = HashSet::new();
    let mut products = Vec::new();

    for candidate in candidates {
        let Some(product) = validate(candidate, profile) else {
            continue;
        };

        let name_key = product.name.trim().to_lowercase();
        if seen_names.contains(&name_key) {
            trace!("Dropping duplicate name: {}", product.name);
            continue;
        }
        if let Some(url) = &product.product_url {
            if seen_urls.contains(url) {
                trace!("Dropping duplicate URL: {}", url);
                continue;
            }
            seen_urls.insert(url.clone());
        }
        seen_names.insert(name_key);
        products.push(product);
    }

    products
}

fn validate(candidate: Candidate, profile: &SiteProfile) -> Option<Product> {
    let name = candidate.name.trim().to_string();
    if name.len() < profile.min_name_len {
        return None;
    }
    if is_blocklisted(&name) {
        trace!("Blocklisted candidate: {}", name);
        return None;
    }

    // Non-positive parses are extraction noise, not free products
    let mut price = candidate.price.filter(|p| *p > 0.0).map(round2);
    let mut mrp = candidate.mrp.filter(|m| *m > 0.0).map(round2);

    // A reversed pair means the smaller value is the selling price
    if let (Some(p), Some(m)) = (price, mrp) {
        if m < p {
            price = Some(m);
            mrp = Some(p);
        }
    }

    let product_url = candidate.product_url.filter(|u| is_absolute_http(u));
    let image_url = candidate.image_url.filter(|u| is_absolute_http(u));

    // A candidate with neither a price nor a URL is unusable chrome
    if price.is_none() && product_url.is_none() {
        return None;
    }

    let (discount, discount_amount) = match (price, mrp) {
        (Some(p), Some(m)) if m > p => {
            (Some(((m - p) / m * 100.0).round()), Some(round2(m - p)))
        }
        _ => (None, None),
    };

    let is_out_of_stock = candidate.out_of_stock.unwrap_or_else(|| has_stock_marker(&name));

    Some(Product {
        name,
        price,
        mrp,
        discount,
        discount_amount,
        is_out_of_stock,
        image_url,
        product_url,
    })
}
