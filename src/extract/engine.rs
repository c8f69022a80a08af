//! The shared extraction engine.
//!
//! One engine serves all five sites, parameterized by [`SiteProfile`]. Each
//! call runs an ordered cascade of strategies over a captured page and
//! stops at the first one that yields usable candidates:
//!
//! 1. embedded hydration-state JSON (structured, immune to class churn),
//! 2. structural DOM extraction over the profile's candidate selectors,
//! 3. a generic text sweep over anything priced.
//!
//! Extraction is synchronous and deterministic: same page in, same
//! products out. Nothing is cached across calls.

use crate::error::ExtractError;
use crate::extract::dedup::normalize;
use crate::extract::models::{Candidate, SiteResult};
use crate::extract::price::{classify_price_node, contains_rupee_amount, extract_all_prices, resolve_price_pair, PriceTag};
use crate::extract::profiles::{
    has_stock_marker, is_blocklisted, SiteProfile, GENERIC_CARD_SELECTORS, STOCK_CLASS_FRAGMENTS,
};
use crate::extract::sites::Site;
use crate::extract::state::{collect_product_candidates, find_location, state_payloads};
use crate::extract::url::{apply_path_fixups, clean_image_url, resolve_url};
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// Text-length bounds for the generic fallback sweep.
const GENERIC_TEXT_MIN: usize = 10;
const GENERIC_TEXT_MAX: usize = 500;

/// Upper bound for a recovered product name.
const NAME_MAX: usize = 120;

/// Per-site product extractor.
pub struct Extractor {
    profile: &'static SiteProfile,
}

impl Extractor {
    /// Creates the extractor for a site.
    pub fn new(site: Site) -> Self {
        Self { profile: SiteProfile::for_site(site) }
    }

    /// The site this extractor serves.
    pub fn site(&self) -> Site {
        self.profile.site
    }

    /// Extracts products and location from a captured page.
    pub fn extract(&self, html: &str, query: &str) -> Result<SiteResult, ExtractError> {
        self.extract_with_urls(html, query, &HashMap::new())
    }

    /// Extracts products, backfilling product URLs from a side-channel
    /// `name -> url` map pre-resolved by the page fetcher (used when a
    /// site only exposes URLs through in-page navigation).
    pub fn extract_with_urls(
        &self,
        html: &str,
        query: &str,
        url_map: &HashMap<String, String>,
    ) -> Result<SiteResult, ExtractError> {
        if html.trim().is_empty() || !html.contains('<') {
            return Err(ExtractError::ParseFailure(format!(
                "input for {} contains no markup",
                self.profile.site
            )));
        }

        let document = Html::parse_document(html);
        let payloads = state_payloads(html, self.profile.state_markers);

        let mut candidates = collect_product_candidates(&payloads, self.profile);
        let mut strategy = "embedded-state";

        if !usable(&candidates) {
            candidates = self.strategy_dom(&document);
            strategy = "dom";
        }
        if !usable(&candidates) {
            candidates = self.strategy_generic(&document);
            strategy = "generic";
        }

        if candidates.is_empty() {
            debug!("No candidates for {} (all strategies empty)", self.profile.site);
        } else {
            debug!(
                "{} candidates for {} via {} strategy",
                candidates.len(),
                self.profile.site,
                strategy
            );
        }

        if !url_map.is_empty() {
            self.backfill_urls(&mut candidates, url_map);
        }

        let location = self.extract_location(&document, &payloads);
        let products = normalize(candidates, self.profile);

        Ok(SiteResult::new(self.profile.site, query, location, products))
    }

    /// Strategy 2: structural DOM extraction. Tries the profile's candidate
    /// selectors, then the shared generic card selectors, and keeps the
    /// first selector whose cards are plausible (a name plus a
    /// rupee-marked number somewhere in the batch).
    fn strategy_dom(&self, document: &Html) -> Vec<Candidate> {
        let selector_sets =
            self.profile.card_selectors.iter().chain(GENERIC_CARD_SELECTORS).copied();

        for css in selector_sets {
            let Ok(selector) = Selector::parse(css) else {
                warn!("Invalid selector skipped: {}", css);
                continue;
            };

            let cards: Vec<ElementRef> = document.select(&selector).collect();
            if cards.is_empty() {
                continue;
            }

            // Broad selectors can match a grid and its cards at once; only
            // the innermost matches are cards
            let ids: std::collections::HashSet<_> = cards.iter().map(|c| c.id()).collect();
            let candidates: Vec<Candidate> = cards
                .iter()
                .filter(|card| !card.descendants().skip(1).any(|n| ids.contains(&n.id())))
                .filter_map(|card| self.parse_card(*card))
                .collect();

            let plausible = candidates.iter().any(|c| c.price.is_some());
            if plausible {
                trace!("Selector '{}' matched {} cards", css, candidates.len());
                return candidates;
            }
        }

        Vec::new()
    }

    /// Parses one product card into a candidate. Soft-fails to `None`
    /// rather than aborting the batch.
    fn parse_card(&self, card: ElementRef) -> Option<Candidate> {
        let origin = self.profile.origin();

        let tags = price_tags(card);
        let (price, mrp) = resolve_price_pair(&tags);

        let name = self.card_name(card)?;

        let product_url = card_link(card)
            .and_then(|href| resolve_url(&href, &origin))
            .map(|url| apply_path_fixups(&url, self.profile.url_fixups));

        let image_url = card_image(card)
            .and_then(|src| resolve_url(&src, &origin))
            .map(|url| clean_image_url(&url));

        let card_text: String = card.text().collect();
        let out_of_stock = has_stock_marker(&card_text) || has_stock_class(card);

        Some(Candidate {
            name,
            price,
            mrp,
            image_url,
            product_url,
            out_of_stock: Some(out_of_stock),
        })
    }

    /// Recovers the card's product name: profile selectors first, then the
    /// longest price-free text chunk within bounds.
    fn card_name(&self, card: ElementRef) -> Option<String> {
        for css in self.profile.name_selectors {
            let Ok(selector) = Selector::parse(css) else {
                continue;
            };
            if let Some(el) = card.select(&selector).next() {
                let text = el.text().collect::<String>().trim().to_string();
                if text.len() >= self.profile.min_name_len && !is_blocklisted(&text) {
                    return Some(text);
                }
            }
        }

        card.text()
            .map(str::trim)
            .filter(|chunk| {
                chunk.len() >= self.profile.min_name_len
                    && chunk.len() <= NAME_MAX
                    && !contains_rupee_amount(chunk)
                    && !is_blocklisted(chunk)
            })
            .max_by_key(|chunk| chunk.len())
            .map(str::to_string)
    }

    /// Strategy 3: generic fallback over any element whose text carries a
    /// rupee-marked number and a plausible amount of text. Only the
    /// deepest such elements are taken, so a grid container does not
    /// swallow its cards.
    fn strategy_generic(&self, document: &Html) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        for node in document.root_element().descendants() {
            let Some(el) = ElementRef::wrap(node) else {
                continue;
            };
            if !is_generic_block(el) {
                continue;
            }
            let has_matching_descendant = el
                .descendants()
                .skip(1)
                .filter_map(ElementRef::wrap)
                .any(is_generic_block);
            if has_matching_descendant {
                continue;
            }
            if let Some(candidate) = self.parse_generic_block(el) {
                candidates.push(candidate);
            }
        }

        candidates
    }

    fn parse_generic_block(&self, el: ElementRef) -> Option<Candidate> {
        let origin = self.profile.origin();
        let text: String = el.text().collect();

        let prices = extract_all_prices(&text);
        let tags: Vec<PriceTag> =
            prices.iter().map(|value| PriceTag { value: *value, struck: false }).collect();
        let (price, mrp) = resolve_price_pair(&tags);

        // The name is the closest usable segment before the first price
        let name_zone = match crate::extract::price::first_rupee_index(&text) {
            Some(idx) => &text[..idx],
            None => text.as_str(),
        };
        let name = name_zone
            .split(['\n', '|', '•'])
            .map(str::trim)
            .filter(|segment| {
                segment.len() >= self.profile.min_name_len
                    && segment.len() <= NAME_MAX
                    && !is_blocklisted(segment)
            })
            .last()?
            .to_string();

        let product_url = card_link(el)
            .and_then(|href| resolve_url(&href, &origin))
            .map(|url| apply_path_fixups(&url, self.profile.url_fixups));

        let image_url = card_image(el)
            .and_then(|src| resolve_url(&src, &origin))
            .map(|url| clean_image_url(&url));

        let out_of_stock = has_stock_marker(&text);

        Some(Candidate { name, price, mrp, image_url, product_url, out_of_stock: Some(out_of_stock) })
    }

    /// Backfills missing product URLs from the fetcher's side-channel map,
    /// keyed by case-insensitive product name.
    fn backfill_urls(&self, candidates: &mut [Candidate], url_map: &HashMap<String, String>) {
        let lowered: HashMap<String, &String> =
            url_map.iter().map(|(k, v)| (k.trim().to_lowercase(), v)).collect();

        let mut filled = 0usize;
        for candidate in candidates.iter_mut() {
            if candidate.product_url.is_some() {
                continue;
            }
            if let Some(raw) = lowered.get(&candidate.name.trim().to_lowercase()) {
                candidate.product_url = resolve_url(raw, &self.profile.origin())
                    .map(|url| apply_path_fixups(&url, self.profile.url_fixups));
                filled += 1;
            }
        }
        if filled > 0 {
            debug!("Backfilled {} product URLs from fetcher map", filled);
        }
    }

    /// Best-effort delivery-location detection: page-chrome selectors
    /// first, then the hydration-state walk. Never fails.
    fn extract_location(&self, document: &Html, payloads: &[Value]) -> Option<String> {
        for css in self.profile.location_selectors {
            let Ok(selector) = Selector::parse(css) else {
                continue;
            };
            if let Some(el) = document.select(&selector).next() {
                let text = el.text().collect::<String>().trim().to_string();
                if (2..=120).contains(&text.len()) {
                    trace!("Location from selector '{}': {}", css, text);
                    return Some(text);
                }
            }
        }

        find_location(payloads)
    }
}

/// A strategy's output is usable when at least one candidate recovered a
/// price or a URL; chrome-only candidates do not stop the cascade.
fn usable(candidates: &[Candidate]) -> bool {
    candidates.iter().any(Candidate::has_substance)
}

/// Collects classified price tags from the deepest priced elements of a
/// card, so a wrapper does not shadow its price/MRP children.
fn price_tags(card: ElementRef) -> Vec<PriceTag> {
    card.descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| {
            let text: String = el.text().collect();
            if !contains_rupee_amount(&text) || text.trim().len() > 24 {
                return false;
            }
            // Skip wrappers whose child elements carry the amount
            !el.children()
                .filter_map(ElementRef::wrap)
                .any(|child| contains_rupee_amount(&child.text().collect::<String>()))
        })
        .filter_map(classify_price_node)
        .collect()
}

fn is_generic_block(el: ElementRef) -> bool {
    let text: String = el.text().collect();
    let trimmed = text.trim();
    contains_rupee_amount(trimmed)
        && (GENERIC_TEXT_MIN..=GENERIC_TEXT_MAX).contains(&trimmed.len())
}

/// The card's own link, or its first descendant link.
fn card_link(card: ElementRef) -> Option<String> {
    if card.value().name() == "a" {
        if let Some(href) = card.value().attr("href") {
            return Some(href.to_string());
        }
    }
    static LINK: std::sync::LazyLock<Selector> =
        std::sync::LazyLock::new(|| Selector::parse("a[href]").unwrap());
    card.select(&LINK).next().and_then(|a| a.value().attr("href")).map(str::to_string)
}

/// The card's first image source, preferring lazy-load attributes.
fn card_image(card: ElementRef) -> Option<String> {
    static IMG: std::sync::LazyLock<Selector> =
        std::sync::LazyLock::new(|| Selector::parse("img").unwrap());
    card.select(&IMG).next().and_then(|img| {
        img.value()
            .attr("src")
            .or_else(|| img.value().attr("data-src"))
            .or_else(|| img.value().attr("data-lazy-src"))
            .map(str::to_string)
    })
}

fn has_stock_class(card: ElementRef) -> bool {
    let Some(class) = card.value().attr("class") else {
        return false;
    };
    let class = class.to_lowercase();
    STOCK_CLASS_FRAGMENTS.iter().any(|fragment| class.contains(fragment))
}
