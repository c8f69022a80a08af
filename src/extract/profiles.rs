//! Per-site extraction profiles and shared filter tables.
//!
//! This file is the single place that knows what each site's markup looks
//! like. Production class names on these sites are obfuscated and churn
//! between deployments, so every slot holds a *set* of candidate selectors
//! tried in order. When extraction starts coming back empty for a site,
//! capture a page sample and refresh the entries here.

use crate::extract::sites::Site;
use regex::Regex;
use std::sync::LazyLock;

/// Declarative extraction configuration for one site, consumed by the
/// shared engine. All fields are read-only statics; nothing here is ever
/// mutated per call.
#[derive(Debug)]
pub struct SiteProfile {
    pub site: Site,
    /// Candidate product-card selectors, most reliable first.
    pub card_selectors: &'static [&'static str],
    /// Candidate name selectors tried within a card.
    pub name_selectors: &'static [&'static str],
    /// Hydration-state markers: script ids or global variable names.
    pub state_markers: &'static [&'static str],
    /// Candidate selectors for delivery-location text in page chrome.
    pub location_selectors: &'static [&'static str],
    /// Path rewrites applied to recovered product URLs.
    pub url_fixups: &'static [(&'static str, &'static str)],
    /// Minimum accepted product-name length after trimming.
    pub min_name_len: usize,
    /// Hydration state denominates prices in paise rather than rupees.
    pub paise_state_prices: bool,
}

impl SiteProfile {
    /// Returns the profile for a site.
    pub fn for_site(site: Site) -> &'static SiteProfile {
        match site {
            Site::Blinkit => &BLINKIT,
            Site::Zepto => &ZEPTO,
            Site::Instamart => &INSTAMART,
            Site::Bigbasket => &BIGBASKET,
            Site::Jiomart => &JIOMART,
        }
    }

    /// The site's origin for URL resolution.
    pub fn origin(&self) -> String {
        self.site.origin()
    }
}

pub static BLINKIT: SiteProfile = SiteProfile {
    site: Site::Blinkit,
    card_selectors: &[
        "div[data-test-id='plp-product']",
        "div[class*='Product__UpdatedPlpWrapper']",
        "a[href*='/prid/']",
    ],
    name_selectors: &[
        "div[class*='Product__UpdatedTitle']",
        "div[class*='tw-text-300']",
        ".plp-product__name",
    ],
    state_markers: &["__NEXT_DATA__", "grofers"],
    location_selectors: &[
        "div[data-test-id='delivery-location']",
        "div[class*='LocationBar__Subtitle']",
        "div[class*='LocationBar__Title']",
    ],
    url_fixups: &[],
    min_name_len: 3,
    paise_state_prices: false,
};

pub static ZEPTO: SiteProfile = SiteProfile {
    site: Site::Zepto,
    card_selectors: &[
        "a[data-testid='product-card']",
        "div[data-testid='product-card']",
        "div[class*='ProductCard']",
    ],
    name_selectors: &[
        "[data-testid='product-card-name']",
        "h5[class*='font-subtitle']",
        "p[class*='line-clamp']",
    ],
    state_markers: &["__NEXT_DATA__"],
    location_selectors: &[
        "button[aria-label='Select Location'] span",
        "[data-testid='user-address']",
        "span[class*='font-heading']",
    ],
    url_fixups: &[],
    min_name_len: 3,
    paise_state_prices: true,
};

pub static INSTAMART: SiteProfile = SiteProfile {
    site: Site::Instamart,
    card_selectors: &[
        "div[data-testid='default_container_ux4']",
        "div[data-testid*='item-widget']",
        "div[class*='ItemWidgetContainer']",
    ],
    name_selectors: &[
        "div[class*='novMV']",
        "[data-testid='item-name']",
        "div[class*='ItemName']",
    ],
    state_markers: &["___INITIAL_STATE___"],
    location_selectors: &[
        "[data-testid='address-bar-text']",
        "div[class*='AddressText']",
        "[data-testid='user-location']",
    ],
    url_fixups: &[("/item/", "/instamart/item/")],
    min_name_len: 4,
    paise_state_prices: false,
};

pub static BIGBASKET: SiteProfile = SiteProfile {
    site: Site::Bigbasket,
    card_selectors: &[
        "li[class*='PaginateItems']",
        "div[class*='SKUDeck']",
        "div[qa='product']",
    ],
    name_selectors: &[
        "h3[class*='line-clamp']",
        "div[class*='break-words']",
        "a[qa='product_name']",
    ],
    state_markers: &["__NEXT_DATA__"],
    location_selectors: &[
        "button[qa='location'] span",
        "div[class*='AddressDropdown']",
        "span[class*='pin-code']",
    ],
    url_fixups: &[],
    min_name_len: 5,
    paise_state_prices: false,
};

pub static JIOMART: SiteProfile = SiteProfile {
    site: Site::Jiomart,
    card_selectors: &[
        "li.ais-InfiniteHits-item",
        "div.plp-card-wrapper",
        "div[class*='plp-card']",
    ],
    name_selectors: &[
        "div.plp-card-details-name",
        "div[class*='plp-card-details-name']",
        "div[class*='jm-body']",
    ],
    state_markers: &["__PRELOADED_STATE__", "__NEXT_DATA__"],
    location_selectors: &[
        "#delivery_city_pin",
        "span.delivery-city",
        "div[class*='pin_code_text']",
    ],
    url_fixups: &[],
    min_name_len: 4,
    paise_state_prices: false,
};

/// Generic card selectors used when a site's own selector set comes back
/// empty; shared across sites.
pub const GENERIC_CARD_SELECTORS: &[&str] = &[
    "div[data-testid*='product']",
    "div[class*='product-card']",
    "div[class*='ProductCard']",
    "li[class*='product']",
    "div[class*='plp']",
    "div[class*='product']",
];

/// UI-chrome phrases that can never be product names. Matched against the
/// full trimmed, lowercased name.
pub const NAME_BLOCKLIST: &[&str] = &[
    "add to cart",
    "add",
    "mrp",
    "free delivery",
    "out of stock",
    "sold out",
    "notify me",
    "search",
    "login",
    "sign in",
    "home",
    "view all",
    "see all",
    "explore",
    "buy now",
    "options",
    "bestseller",
    "trending",
    "categories",
    "my cart",
    "offers",
    "wishlist",
    "shop by category",
    "similar products",
];

/// Text markers that flag a listing as out of stock.
pub const STOCK_MARKERS: &[&str] = &["out of stock", "sold out", "unavailable", "notify me", "coming soon"];

/// Class fragments that flag a card as out of stock without marker text.
/// Short tokens like "oos" are avoided: they collide with unrelated class
/// names ("choose").
pub const STOCK_CLASS_FRAGMENTS: &[&str] = &["out-of-stock", "sold-out", "outofstock"];

/// Names consisting only of digits, currency glyphs, and punctuation.
static PURE_SYMBOLS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\d\s₹.,:%+\-/|()]*$").unwrap()
});

/// Delivery-time chrome standing alone as the whole text ("8 MINS",
/// "10 min"). Longer banners are caught by the "delivery in" prefix check.
static DELIVERY_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*\d+\s*min(ute)?s?\s*$").unwrap()
});

/// Bare percent-off labels ("15% OFF").
static PERCENT_OFF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*\d+\s*%\s*off\s*$").unwrap()
});

/// Returns true when a candidate name is UI chrome rather than a product.
pub fn is_blocklisted(name: &str) -> bool {
    let trimmed = name.trim();
    let lowered = trimmed.to_lowercase();

    if NAME_BLOCKLIST.iter().any(|phrase| lowered == *phrase) {
        return true;
    }
    // Promo banners lead with the phrase and trail with terms/amounts
    if lowered.starts_with("free delivery") || lowered.starts_with("delivery in") {
        return true;
    }
    if PURE_SYMBOLS.is_match(trimmed) {
        return true;
    }
    if DELIVERY_TIME.is_match(trimmed) {
        return true;
    }
    if PERCENT_OFF.is_match(trimmed) {
        return true;
    }
    false
}

/// Returns true when card text carries an out-of-stock marker.
pub fn has_stock_marker(text: &str) -> bool {
    let lowered = text.to_lowercase();
    STOCK_MARKERS.iter().any(|marker| lowered.contains(marker))
}
