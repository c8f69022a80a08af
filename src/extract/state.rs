//! Embedded hydration-state extraction.
//!
//! Client-rendered listing pages inline their application state as JSON —
//! a `__NEXT_DATA__` script tag, a `window.<NAME> = {...}` assignment, or a
//! plain `application/json` script body. That payload is richer and more
//! stable than the rendered DOM, so it is the first strategy the engine
//! tries. The object graph is untyped and site-shaped, so recovery is a
//! depth-bounded walk collecting nodes that look like products.

use crate::extract::models::Candidate;
use crate::extract::price::round2;
use crate::extract::profiles::SiteProfile;
use crate::extract::url::{apply_path_fixups, clean_image_url, resolve_url};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Recursion bound for walks over hydration payloads. Deep enough for real
/// framework state, shallow enough to bail out of pathological nesting.
const MAX_WALK_DEPTH: usize = 12;

/// `<script id="..." ...>body</script>` — matched against state markers.
static SCRIPT_BY_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]*\bid\s*=\s*["']([^"']+)["'][^>]*>(.*?)</script>"#).unwrap()
});

/// Any inline JSON script body (`application/json`, `application/ld+json`).
static JSON_SCRIPTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]*type\s*=\s*["']application/(?:ld\+)?json["'][^>]*>(.*?)</script>"#)
        .unwrap()
});

/// Identifying keys: one of these must be present for an object to count
/// as a product node.
const ID_KEYS: &[&str] = &[
    "id", "product_id", "productId", "item_id", "itemId", "sku", "objectID", "variant_id",
    "variantId", "prid",
];

const NAME_KEYS: &[&str] = &[
    "name", "title", "display_name", "displayName", "product_name", "productName", "item_name",
    "itemName",
];

const PRICE_KEYS: &[&str] = &[
    "price", "selling_price", "sellingPrice", "offer_price", "offerPrice", "sale_price",
    "salePrice", "discounted_price", "discountedPrice", "final_price", "finalPrice", "sp",
];

const MRP_KEYS: &[&str] = &[
    "mrp", "max_retail_price", "maxRetailPrice", "original_price", "originalPrice", "list_price",
    "listPrice", "strike_price", "strikePrice", "compare_price", "comparePrice",
];

const IMAGE_KEYS: &[&str] =
    &["image", "image_url", "imageUrl", "img", "thumbnail", "product_image", "images"];

const URL_KEYS: &[&str] = &[
    "url", "product_url", "productUrl", "deeplink", "web_url", "webUrl", "link", "share_url",
    "slug",
];

/// Keys asserting availability; `false` means out of stock.
const IN_STOCK_KEYS: &[&str] = &["in_stock", "inStock", "available", "is_available", "isAvailable"];

/// Keys asserting unavailability; `true` means out of stock.
const OUT_OF_STOCK_KEYS: &[&str] =
    &["out_of_stock", "outOfStock", "sold_out", "soldOut", "unavailable"];

/// Key fragments that may hold the delivery location in page state.
const LOCATION_KEY_FRAGMENTS: &[&str] =
    &["pincode", "pin_code", "postal", "city", "area", "locality", "location"];

/// Extracts every parsable hydration payload matching the profile's state
/// markers, falling back to anonymous inline JSON scripts when no marker
/// hits. Unparsable payloads are skipped silently; a page with no state is
/// a normal case, not an error.
pub fn state_payloads(html: &str, markers: &[&str]) -> Vec<Value> {
    let mut payloads = Vec::new();

    for caps in SCRIPT_BY_ID.captures_iter(html) {
        let id = caps.get(1).map_or("", |m| m.as_str());
        if !markers.contains(&id) {
            continue;
        }
        if let Some(body) = caps.get(2) {
            if let Ok(value) = serde_json::from_str::<Value>(body.as_str().trim()) {
                payloads.push(value);
            }
        }
    }

    for marker in markers {
        for value in assignment_payloads(html, marker) {
            payloads.push(value);
        }
    }

    if payloads.is_empty() {
        for caps in JSON_SCRIPTS.captures_iter(html) {
            if let Some(body) = caps.get(1) {
                if let Ok(value) = serde_json::from_str::<Value>(body.as_str().trim()) {
                    payloads.push(value);
                }
            }
        }
    }

    payloads
}

/// Finds `MARKER = {...}` assignments and parses the balanced JSON that
/// follows. Handles `window.MARKER`, `var MARKER`, and bare assignments.
fn assignment_payloads(html: &str, marker: &str) -> Vec<Value> {
    let mut out = Vec::new();
    let mut search_from = 0;

    while let Some(rel) = html[search_from..].find(marker) {
        let marker_end = search_from + rel + marker.len();
        search_from = marker_end;

        let rest = &html[marker_end..];
        let after = rest.trim_start();
        let Some(after_eq) = after.strip_prefix('=') else {
            continue;
        };
        let json_start = after_eq.trim_start();
        if !json_start.starts_with('{') && !json_start.starts_with('[') {
            continue;
        }
        if let Some(slice) = balanced_json_slice(json_start) {
            if let Ok(value) = serde_json::from_str::<Value>(slice) {
                out.push(value);
            }
        }
    }

    out
}

/// Returns the balanced `{...}`/`[...]` prefix of `s`, respecting string
/// literals and escapes. `None` when the payload is truncated.
fn balanced_json_slice(s: &str) -> Option<&str> {
    let bytes = s.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' | b'[' => depth += 1,
            b'}' | b']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Collects product candidates from hydration payloads via a depth-bounded
/// recursive walk.
pub fn collect_product_candidates(payloads: &[Value], profile: &SiteProfile) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for payload in payloads {
        walk_products(payload, profile, 0, &mut candidates);
    }
    candidates
}

fn walk_products(value: &Value, profile: &SiteProfile, depth: usize, out: &mut Vec<Candidate>) {
    if depth > MAX_WALK_DEPTH {
        return;
    }
    match value {
        Value::Object(map) => {
            if looks_like_product(value) {
                if let Some(candidate) = candidate_from_object(value, profile) {
                    out.push(candidate);
                    // A matched node's children are its own fields, not
                    // further listings
                    return;
                }
            }
            for child in map.values() {
                walk_products(child, profile, depth + 1, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                walk_products(item, profile, depth + 1, out);
            }
        }
        _ => {}
    }
}

/// An object looks like a product when it carries an identifying field, a
/// non-empty name field, and a price-ish field.
pub fn looks_like_product(value: &Value) -> bool {
    let Value::Object(map) = value else {
        return false;
    };

    let has_id = ID_KEYS.iter().any(|k| map.contains_key(*k));
    let has_name = NAME_KEYS
        .iter()
        .any(|k| map.get(*k).and_then(Value::as_str).is_some_and(|s| !s.trim().is_empty()));
    let has_price =
        PRICE_KEYS.iter().chain(MRP_KEYS).any(|k| map.get(*k).is_some_and(|v| numeric(v).is_some()));

    has_id && has_name && has_price
}

fn candidate_from_object(value: &Value, profile: &SiteProfile) -> Option<Candidate> {
    let map = value.as_object()?;
    let origin = profile.origin();

    let name = NAME_KEYS
        .iter()
        .find_map(|k| map.get(*k).and_then(Value::as_str))
        .map(|s| s.trim().to_string())?;

    let price = first_amount(map, PRICE_KEYS, profile.paise_state_prices);
    let mrp = first_amount(map, MRP_KEYS, profile.paise_state_prices);

    let image_url = IMAGE_KEYS
        .iter()
        .find_map(|k| map.get(*k).and_then(string_or_first))
        .and_then(|raw| resolve_url(&raw, &origin))
        .map(|url| clean_image_url(&url));

    let product_url = URL_KEYS
        .iter()
        .find_map(|k| map.get(*k).and_then(Value::as_str))
        .and_then(|raw| resolve_url(raw, &origin))
        .map(|url| apply_path_fixups(&url, profile.url_fixups));

    let out_of_stock = stock_flag(map);

    Some(Candidate { name, price, mrp, image_url, product_url, out_of_stock })
}

fn first_amount(map: &serde_json::Map<String, Value>, keys: &[&str], paise: bool) -> Option<f64> {
    keys.iter().find_map(|k| {
        let value = map.get(*k)?;
        let (amount, bare_number) = numeric_with_kind(value)?;
        // Paise denominations only apply to bare JSON numbers; a string
        // carrying a currency glyph is already in rupees
        let amount = if paise && bare_number { amount / 100.0 } else { amount };
        (amount > 0.0).then(|| round2(amount))
    })
}

fn numeric(value: &Value) -> Option<f64> {
    numeric_with_kind(value).map(|(v, _)| v)
}

/// Parses a JSON number or numeric-ish string; the flag reports whether the
/// source was a bare number.
fn numeric_with_kind(value: &Value) -> Option<(f64, bool)> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).map(|v| (v, true)),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Some(marked) = crate::extract::price::extract_price(trimmed) {
                return Some((marked, false));
            }
            trimmed.replace(',', "").parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| (v, true))
        }
        _ => None,
    }
}

fn string_or_first(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn stock_flag(map: &serde_json::Map<String, Value>) -> Option<bool> {
    for key in OUT_OF_STOCK_KEYS {
        if let Some(flag) = map.get(*key).and_then(Value::as_bool) {
            return Some(flag);
        }
    }
    for key in IN_STOCK_KEYS {
        if let Some(flag) = map.get(*key).and_then(Value::as_bool) {
            return Some(!flag);
        }
    }
    None
}

/// Searches hydration payloads for a delivery-location string: any key
/// containing a location fragment with a plausible string (or a 6-digit
/// pincode number) wins, depth-first.
pub fn find_location(payloads: &[Value]) -> Option<String> {
    payloads.iter().find_map(|payload| walk_location(payload, 0))
}

fn walk_location(value: &Value, depth: usize) -> Option<String> {
    if depth > MAX_WALK_DEPTH {
        return None;
    }
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let lowered = key.to_lowercase();
                if LOCATION_KEY_FRAGMENTS.iter().any(|frag| lowered.contains(frag)) {
                    if let Some(text) = location_text(child) {
                        return Some(text);
                    }
                }
            }
            map.values().find_map(|child| walk_location(child, depth + 1))
        }
        Value::Array(items) => items.iter().find_map(|item| walk_location(item, depth + 1)),
        _ => None,
    }
}

fn location_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            let plausible = (2..=80).contains(&trimmed.len())
                && trimmed.chars().any(|c| c.is_alphanumeric());
            plausible.then(|| trimmed.to_string())
        }
        Value::Number(n) => {
            let digits = n.to_string();
            (digits.len() == 6).then_some(digits)
        }
        _ => None,
    }
}
