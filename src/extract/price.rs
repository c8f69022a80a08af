//! Rupee price parsing and MRP-vs-selling-price classification.

use regex::Regex;
use scraper::ElementRef;
use std::sync::LazyLock;

/// Matches a rupee-marked amount: glyph or `Rs.`/`INR` prefix, digits with
/// optional thousands separators and decimals.
static RUPEE_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:₹|\bRs\.?|\bINR\b)\s*([0-9][0-9,]*(?:\.[0-9]+)?)").unwrap()
});

/// Rounds to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Extracts the first rupee-marked amount from free text.
///
/// Returns `None` when no currency-marked number is present, or when the
/// parsed value is non-finite or non-positive (treated as extraction noise).
pub fn extract_price(text: &str) -> Option<f64> {
    let caps = RUPEE_AMOUNT.captures(text)?;
    parse_amount(caps.get(1)?.as_str())
}

/// Returns true when the text contains a rupee-marked amount at all.
pub fn contains_rupee_amount(text: &str) -> bool {
    RUPEE_AMOUNT.is_match(text)
}

/// Byte offset of the first rupee-marked amount in the text.
pub fn first_rupee_index(text: &str) -> Option<usize> {
    RUPEE_AMOUNT.find(text).map(|m| m.start())
}

/// Extracts every rupee-marked amount from free text, in order.
pub fn extract_all_prices(text: &str) -> Vec<f64> {
    RUPEE_AMOUNT
        .captures_iter(text)
        .filter_map(|caps| parse_amount(caps.get(1)?.as_str()))
        .collect()
}

fn parse_amount(digits: &str) -> Option<f64> {
    let cleaned = digits.replace(',', "");
    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() || value <= 0.0 {
        return None;
    }
    Some(round2(value))
}

/// A price value with its strike classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceTag {
    pub value: f64,
    pub struck: bool,
}

/// Classifies a node containing a rupee-marked number as struck-through
/// (MRP) or regular (selling price).
///
/// Strike signals, checked on the node and its immediate parent: explicit
/// `del`/`s`/`strike` tags, inline `text-decoration: line-through` styling,
/// or a class fragment containing `strike`, `mrp`, or `line-through`. This
/// classification is the primary MRP signal; positional order is only a
/// fallback when no strike signal exists anywhere in the card.
pub fn classify_price_node(element: ElementRef) -> Option<PriceTag> {
    let text = element.text().collect::<String>();
    let value = extract_price(&text)?;

    let struck = has_strike_signal(element)
        || element.parent().and_then(ElementRef::wrap).is_some_and(has_strike_signal);

    Some(PriceTag { value, struck })
}

fn has_strike_signal(element: ElementRef) -> bool {
    let tag = element.value().name();
    if matches!(tag, "del" | "s" | "strike") {
        return true;
    }

    if let Some(style) = element.value().attr("style") {
        if style.to_lowercase().replace(' ', "").contains("line-through") {
            return true;
        }
    }

    if let Some(class) = element.value().attr("class") {
        let class = class.to_lowercase();
        if class.contains("strike") || class.contains("mrp") || class.contains("line-through") {
            return true;
        }
    }

    false
}

/// Resolves a set of classified price values into `(price, mrp)`.
///
/// Struck values feed the MRP, non-struck values the selling price. With no
/// strike signal at all the first two distinct values are assigned
/// positionally (first treated as the MRP candidate). Either way the
/// `mrp >= price` invariant is enforced by swapping a reversed pair.
pub fn resolve_price_pair(tags: &[PriceTag]) -> (Option<f64>, Option<f64>) {
    let mut price = None;
    let mut mrp = None;

    if tags.iter().any(|t| t.struck) {
        price = tags.iter().find(|t| !t.struck).map(|t| t.value);
        mrp = tags.iter().find(|t| t.struck).map(|t| t.value);
    } else {
        match tags {
            [] => {}
            [only] => price = Some(only.value),
            [first, rest @ ..] => {
                // Positional fallback of unknown reliability; the swap below
                // keeps the output invariant regardless of page order.
                mrp = Some(first.value);
                price = rest
                    .iter()
                    .map(|t| t.value)
                    .find(|v| (*v - first.value).abs() > f64::EPSILON)
                    .or(Some(first.value));
            }
        }
    }

    if let (Some(p), Some(m)) = (price, mrp) {
        if m < p {
            return (Some(m), Some(p));
        }
    }

    (price, mrp)
}
