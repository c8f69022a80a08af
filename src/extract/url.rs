//! URL normalization for product links and images.

use url::Url;

/// Query parameters preserved when cleaning image URLs. Everything else is
/// tracking/session noise.
const KEPT_IMAGE_PARAMS: &[&str] = &["w", "h", "q", "width", "height", "quality", "fit"];

/// Normalizes a possibly-relative URL against a site origin.
///
/// Protocol-relative URLs gain `https:`, root-relative paths gain the
/// origin, bare relative paths gain `origin + '/'`, and absolute URLs pass
/// through unchanged. Anchors and `javascript:` pseudo-URLs return `None`.
pub fn resolve_url(raw: &str, origin: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('#') {
        return None;
    }
    if raw.to_lowercase().starts_with("javascript:") {
        return None;
    }

    let origin = origin.trim_end_matches('/');

    if raw.starts_with("http://") || raw.starts_with("https://") {
        return Some(raw.to_string());
    }
    if let Some(rest) = raw.strip_prefix("//") {
        return Some(format!("https://{}", rest));
    }
    if raw.starts_with('/') {
        return Some(format!("{}{}", origin, raw));
    }
    Some(format!("{}/{}", origin, raw))
}

/// Strips tracking query parameters from an image URL, keeping only the
/// width/height/quality/fit family. Unparsable input passes through as-is.
pub fn clean_image_url(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw) else {
        return raw.to_string();
    };

    if url.query().is_none() {
        return raw.to_string();
    }

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| KEPT_IMAGE_PARAMS.contains(&k.to_lowercase().as_str()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept.iter().map(|(k, v)| (k, v)));
    }

    url.to_string()
}

/// Applies site-specific path rewrites, e.g. `/item/` becomes
/// `/instamart/item/` on Swiggy. A fixup is skipped when its replacement is
/// already present, so re-normalizing is harmless.
pub fn apply_path_fixups(url: &str, fixups: &[(&str, &str)]) -> String {
    let mut out = url.to_string();
    for (from, to) in fixups {
        if out.contains(to) {
            continue;
        }
        if out.contains(from) {
            out = out.replacen(from, to, 1);
        }
    }
    out
}

/// Returns true when the value parses as an absolute http(s) URL.
pub fn is_absolute_http(raw: &str) -> bool {
    Url::parse(raw).map(|u| matches!(u.scheme(), "http" | "https")).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://blinkit.com";

    #[test]
    fn test_resolve_absolute_passthrough() {
        assert_eq!(
            resolve_url("https://blinkit.com/prn/x/prid/1", ORIGIN).as_deref(),
            Some("https://blinkit.com/prn/x/prid/1")
        );
        assert_eq!(
            resolve_url("http://other.example/p", ORIGIN).as_deref(),
            Some("http://other.example/p")
        );
    }

    #[test]
    fn test_resolve_protocol_relative() {
        assert_eq!(
            resolve_url("//cdn.example.com/img.jpg", ORIGIN).as_deref(),
            Some("https://cdn.example.com/img.jpg")
        );
    }

    #[test]
    fn test_resolve_root_relative() {
        assert_eq!(
            resolve_url("/prn/amul/prid/123", ORIGIN).as_deref(),
            Some("https://blinkit.com/prn/amul/prid/123")
        );
        // Trailing slash on the origin does not double up
        assert_eq!(
            resolve_url("/p/1", "https://blinkit.com/").as_deref(),
            Some("https://blinkit.com/p/1")
        );
    }

    #[test]
    fn test_resolve_bare_relative() {
        assert_eq!(
            resolve_url("prn/amul/prid/123", ORIGIN).as_deref(),
            Some("https://blinkit.com/prn/amul/prid/123")
        );
    }

    #[test]
    fn test_resolve_rejects_anchors_and_javascript() {
        assert_eq!(resolve_url("#top", ORIGIN), None);
        assert_eq!(resolve_url("#", ORIGIN), None);
        assert_eq!(resolve_url("javascript:void(0)", ORIGIN), None);
        assert_eq!(resolve_url("JavaScript:doThing()", ORIGIN), None);
        assert_eq!(resolve_url("", ORIGIN), None);
        assert_eq!(resolve_url("   ", ORIGIN), None);
    }

    #[test]
    fn test_clean_image_url_strips_tracking() {
        let cleaned = clean_image_url(
            "https://cdn.example.com/img.jpg?utm_source=app&w=480&sessionid=abc&q=75",
        );
        let url = Url::parse(&cleaned).unwrap();
        let params: Vec<(String, String)> =
            url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect();
        assert_eq!(params, vec![("w".to_string(), "480".to_string()), ("q".to_string(), "75".to_string())]);
    }

    #[test]
    fn test_clean_image_url_all_tracking() {
        let cleaned = clean_image_url("https://cdn.example.com/img.jpg?utm_source=app&ref=home");
        assert_eq!(cleaned, "https://cdn.example.com/img.jpg");
    }

    #[test]
    fn test_clean_image_url_no_query() {
        assert_eq!(
            clean_image_url("https://cdn.example.com/img.jpg"),
            "https://cdn.example.com/img.jpg"
        );
    }

    #[test]
    fn test_clean_image_url_keeps_size_params() {
        let cleaned =
            clean_image_url("https://cdn.example.com/i.png?width=300&height=300&fit=crop");
        assert!(cleaned.contains("width=300"));
        assert!(cleaned.contains("height=300"));
        assert!(cleaned.contains("fit=crop"));
    }

    #[test]
    fn test_clean_image_url_unparsable_passthrough() {
        assert_eq!(clean_image_url("not a url"), "not a url");
    }

    #[test]
    fn test_apply_path_fixups() {
        let fixups = [("/item/", "/instamart/item/")];
        assert_eq!(
            apply_path_fixups("https://www.swiggy.com/item/ABC123", &fixups),
            "https://www.swiggy.com/instamart/item/ABC123"
        );
    }

    #[test]
    fn test_apply_path_fixups_idempotent() {
        let fixups = [("/item/", "/instamart/item/")];
        let once = apply_path_fixups("https://www.swiggy.com/item/ABC123", &fixups);
        let twice = apply_path_fixups(&once, &fixups);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_apply_path_fixups_no_match() {
        let fixups = [("/item/", "/instamart/item/")];
        assert_eq!(
            apply_path_fixups("https://www.swiggy.com/restaurants", &fixups),
            "https://www.swiggy.com/restaurants"
        );
    }

    #[test]
    fn test_is_absolute_http() {
        assert!(is_absolute_http("https://blinkit.com/p/1"));
        assert!(is_absolute_http("http://blinkit.com/p/1"));
        assert!(!is_absolute_http("/p/1"));
        assert!(!is_absolute_http("javascript:void(0)"));
        assert!(!is_absolute_http("ftp://host/file"));
    }
}
