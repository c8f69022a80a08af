//! Supported quick-commerce sites and their origins.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The five supported quick-commerce/grocery sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Site {
    #[default]
    Blinkit,
    Zepto,
    Instamart,
    Bigbasket,
    Jiomart,
}

impl Site {
    /// Returns the site's host name.
    pub fn host(&self) -> &'static str {
        match self {
            Site::Blinkit => "blinkit.com",
            Site::Zepto => "www.zeptonow.com",
            Site::Instamart => "www.swiggy.com",
            Site::Bigbasket => "www.bigbasket.com",
            Site::Jiomart => "www.jiomart.com",
        }
    }

    /// Returns the origin (scheme + host) that relative URLs resolve against.
    pub fn origin(&self) -> String {
        format!("https://{}", self.host())
    }

    /// Returns the human-readable site name used in result envelopes.
    pub fn label(&self) -> &'static str {
        match self {
            Site::Blinkit => "Blinkit",
            Site::Zepto => "Zepto",
            Site::Instamart => "Swiggy Instamart",
            Site::Bigbasket => "BigBasket",
            Site::Jiomart => "JioMart",
        }
    }

    /// Returns all supported sites in the order batch runs visit them.
    pub fn all() -> &'static [Site] {
        &[Site::Blinkit, Site::Zepto, Site::Instamart, Site::Bigbasket, Site::Jiomart]
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Site::Blinkit => "blinkit",
            Site::Zepto => "zepto",
            Site::Instamart => "instamart",
            Site::Bigbasket => "bigbasket",
            Site::Jiomart => "jiomart",
        };
        write!(f, "{}", code)
    }
}

impl FromStr for Site {
    type Err = SiteParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "blinkit" | "grofers" => Ok(Site::Blinkit),
            "zepto" | "zeptonow" => Ok(Site::Zepto),
            "instamart" | "swiggy" | "swiggy-instamart" => Ok(Site::Instamart),
            "bigbasket" | "bb" => Ok(Site::Bigbasket),
            "jiomart" | "jio" => Ok(Site::Jiomart),
            _ => Err(SiteParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SiteParseError(String);

impl fmt::Display for SiteParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown site '{}'. Valid sites: blinkit, zepto, instamart, bigbasket, jiomart",
            self.0
        )
    }
}

impl std::error::Error for SiteParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_parsing_all() {
        assert_eq!(Site::from_str("blinkit").unwrap(), Site::Blinkit);
        assert_eq!(Site::from_str("grofers").unwrap(), Site::Blinkit);
        assert_eq!(Site::from_str("zepto").unwrap(), Site::Zepto);
        assert_eq!(Site::from_str("zeptonow").unwrap(), Site::Zepto);
        assert_eq!(Site::from_str("instamart").unwrap(), Site::Instamart);
        assert_eq!(Site::from_str("swiggy").unwrap(), Site::Instamart);
        assert_eq!(Site::from_str("swiggy-instamart").unwrap(), Site::Instamart);
        assert_eq!(Site::from_str("bigbasket").unwrap(), Site::Bigbasket);
        assert_eq!(Site::from_str("bb").unwrap(), Site::Bigbasket);
        assert_eq!(Site::from_str("jiomart").unwrap(), Site::Jiomart);
        assert_eq!(Site::from_str("jio").unwrap(), Site::Jiomart);

        // Case insensitive
        assert_eq!(Site::from_str("BLINKIT").unwrap(), Site::Blinkit);
        assert_eq!(Site::from_str("Zepto").unwrap(), Site::Zepto);

        // Invalid
        assert!(Site::from_str("amazon").is_err());
        assert!(Site::from_str("").is_err());
    }

    #[test]
    fn test_site_hosts() {
        assert_eq!(Site::Blinkit.host(), "blinkit.com");
        assert_eq!(Site::Zepto.host(), "www.zeptonow.com");
        assert_eq!(Site::Instamart.host(), "www.swiggy.com");
        assert_eq!(Site::Bigbasket.host(), "www.bigbasket.com");
        assert_eq!(Site::Jiomart.host(), "www.jiomart.com");
    }

    #[test]
    fn test_site_origin() {
        assert_eq!(Site::Blinkit.origin(), "https://blinkit.com");
        assert_eq!(Site::Zepto.origin(), "https://www.zeptonow.com");
    }

    #[test]
    fn test_site_labels() {
        assert_eq!(Site::Blinkit.label(), "Blinkit");
        assert_eq!(Site::Zepto.label(), "Zepto");
        assert_eq!(Site::Instamart.label(), "Swiggy Instamart");
        assert_eq!(Site::Bigbasket.label(), "BigBasket");
        assert_eq!(Site::Jiomart.label(), "JioMart");
    }

    #[test]
    fn test_site_all() {
        let all = Site::all();
        assert_eq!(all.len(), 5);
        assert!(all.contains(&Site::Blinkit));
        assert!(all.contains(&Site::Jiomart));
    }

    #[test]
    fn test_site_display() {
        assert_eq!(Site::Blinkit.to_string(), "blinkit");
        assert_eq!(Site::Zepto.to_string(), "zepto");
        assert_eq!(Site::Instamart.to_string(), "instamart");
        assert_eq!(Site::Bigbasket.to_string(), "bigbasket");
        assert_eq!(Site::Jiomart.to_string(), "jiomart");
    }

    #[test]
    fn test_site_default() {
        assert_eq!(Site::default(), Site::Blinkit);
    }

    #[test]
    fn test_site_parse_error_display() {
        let err = Site::from_str("xyz").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("xyz"));
        assert!(msg.contains("Valid sites"));
    }

    #[test]
    fn test_site_serde() {
        let site = Site::Blinkit;
        let json = serde_json::to_string(&site).unwrap();
        assert_eq!(json, "\"blinkit\"");

        let parsed: Site = serde_json::from_str("\"jiomart\"").unwrap();
        assert_eq!(parsed, Site::Jiomart);
    }
}
