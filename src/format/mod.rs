//! Output formatting for extraction results (table, JSON, markdown, CSV).

use crate::config::OutputFormat;
use crate::extract::{MultiSiteReport, Product, SiteResult};

/// Formats extraction results for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats one site's extraction result.
    pub fn format_result(&self, result: &SiteResult) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(result).unwrap_or_else(|_| "{}".to_string())
            }
            OutputFormat::Table => self.table_result(result),
            OutputFormat::Markdown => self.markdown_result(result),
            OutputFormat::Csv => self.csv_products(&result.products),
        }
    }

    /// Formats a multi-site batch report.
    pub fn format_report(&self, report: &MultiSiteReport) -> String {
        match self.format {
            OutputFormat::Json => {
                serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
            }
            OutputFormat::Table => self.table_report(report),
            OutputFormat::Markdown => self.markdown_report(report),
            OutputFormat::Csv => {
                // Flatten every successful slot into one CSV with a site column
                let mut lines = vec![format!("website,{}", Self::csv_header())];
                for outcome in &report.results {
                    if let Some(result) = &outcome.result {
                        for product in &result.products {
                            lines.push(format!(
                                "{},{}",
                                Self::csv_escape(&result.website),
                                Self::csv_row(product)
                            ));
                        }
                    }
                }
                lines.join("\n")
            }
        }
    }

    // Table formatting

    fn table_result(&self, result: &SiteResult) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Website:   {}", result.website));
        lines.push(format!("Query:     {}", result.query));
        lines.push(format!(
            "Location:  {}",
            result.location.as_deref().unwrap_or("not detected")
        ));
        lines.push(String::new());

        if result.products.is_empty() {
            lines.push("No products found.".to_string());
            return lines.join("\n");
        }

        lines.push(Self::table_products(&result.products));
        lines.join("\n")
    }

    fn table_products(products: &[Product]) -> String {
        let price_width = 9;
        let mrp_width = 9;
        let disc_width = 6;
        let stock_width = 6;
        let name_width = 48;

        let mut lines = Vec::new();

        lines.push(format!(
            "{:>price_width$}  {:>mrp_width$}  {:>disc_width$}  {:<stock_width$}  {}",
            "Price", "MRP", "Off", "Stock", "Name"
        ));
        lines.push(format!(
            "{:->price_width$}  {:->mrp_width$}  {:->disc_width$}  {:-<stock_width$}  {:-<name_width$}",
            "", "", "", "", ""
        ));

        for product in products {
            let price_str = fmt_amount(product.price);
            let mrp_str = fmt_amount(product.mrp);
            let disc_str = match product.discount {
                Some(d) => format!("{}%", d),
                None => "-".to_string(),
            };
            let stock_str = if product.is_out_of_stock { "OOS" } else { "Yes" };

            let name = if product.name.len() > name_width {
                format!("{}...", &product.name[..name_width - 3])
            } else {
                product.name.clone()
            };

            lines.push(format!(
                "{:>price_width$}  {:>mrp_width$}  {:>disc_width$}  {:<stock_width$}  {}",
                price_str, mrp_str, disc_str, stock_str, name
            ));
        }

        lines.push(String::new());
        lines.push(format!("Total: {} products", products.len()));

        lines.join("\n")
    }

    fn table_report(&self, report: &MultiSiteReport) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Query: {}", report.query));
        lines.push(format!(
            "Sites: {}/{} succeeded, {} products total",
            report.successful_sites, report.total_sites, report.total_products
        ));

        for outcome in &report.results {
            lines.push(String::new());
            lines.push(format!("=== {} ===", outcome.website));
            match (&outcome.result, &outcome.error) {
                (Some(result), _) => lines.push(self.table_result(result)),
                (None, Some(error)) => lines.push(format!("Failed: {}", error)),
                (None, None) => lines.push("Failed".to_string()),
            }
        }

        lines.join("\n")
    }

    // Markdown formatting

    fn markdown_result(&self, result: &SiteResult) -> String {
        let mut lines = Vec::new();

        lines.push(format!("## {} — {}", result.website, result.query));
        lines.push(String::new());
        if let Some(location) = &result.location {
            lines.push(format!("*Location: {}*", location));
            lines.push(String::new());
        }

        lines.push("| Name | Price | MRP | Off | In stock |".to_string());
        lines.push("|------|-------|-----|-----|----------|".to_string());

        for product in &result.products {
            let name = if product.name.len() > 40 {
                format!("{}...", &product.name[..37])
            } else {
                product.name.clone()
            };
            let name_cell = match &product.product_url {
                Some(url) => format!("[{}]({})", name, url),
                None => name,
            };

            lines.push(format!(
                "| {} | {} | {} | {} | {} |",
                name_cell,
                fmt_amount(product.price),
                fmt_amount(product.mrp),
                product.discount.map(|d| format!("{}%", d)).unwrap_or_default(),
                if product.is_out_of_stock { "✗" } else { "✓" },
            ));
        }

        lines.push(String::new());
        lines.push(format!("*{} products found*", result.products.len()));

        lines.join("\n")
    }

    fn markdown_report(&self, report: &MultiSiteReport) -> String {
        let mut lines = Vec::new();
        lines.push(format!("# Results for \"{}\"", report.query));

        for outcome in &report.results {
            lines.push(String::new());
            match (&outcome.result, &outcome.error) {
                (Some(result), _) => lines.push(self.markdown_result(result)),
                (None, error) => {
                    lines.push(format!("## {}", outcome.website));
                    lines.push(String::new());
                    lines.push(format!(
                        "Failed: {}",
                        error.as_deref().unwrap_or("unknown error")
                    ));
                }
            }
        }

        lines.join("\n")
    }

    // CSV formatting

    fn csv_header() -> String {
        "name,price,mrp,discount,discount_amount,out_of_stock,image_url,product_url".to_string()
    }

    fn csv_products(&self, products: &[Product]) -> String {
        let mut lines = vec![Self::csv_header()];
        for product in products {
            lines.push(Self::csv_row(product));
        }
        lines.join("\n")
    }

    fn csv_row(product: &Product) -> String {
        format!(
            "{},{},{},{},{},{},{},{}",
            Self::csv_escape(&product.name),
            product.price.map(|p| p.to_string()).unwrap_or_default(),
            product.mrp.map(|m| m.to_string()).unwrap_or_default(),
            product.discount.map(|d| d.to_string()).unwrap_or_default(),
            product.discount_amount.map(|d| d.to_string()).unwrap_or_default(),
            product.is_out_of_stock,
            product.image_url.as_deref().unwrap_or_default(),
            product.product_url.as_deref().unwrap_or_default(),
        )
    }

    fn csv_escape(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}

fn fmt_amount(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("₹{:.2}", v),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{Site, SiteOutcome};

    fn make_product() -> Product {
        Product {
            name: "Lays Classic 52g".to_string(),
            price: Some(20.0),
            mrp: Some(25.0),
            discount: Some(20.0),
            discount_amount: Some(5.0),
            is_out_of_stock: false,
            image_url: Some("https://cdn.example.com/lays.jpg".to_string()),
            product_url: Some("https://blinkit.com/prn/lays/prid/1".to_string()),
        }
    }

    fn make_result() -> SiteResult {
        SiteResult::new(Site::Blinkit, "chips", Some("560034".to_string()), vec![make_product()])
    }

    #[test]
    fn test_json_result() {
        let formatter = Formatter::new(OutputFormat::Json);
        let output = formatter.format_result(&make_result());
        assert!(output.contains("\"website\": \"Blinkit\""));
        assert!(output.contains("\"totalProducts\": 1"));

        // Round-trips as valid JSON
        let parsed: SiteResult = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.products.len(), 1);
    }

    #[test]
    fn test_table_result() {
        let formatter = Formatter::new(OutputFormat::Table);
        let output = formatter.format_result(&make_result());
        assert!(output.contains("Website:   Blinkit"));
        assert!(output.contains("Location:  560034"));
        assert!(output.contains("Lays Classic 52g"));
        assert!(output.contains("20%"));
        assert!(output.contains("Total: 1 products"));
    }

    #[test]
    fn test_table_empty_result() {
        let formatter = Formatter::new(OutputFormat::Table);
        let result = SiteResult::new(Site::Zepto, "milk", None, Vec::new());
        let output = formatter.format_result(&result);
        assert!(output.contains("No products found."));
        assert!(output.contains("Location:  not detected"));
    }

    #[test]
    fn test_markdown_result() {
        let formatter = Formatter::new(OutputFormat::Markdown);
        let output = formatter.format_result(&make_result());
        assert!(output.contains("## Blinkit — chips"));
        assert!(output.contains("[Lays Classic 52g](https://blinkit.com/prn/lays/prid/1)"));
        assert!(output.contains("*1 products found*"));
    }

    #[test]
    fn test_csv_result() {
        let formatter = Formatter::new(OutputFormat::Csv);
        let output = formatter.format_result(&make_result());
        let mut lines = output.lines();
        assert_eq!(
            lines.next().unwrap(),
            "name,price,mrp,discount,discount_amount,out_of_stock,image_url,product_url"
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("Lays Classic 52g,20,25,20,5,false,"));
    }

    #[test]
    fn test_csv_escaping() {
        let formatter = Formatter::new(OutputFormat::Csv);
        let mut product = make_product();
        product.name = "Lays, \"Classic\" 52g".to_string();
        let result = SiteResult::new(Site::Blinkit, "chips", None, vec![product]);
        let output = formatter.format_result(&result);
        assert!(output.contains("\"Lays, \"\"Classic\"\" 52g\""));
    }

    #[test]
    fn test_report_table() {
        let formatter = Formatter::new(OutputFormat::Table);
        let report = MultiSiteReport::new("chips", vec![
            SiteOutcome::ok(make_result()),
            SiteOutcome::failed(Site::Zepto, "page fetch failed"),
        ]);
        let output = formatter.format_report(&report);
        assert!(output.contains("=== Blinkit ==="));
        assert!(output.contains("=== Zepto ==="));
        assert!(output.contains("Failed: page fetch failed"));
        assert!(output.contains("1/2 succeeded"));
    }

    #[test]
    fn test_report_csv_has_site_column() {
        let formatter = Formatter::new(OutputFormat::Csv);
        let report = MultiSiteReport::new("chips", vec![SiteOutcome::ok(make_result())]);
        let output = formatter.format_report(&report);
        assert!(output.starts_with("website,name,"));
        assert!(output.contains("Blinkit,Lays Classic 52g"));
    }

    #[test]
    fn test_report_json_round_trip() {
        let formatter = Formatter::new(OutputFormat::Json);
        let report = MultiSiteReport::new("chips", vec![SiteOutcome::ok(make_result())]);
        let output = formatter.format_report(&report);
        let parsed: MultiSiteReport = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed.total_products, 1);
    }
}
