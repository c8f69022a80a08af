//! Single-page extraction command.

use crate::config::Config;
use crate::extract::{Extractor, Site};
use crate::format::Formatter;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

/// Extracts products from one captured page.
pub struct ExtractCommand {
    config: Config,
}

impl ExtractCommand {
    /// Creates a new extract command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Runs extraction over a captured HTML file and returns formatted
    /// output.
    pub fn execute(&self, site: Site, path: &Path, query: &str) -> Result<String> {
        info!("Extracting {} page from {}", site, path.display());

        let html = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read page file: {}", path.display()))?;

        let mut result = Extractor::new(site)
            .extract(&html, query)
            .with_context(|| format!("Extraction failed for {}", site))?;

        if let Some(name) = path.file_name() {
            result = result.with_filename(name.to_string_lossy().into_owned());
        }
        result.truncate(self.config.max_products);

        info!("{}: {} products", site, result.total_products);

        let formatter = Formatter::new(self.config.format);
        Ok(formatter.format_result(&result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn page_file(body: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "<html><body>{}</body></html>", body).unwrap();
        file
    }

    fn config(format: OutputFormat) -> Config {
        Config { format, ..Config::default() }
    }

    #[test]
    fn test_execute_json() {
        let file = page_file(
            r#"<div class="product"><h3>Lays Classic 52g</h3><span>₹20</span><del>₹25</del></div>"#,
        );

        let cmd = ExtractCommand::new(config(OutputFormat::Json));
        let output = cmd.execute(Site::Blinkit, file.path(), "chips").unwrap();

        assert!(output.contains("\"name\": \"Lays Classic 52g\""));
        assert!(output.contains("\"price\": 20.0"));
        assert!(output.contains("\"mrp\": 25.0"));
        assert!(output.contains("\"filename\""));
    }

    #[test]
    fn test_execute_missing_file() {
        let cmd = ExtractCommand::new(config(OutputFormat::Table));
        let result = cmd.execute(Site::Blinkit, Path::new("/nonexistent/page.html"), "chips");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Failed to read page file"));
    }

    #[test]
    fn test_execute_respects_max_products() {
        let file = page_file(
            r#"<div class="product"><h3>Lays Classic 52g</h3><span>₹20</span></div>
               <div class="product"><h3>Kurkure Masala Munch</h3><span>₹10</span></div>"#,
        );

        let mut config = config(OutputFormat::Json);
        config.max_products = 1;
        let cmd = ExtractCommand::new(config);
        let output = cmd.execute(Site::Blinkit, file.path(), "chips").unwrap();

        assert!(output.contains("\"totalProducts\": 1"));
        assert!(!output.contains("Kurkure"));
    }
}
