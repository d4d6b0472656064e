// src/crawl/sitemap.rs
// Seed URLs from /sitemap.xml: every <loc> element's text.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

static LOC: Lazy<Selector> =
    Lazy::new(|| Selector::parse("loc").expect("static CSS selector must be valid"));

/// Page URLs listed in a sitemap, in document order. Malformed XML yields
/// whatever <loc> elements could still be recovered.
pub fn parse_sitemap(xml: &str) -> Vec<String> {
    let document = Html::parse_document(xml);
    document
        .select(&LOC)
        .map(|loc| loc.text().collect::<String>().trim().to_string())
        .filter(|url| !url.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sitemap() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc> https://example.com/ </loc><lastmod>2024-01-01</lastmod></url>
  <url><loc>https://example.com/about</loc></url>
  <url><loc></loc></url>
</urlset>"#;
        assert_eq!(
            parse_sitemap(xml),
            vec!["https://example.com/", "https://example.com/about"]
        );
    }

    #[test]
    fn test_not_a_sitemap() {
        assert!(parse_sitemap("<html><body>404</body></html>").is_empty());
        assert!(parse_sitemap("").is_empty());
    }
}
