// src/crawl/links.rs
// =============================================================================
// Link discovery for the crawler.
//
// For every <a href> on a page we:
// 1. Resolve it against the page URL (relative -> absolute)
// 2. Drop anything that is not http/https (mailto:, tel:, javascript:, ...)
// 3. Strip the #fragment, so /docs and /docs#intro are the same page
//
// Same-site filtering is separate (same_site) because the scheduler compares
// against the start URL, not the page the link was found on.
// =============================================================================

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

static ANCHOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("static CSS selector must be valid"));

// Resolves a possibly-relative href against the page it was found on
//
// Returns: the absolute URL without its fragment, or None when the link is
// a same-page anchor, not http(s), or cannot be parsed
//
// Examples:
//   base = "https://example.com/page"
//   href = "/docs"              -> Some("https://example.com/docs")
//   href = "other#part"         -> Some("https://example.com/other")
//   href = "#section"           -> None
//   href = "mailto:a@b.c"       -> None
pub fn resolve_link(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let url = base.join(href).ok()?;
    if !is_crawlable(&url) {
        return None;
    }
    Some(strip_fragment(url))
}

/// http and https are the only schemes the crawler fetches.
pub fn is_crawlable(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

pub fn strip_fragment(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}

/// Same host and same (effective) port.
pub fn same_site(a: &Url, b: &Url) -> bool {
    a.host_str() == b.host_str() && a.port_or_known_default() == b.port_or_known_default()
}

/// Every crawlable link on a parsed page, in document order.
pub fn extract_links(document: &Html, page_url: &Url) -> Vec<Url> {
    document
        .select(&ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| resolve_link(page_url, href))
        .collect()
}

// `robots.txt`, `sitemap.xml` and friends live at the root of the site.
pub fn site_file(start: &Url, name: &str) -> Option<Url> {
    start.join(&format!("/{}", name)).ok()
}

/// Key under which results for `url`'s site are stored: host, plus the
/// port when it is not the scheme default.
pub fn site_key(url: &Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        _ => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_key() {
        assert_eq!(site_key(&Url::parse("https://example.com/a").unwrap()), "example.com");
        assert_eq!(site_key(&Url::parse("https://example.com:443/a").unwrap()), "example.com");
        assert_eq!(site_key(&Url::parse("http://127.0.0.1:8080/").unwrap()), "127.0.0.1:8080");
    }

    fn base() -> Url {
        Url::parse("https://example.com/page").unwrap()
    }

    #[test]
    fn test_resolve_absolute_link() {
        let result = resolve_link(&base(), "https://other.com");
        assert_eq!(result.unwrap().as_str(), "https://other.com/");
    }

    #[test]
    fn test_resolve_relative_link() {
        let result = resolve_link(&base(), "/docs");
        assert_eq!(result.unwrap().as_str(), "https://example.com/docs");
    }

    #[test]
    fn test_fragment_is_stripped() {
        let result = resolve_link(&base(), "/docs#intro");
        assert_eq!(result.unwrap().as_str(), "https://example.com/docs");
    }

    #[test]
    fn test_skip_anchor_and_special_schemes() {
        assert_eq!(resolve_link(&base(), "#section"), None);
        assert_eq!(resolve_link(&base(), "mailto:test@example.com"), None);
        assert_eq!(resolve_link(&base(), "tel:+123"), None);
        assert_eq!(resolve_link(&base(), "javascript:void(0)"), None);
    }

    #[test]
    fn test_same_site_compares_host_and_port() {
        let a = Url::parse("https://example.com/").unwrap();
        assert!(same_site(&a, &Url::parse("https://example.com:443/x").unwrap()));
        assert!(!same_site(&a, &Url::parse("https://example.com:8443/").unwrap()));
        assert!(!same_site(&a, &Url::parse("https://www.example.com/").unwrap()));
    }

    #[test]
    fn test_extract_links() {
        let doc = Html::parse_document(
            r##"<a href="https://rust-lang.org">Rust</a>
               <a href="/docs#top">Docs</a>
               <a href="../about">About</a>
               <a href="#local">Local</a>
               <a href="mailto:x@y.z">Mail</a>"##,
        );
        let links: Vec<String> = extract_links(&doc, &Url::parse("https://example.com/page/").unwrap())
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(
            links,
            vec![
                "https://rust-lang.org/",
                "https://example.com/docs",
                "https://example.com/about"
            ]
        );
    }

    #[test]
    fn test_site_file() {
        let start = Url::parse("http://localhost:8080/deep/page?q=1").unwrap();
        assert_eq!(
            site_file(&start, "robots.txt").unwrap().as_str(),
            "http://localhost:8080/robots.txt"
        );
    }
}
