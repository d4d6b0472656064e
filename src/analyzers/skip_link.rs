// src/analyzers/skip_link.rs
// =============================================================================
// Pages with navigation before the main content should offer a "skip to
// content" link, and that link must point at an element that exists.
//
// Detection looks at the first 10 links in <body>. A link counts as a skip
// link when its text or aria-label matches one of the usual phrasings, or
// when its href starts with #main / #content.
// =============================================================================

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use super::dom::{self, css, CONTEXT_LIMIT};
use super::{Analyzer, AnalyzerError, Issue};

static BODY: Lazy<Selector> = Lazy::new(|| css("body"));
static LINK: Lazy<Selector> = Lazy::new(|| css("a[href]"));
static NAV: Lazy<Selector> = Lazy::new(|| css(r#"nav, [role="navigation"]"#));
static MAIN: Lazy<Selector> = Lazy::new(|| css(r#"main, [role="main"]"#));
static SKIP_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)skip.*main|skip.*content|skip.*nav|jump.*content|jump.*main")
        .expect("static regex")
});

const LINKS_INSPECTED: usize = 10;

/// Detects missing or broken skip navigation links.
pub struct SkipLinkAnalyzer;

impl Analyzer for SkipLinkAnalyzer {
    fn name(&self) -> &str {
        "skip_link"
    }

    fn description(&self) -> &str {
        "Detect missing or broken skip navigation links"
    }

    fn analyze(&self, document: &Html) -> Result<Vec<Issue>, AnalyzerError> {
        let mut issues = Vec::new();
        let Some(body) = document.select(&BODY).next() else {
            return Ok(issues);
        };

        let skip_link = body.select(&LINK).take(LINKS_INSPECTED).find(|link| {
            let href = link.value().attr("href").unwrap_or("");
            let label = format!(
                "{} {}",
                dom::stripped_text(link),
                link.value().attr("aria-label").unwrap_or("")
            );
            SKIP_TEXT.is_match(&label) || href.starts_with("#main") || href.starts_with("#content")
        });

        match skip_link {
            Some(link) => {
                let href = link.value().attr("href").unwrap_or("");
                if let Some(target) = href.strip_prefix('#') {
                    if !dom::id_exists(document, target) {
                        issues.push(Issue::new(
                            self.name(),
                            "BROKEN_SKIP_LINK",
                            format!("Skip link target '#{}' does not exist.", target),
                            dom::snippet(&link, CONTEXT_LIMIT),
                        ));
                    }
                }
            }
            None => {
                let has_nav = body.select(&NAV).next().is_some();
                let has_main = body.select(&MAIN).next().is_some();
                if has_nav && has_main {
                    issues.push(Issue::new(
                        self.name(),
                        "NO_SKIP_LINK",
                        "Page has navigation but no skip link. \
                         Keyboard users must tab through all navigation.",
                        "<body><nav>...</nav></body>",
                    ));
                }
            }
        }

        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(html: &str) -> Vec<String> {
        SkipLinkAnalyzer
            .analyze_html(html)
            .unwrap()
            .into_iter()
            .map(|i| i.code)
            .collect()
    }

    #[test]
    fn test_nav_and_main_without_skip_link() {
        let html = r#"<body><nav><a href="/a">A</a></nav><main>x</main></body>"#;
        assert_eq!(codes(html), vec!["NO_SKIP_LINK"]);
    }

    #[test]
    fn test_working_skip_link() {
        let html = r##"<body><a href="#main">Skip to main content</a>
            <nav><a href="/a">A</a></nav><main id="main">x</main></body>"##;
        assert!(codes(html).is_empty());
    }

    #[test]
    fn test_broken_skip_link() {
        let html = r##"<body><a href="#content">Jump to content</a>
            <nav></nav><main>x</main></body>"##;
        assert_eq!(codes(html), vec!["BROKEN_SKIP_LINK"]);
    }

    #[test]
    fn test_skip_link_detected_by_aria_label() {
        let html = r##"<body><a href="#start" aria-label="Skip navigation">&darr;</a>
            <nav></nav><main><div id="start"></div></main></body>"##;
        assert!(codes(html).is_empty());
    }

    #[test]
    fn test_no_navigation_means_no_requirement() {
        assert!(codes("<body><main>x</main></body>").is_empty());
    }
}
