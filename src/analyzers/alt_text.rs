// src/analyzers/alt_text.rs
// Images (and image-only links) must carry a descriptive alt attribute.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use super::dom::{self, css, CONTEXT_LIMIT};
use super::{Analyzer, AnalyzerError, Issue};

static IMG: Lazy<Selector> = Lazy::new(|| css("img"));
static ANCHOR: Lazy<Selector> = Lazy::new(|| css("a"));

/// Detects images without alt text and linked images without alt text.
pub struct AltTextAnalyzer;

impl Analyzer for AltTextAnalyzer {
    fn name(&self) -> &str {
        "alt_text"
    }

    fn description(&self) -> &str {
        "Detect missing alt text on images and linked images"
    }

    fn analyze(&self, document: &Html) -> Result<Vec<Issue>, AnalyzerError> {
        let mut issues = Vec::new();

        for img in document.select(&IMG) {
            if !dom::has_value(&img, "alt") {
                issues.push(Issue::new(
                    self.name(),
                    "IMG_MISSING_ALT",
                    "Image element missing descriptive alt text.",
                    dom::snippet(&img, CONTEXT_LIMIT),
                ));
            }
        }

        // A link whose only content is an image takes its name from the
        // first image's alt text
        for link in document.select(&ANCHOR) {
            if dom::has_text(&link) {
                continue;
            }
            if let Some(first_img) = link.select(&IMG).next() {
                if !dom::has_value(&first_img, "alt") {
                    issues.push(Issue::new(
                        self.name(),
                        "LINK_IMG_MISSING_ALT",
                        "Link contains image(s) without alt text.",
                        dom::snippet(&link, CONTEXT_LIMIT),
                    ));
                }
            }
        }

        Ok(issues)
    }
}
