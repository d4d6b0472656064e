// src/analyzers/link_text.rs
// Links need an accessible name.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use super::dom::{self, css, CONTEXT_LIMIT};
use super::{Analyzer, AnalyzerError, Issue};

static ANCHOR: Lazy<Selector> = Lazy::new(|| css("a"));
static IMG: Lazy<Selector> = Lazy::new(|| css("img"));

/// Detects anchors with no text, no labelling attribute and no image.
///
/// Image-only links are left to the `alt_text` analyzer.
pub struct LinkTextAnalyzer;

impl Analyzer for LinkTextAnalyzer {
    fn name(&self) -> &str {
        "link_text"
    }

    fn description(&self) -> &str {
        "Detect links missing accessible text"
    }

    fn analyze(&self, document: &Html) -> Result<Vec<Issue>, AnalyzerError> {
        let issues = document
            .select(&ANCHOR)
            .filter(|a| {
                !(dom::has_text(a)
                    || dom::has_value(a, "aria-label")
                    || dom::has_value(a, "aria-labelledby")
                    || dom::has_value(a, "title"))
            })
            .filter(|a| a.select(&IMG).next().is_none())
            .map(|a| {
                Issue::new(
                    self.name(),
                    "LINK_NO_TEXT",
                    "Link has no accessible name (no text and no labelled content).",
                    dom::snippet(&a, CONTEXT_LIMIT),
                )
            })
            .collect();

        Ok(issues)
    }
}
