// src/analyzers/structure.rs
// Page-level structure: title, main landmark, a single h1.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use super::dom::{self, css};
use super::{Analyzer, AnalyzerError, Issue};

static TITLE: Lazy<Selector> = Lazy::new(|| css("title"));
static MAIN: Lazy<Selector> = Lazy::new(|| css(r#"main, [role="main"]"#));
static H1: Lazy<Selector> = Lazy::new(|| css("h1"));

/// Detects missing title/main/h1 and repeated h1 elements.
pub struct DocumentStructureAnalyzer;

impl Analyzer for DocumentStructureAnalyzer {
    fn name(&self) -> &str {
        "document_structure"
    }

    fn description(&self) -> &str {
        "Detect document structure issues (missing landmarks, multiple h1, etc.)"
    }

    fn analyze(&self, document: &Html) -> Result<Vec<Issue>, AnalyzerError> {
        let mut issues = Vec::new();

        let titled = document
            .select(&TITLE)
            .next()
            .is_some_and(|title| dom::has_text(&title));
        if !titled {
            issues.push(Issue::new(
                self.name(),
                "MISSING_TITLE",
                "Page is missing a <title> element. \
                 Titles help users identify pages in tabs and bookmarks.",
                "<head>...</head>",
            ));
        }

        if document.select(&MAIN).next().is_none() {
            issues.push(Issue::new(
                self.name(),
                "MISSING_MAIN",
                "Page is missing a <main> landmark. \
                 Screen reader users use landmarks to navigate.",
                "<body>...</body>",
            ));
        }

        let h1s: Vec<_> = document.select(&H1).collect();
        match h1s.len() {
            0 => issues.push(Issue::new(
                self.name(),
                "MISSING_H1",
                "Page is missing an <h1> element. \
                 The h1 should describe the main content of the page.",
                "<body>...</body>",
            )),
            1 => {}
            n => issues.push(Issue::new(
                self.name(),
                "MULTIPLE_H1",
                format!(
                    "Page has {} <h1> elements. Best practice is to have one h1 per page.",
                    n
                ),
                h1s.iter()
                    .take(3)
                    .map(|h| dom::snippet(h, 50))
                    .collect::<Vec<_>>()
                    .join(", "),
            )),
        }

        Ok(issues)
    }
}
