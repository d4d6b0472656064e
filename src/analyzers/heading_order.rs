// src/analyzers/heading_order.rs
// Headings should not skip levels (h1 -> h3).

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use super::dom::css;
use super::{Analyzer, AnalyzerError, Issue};

static HEADINGS: Lazy<Selector> = Lazy::new(|| css("h1, h2, h3, h4, h5, h6"));

/// Reports the first jump of more than one heading level.
pub struct HeadingOrderAnalyzer;

impl Analyzer for HeadingOrderAnalyzer {
    fn name(&self) -> &str {
        "heading_order"
    }

    fn description(&self) -> &str {
        "Detect heading level jumps that confuse screen readers"
    }

    fn analyze(&self, document: &Html) -> Result<Vec<Issue>, AnalyzerError> {
        // scraper yields matches in document order
        let levels: Vec<u8> = document
            .select(&HEADINGS)
            .filter_map(|h| h.value().name()[1..].parse().ok())
            .collect();

        let jump = levels
            .windows(2)
            .find(|pair| pair[1] > pair[0] + 1)
            .map(|pair| (pair[0], pair[1]));

        Ok(match jump {
            Some((prev, next)) => vec![Issue::new(
                self.name(),
                "HEADING_ORDER",
                format!(
                    "Heading level jumps from h{} to h{} (may confuse screen readers).",
                    prev, next
                ),
                format!("sequence: {:?}", &levels[..levels.len().min(20)]),
            )],
            None => Vec::new(),
        })
    }
}
