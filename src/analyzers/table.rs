// src/analyzers/table.rs
// Data tables need headers, a caption and scoped header cells.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use super::dom::{self, css, CONTEXT_LIMIT};
use super::{Analyzer, AnalyzerError, Issue};

static TABLE: Lazy<Selector> = Lazy::new(|| css("table"));
static ROW: Lazy<Selector> = Lazy::new(|| css("tr"));
static HEADER_CELL: Lazy<Selector> = Lazy::new(|| css("th"));
static CAPTION: Lazy<Selector> = Lazy::new(|| css("caption"));

/// Checks data tables; layout tables (role presentation/none) and
/// single-row tables are ignored.
pub struct TableAnalyzer;

impl Analyzer for TableAnalyzer {
    fn name(&self) -> &str {
        "table"
    }

    fn description(&self) -> &str {
        "Detect table accessibility issues (missing headers, captions)"
    }

    fn analyze(&self, document: &Html) -> Result<Vec<Issue>, AnalyzerError> {
        let mut issues = Vec::new();

        for table in document.select(&TABLE) {
            let role = dom::attr_lower(&table, "role").unwrap_or_default();
            if role == "presentation" || role == "none" {
                continue;
            }
            if table.select(&ROW).count() <= 1 {
                continue;
            }

            let context = dom::snippet(&table, CONTEXT_LIMIT);
            let headers: Vec<_> = table.select(&HEADER_CELL).collect();

            if headers.is_empty() {
                issues.push(Issue::new(
                    self.name(),
                    "TABLE_NO_HEADERS",
                    "Data table is missing header cells (<th>). \
                     Headers help screen reader users understand table structure.",
                    context.clone(),
                ));
            }

            let named = table.select(&CAPTION).next().is_some()
                || dom::has_value(&table, "aria-label")
                || dom::has_value(&table, "aria-labelledby")
                || dom::has_value(&table, "summary");
            if !named {
                issues.push(Issue::new(
                    self.name(),
                    "TABLE_NO_CAPTION",
                    "Data table is missing a caption or accessible name. \
                     Use <caption> or aria-label to describe the table.",
                    context,
                ));
            }

            if headers.len() > 1 {
                if let Some(th) = headers.iter().find(|th| !dom::has_value(th, "scope")) {
                    issues.push(Issue::new(
                        self.name(),
                        "TABLE_MISSING_SCOPE",
                        "Table header is missing 'scope' attribute. \
                         Use scope='col' or scope='row' to clarify header relationships.",
                        dom::snippet(th, CONTEXT_LIMIT),
                    ));
                }
            }
        }

        Ok(issues)
    }
}
