// src/analyzers/form_labels.rs
// Form controls need an accessible label.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use super::dom::{self, css, CONTEXT_LIMIT};
use super::{Analyzer, AnalyzerError, Issue};

static CONTROLS: Lazy<Selector> = Lazy::new(|| css("input, textarea, select"));
static LABEL_FOR: Lazy<Selector> = Lazy::new(|| css("label[for]"));

// Input types that are not labelled through <label>
const UNLABELLED_TYPES: [&str; 5] = ["hidden", "submit", "button", "image", "reset"];

/// Detects input/textarea/select controls without any accessible label.
pub struct FormLabelAnalyzer;

impl Analyzer for FormLabelAnalyzer {
    fn name(&self) -> &str {
        "form_labels"
    }

    fn description(&self) -> &str {
        "Detect form controls without accessible labels"
    }

    fn analyze(&self, document: &Html) -> Result<Vec<Issue>, AnalyzerError> {
        let labelled_ids: HashSet<&str> = document
            .select(&LABEL_FOR)
            .filter_map(|label| label.value().attr("for"))
            .collect();

        let mut issues = Vec::new();

        for control in document.select(&CONTROLS) {
            let control_type = dom::attr_lower(&control, "type").unwrap_or_default();
            if UNLABELLED_TYPES.contains(&control_type.as_str()) {
                continue;
            }

            let by_label_for = control
                .value()
                .attr("id")
                .is_some_and(|id| !id.is_empty() && labelled_ids.contains(id));

            let labelled = by_label_for
                || dom::has_value(&control, "aria-label")
                || dom::has_value(&control, "aria-labelledby")
                || dom::has_value(&control, "title")
                || dom::has_ancestor(&control, "label");

            if !labelled {
                issues.push(Issue::new(
                    self.name(),
                    "FORM_CONTROL_NO_LABEL",
                    "Form control is missing an accessible label.",
                    dom::snippet(&control, CONTEXT_LIMIT),
                ));
            }
        }

        Ok(issues)
    }
}
