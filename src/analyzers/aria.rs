// src/analyzers/aria.rs
// =============================================================================
// ARIA misuse:
// - role values outside the WAI-ARIA vocabulary
// - aria-hidden="true" on something keyboard users can still focus, either
//   the element itself or one of its descendants
// =============================================================================

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use super::dom::{self, css, CONTEXT_LIMIT};
use super::{Analyzer, AnalyzerError, Issue};

static WITH_ROLE: Lazy<Selector> = Lazy::new(|| css("[role]"));
static ARIA_HIDDEN: Lazy<Selector> = Lazy::new(|| css(r#"[aria-hidden="true"]"#));
static ANY: Lazy<Selector> = Lazy::new(|| css("*"));

const VALID_ARIA_ROLES: &[&str] = &[
    // landmarks
    "banner", "complementary", "contentinfo", "form", "main", "navigation", "region", "search",
    // document structure
    "article", "cell", "columnheader", "definition", "directory", "document", "feed", "figure",
    "group", "heading", "img", "list", "listitem", "math", "none", "note", "presentation", "row",
    "rowgroup", "rowheader", "separator", "table", "term", "toolbar", "tooltip",
    // widgets and live regions
    "alert", "alertdialog", "button", "checkbox", "combobox", "dialog", "gridcell", "link",
    "listbox", "log", "marquee", "menu", "menubar", "menuitem", "menuitemcheckbox",
    "menuitemradio", "option", "progressbar", "radio", "radiogroup", "scrollbar", "searchbox",
    "slider", "spinbutton", "status", "switch", "tab", "tablist", "tabpanel", "textbox", "timer",
    "tree", "treegrid", "treeitem",
    // abstract roles seen in the wild
    "command", "composite", "input", "landmark", "range", "roletype", "section", "sectionhead",
    "select", "structure", "widget", "window",
    "application", "generic",
];

/// Detects invalid roles and focusable content hidden with aria-hidden.
pub struct AriaAnalyzer;

impl Analyzer for AriaAnalyzer {
    fn name(&self) -> &str {
        "aria"
    }

    fn description(&self) -> &str {
        "Detect ARIA usage issues (invalid roles, aria-hidden on focusable)"
    }

    fn analyze(&self, document: &Html) -> Result<Vec<Issue>, AnalyzerError> {
        let mut issues = Vec::new();

        for element in document.select(&WITH_ROLE) {
            let role = dom::attr_lower(&element, "role").unwrap_or_default();
            if !role.is_empty() && !VALID_ARIA_ROLES.contains(&role.as_str()) {
                issues.push(Issue::new(
                    self.name(),
                    "INVALID_ARIA_ROLE",
                    format!("Invalid ARIA role '{}'. Use a valid WAI-ARIA role.", role),
                    dom::snippet(&element, CONTEXT_LIMIT),
                ));
            }
        }

        for hidden in document.select(&ARIA_HIDDEN) {
            if dom::is_focusable(&hidden) {
                issues.push(Issue::new(
                    self.name(),
                    "ARIA_HIDDEN_FOCUSABLE",
                    "Element with aria-hidden='true' is focusable. \
                     This creates a confusing experience for keyboard users.",
                    dom::snippet(&hidden, CONTEXT_LIMIT),
                ));
            }

            if hidden.select(&ANY).any(|child| dom::is_focusable(&child)) {
                issues.push(Issue::new(
                    self.name(),
                    "ARIA_HIDDEN_FOCUSABLE",
                    "Element with aria-hidden='true' contains focusable content. \
                     Keyboard users can focus invisible elements.",
                    dom::snippet(&hidden, CONTEXT_LIMIT),
                ));
            }
        }

        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(html: &str) -> Vec<String> {
        AriaAnalyzer
            .analyze_html(html)
            .unwrap()
            .into_iter()
            .map(|i| i.code)
            .collect()
    }

    #[test]
    fn test_invalid_role() {
        assert_eq!(codes(r#"<div role="buton">x</div>"#), vec!["INVALID_ARIA_ROLE"]);
        assert!(codes(r#"<nav role="Navigation"></nav>"#).is_empty());
    }

    #[test]
    fn test_hidden_focusable_element() {
        assert_eq!(
            codes(r#"<a href="/x" aria-hidden="true">x</a>"#),
            vec!["ARIA_HIDDEN_FOCUSABLE"]
        );
    }

    #[test]
    fn test_hidden_container_reported_once() {
        let html = r#"<div aria-hidden="true"><button>a</button><input></div>"#;
        assert_eq!(codes(html), vec!["ARIA_HIDDEN_FOCUSABLE"]);
    }

    #[test]
    fn test_hidden_decorative_content_passes() {
        let html = r#"<span aria-hidden="true"><svg></svg><a>no href</a></span>
                      <div aria-hidden="true"><button disabled>x</button></div>"#;
        assert!(codes(html).is_empty());
    }
}
