// src/analyzers/button.rs
// Buttons need an accessible name.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use super::dom::{self, css, CONTEXT_LIMIT};
use super::{Analyzer, AnalyzerError, Issue};

static BUTTON: Lazy<Selector> = Lazy::new(|| css("button"));
static INPUT_BUTTON: Lazy<Selector> = Lazy::new(|| css("input[type]"));
static ROLE_BUTTON: Lazy<Selector> = Lazy::new(|| css(r#"[role="button"]"#));
static IMG: Lazy<Selector> = Lazy::new(|| css("img"));

// Text, aria-label, aria-labelledby, title, or a nested image with alt
fn has_accessible_name(element: &ElementRef) -> bool {
    dom::has_text(element)
        || dom::has_value(element, "aria-label")
        || dom::has_value(element, "aria-labelledby")
        || dom::has_value(element, "title")
        || element
            .select(&IMG)
            .next()
            .is_some_and(|img| dom::has_value(&img, "alt"))
}

/// Detects `<button>`, `role="button"` and button-like inputs without a name.
pub struct ButtonAnalyzer;

impl ButtonAnalyzer {
    fn issue(&self, message: String, element: &ElementRef) -> Issue {
        Issue::new(
            self.name(),
            "BUTTON_NO_TEXT",
            message,
            dom::snippet(element, CONTEXT_LIMIT),
        )
    }
}

impl Analyzer for ButtonAnalyzer {
    fn name(&self) -> &str {
        "button"
    }

    fn description(&self) -> &str {
        "Detect buttons without accessible names"
    }

    fn analyze(&self, document: &Html) -> Result<Vec<Issue>, AnalyzerError> {
        let mut issues = Vec::new();

        for button in document.select(&BUTTON) {
            if !has_accessible_name(&button) {
                issues.push(self.issue("Button element has no accessible name.".into(), &button));
            }
        }

        for input in document.select(&INPUT_BUTTON) {
            let input_type = dom::attr_lower(&input, "type").unwrap_or_default();
            if !matches!(input_type.as_str(), "button" | "submit" | "reset") {
                continue;
            }

            let named = dom::has_value(&input, "value")
                || dom::has_value(&input, "aria-label")
                || dom::has_value(&input, "aria-labelledby")
                || dom::has_value(&input, "title");
            if named {
                continue;
            }

            // Browsers give submit inputs a default label, so only an
            // explicitly empty value counts as missing
            let explicit_empty = input.value().attr("value") == Some("");
            if input_type != "submit" || explicit_empty {
                issues.push(self.issue(
                    format!("Input type='{}' has no accessible name.", input_type),
                    &input,
                ));
            }
        }

        // <button role="button"> was already covered above
        for element in document.select(&ROLE_BUTTON) {
            if element.value().name() == "button" {
                continue;
            }
            if !has_accessible_name(&element) {
                issues.push(self.issue(
                    "Element with role='button' has no accessible name.".into(),
                    &element,
                ));
            }
        }

        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(html: &str) -> usize {
        ButtonAnalyzer.analyze_html(html).unwrap().len()
    }

    #[test]
    fn test_empty_button() {
        assert_eq!(count("<button></button>"), 1);
        assert_eq!(count(r#"<div role="button"></div>"#), 1);
        assert_eq!(count(r#"<button role="button"></button>"#), 1);
    }

    #[test]
    fn test_named_buttons() {
        assert_eq!(count("<button>Save</button>"), 0);
        assert_eq!(count(r#"<button aria-label="Close"></button>"#), 0);
        assert_eq!(count(r#"<button><img src="x.png" alt="Search"></button>"#), 0);
        assert_eq!(count(r#"<span role="button" title="Menu"></span>"#), 0);
    }

    #[test]
    fn test_input_buttons() {
        assert_eq!(count(r#"<input type="button">"#), 1);
        assert_eq!(count(r#"<input type="reset">"#), 1);
        assert_eq!(count(r#"<input type="submit">"#), 0);
        assert_eq!(count(r#"<input type="submit" value="">"#), 1);
        assert_eq!(count(r#"<input type="submit" value="Send">"#), 0);
        assert_eq!(count(r#"<input type="text">"#), 0);
    }
}
