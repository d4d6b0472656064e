// src/analyzers/dom.rs
// =============================================================================
// Small helpers over scraper's ElementRef shared by several analyzers.
// =============================================================================

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

/// Maximum number of characters of markup kept in an issue's context
pub const CONTEXT_LIMIT: usize = 200;

static WITH_ID: Lazy<Selector> = Lazy::new(|| css("[id]"));

// Parses a selector that is written in the source code.
//
// Selectors passed here are constants, so a parse failure is a programmer
// error (same reasoning as the link extractor's "a[href]").
pub fn css(selector: &'static str) -> Selector {
    Selector::parse(selector).expect("static CSS selector must be valid")
}

/// Truncates `text` to at most `limit` characters (never splits a UTF-8 char).
pub fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Outer HTML of an element, truncated for use as issue context.
pub fn snippet(element: &ElementRef, limit: usize) -> String {
    truncate(&element.html(), limit)
}

/// True if the element contains any non-whitespace text.
pub fn has_text(element: &ElementRef) -> bool {
    element.text().any(|t| !t.trim().is_empty())
}

/// The element's visible text with every fragment trimmed and concatenated.
pub fn stripped_text(element: &ElementRef) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("")
}

/// True if the attribute exists and is not blank.
pub fn has_value(element: &ElementRef, attr: &str) -> bool {
    element
        .value()
        .attr(attr)
        .is_some_and(|v| !v.trim().is_empty())
}

/// True if the attribute exists at all (boolean attributes like `autoplay`).
pub fn has_attr(element: &ElementRef, attr: &str) -> bool {
    element.value().attr(attr).is_some()
}

/// Attribute value trimmed and lowercased.
pub fn attr_lower(element: &ElementRef, attr: &str) -> Option<String> {
    element
        .value()
        .attr(attr)
        .map(|v| v.trim().to_ascii_lowercase())
}

/// True if any ancestor of the element has the given tag name.
pub fn has_ancestor(element: &ElementRef, tag: &str) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| ancestor.value().name() == tag)
}

/// True if some element in the document carries `id="<id>"`.
pub fn id_exists(document: &Html, id: &str) -> bool {
    document
        .select(&WITH_ID)
        .any(|el| el.value().attr("id") == Some(id))
}

// Decides whether keyboard users can tab to an element.
//
// Rules:
//   - disabled elements never receive focus
//   - a (with href), button, input, select, textarea and iframe are focusable
//   - any element with tabindex >= 0 is focusable
//   - contenteditable="true" is focusable
pub fn is_focusable(element: &ElementRef) -> bool {
    if has_attr(element, "disabled") {
        return false;
    }

    match element.value().name() {
        "a" => {
            if has_value(element, "href") {
                return true;
            }
        }
        "button" | "input" | "select" | "textarea" | "iframe" => return true,
        _ => {}
    }

    if let Some(tabindex) = element.value().attr("tabindex") {
        if let Ok(index) = tabindex.trim().parse::<i32>() {
            return index >= 0;
        }
    }

    element.value().attr("contenteditable") == Some("true")
}
