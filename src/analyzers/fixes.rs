// src/analyzers/fixes.rs
// =============================================================================
// Automatic repairs for the issues that have a safe mechanical fix.
//
// - IMG_MISSING_ALT: the image gets an alt text derived from its file name
// - LOW_CONTRAST:    every inline `color` declaration becomes black or white,
//                    whichever meets WCAG AA on the declared background
//
// The page is parsed once, edited in the parsed tree and serialized again,
// so the output is normalized HTML rather than the original bytes.
// =============================================================================

use html5ever::{LocalName, Namespace, QualName};
use once_cell::sync::Lazy;
use scraper::node::Element;
use scraper::{ElementRef, Html, Node, Selector, StrTendril};
use serde::{Deserialize, Serialize};

use super::contrast::{contrast_ratio, recommend_foreground, style_colors, Rgb, WCAG_AA_THRESHOLD};
use super::dom::{self, css, CONTEXT_LIMIT};

static IMG: Lazy<Selector> = Lazy::new(|| css("img"));
static STYLED: Lazy<Selector> = Lazy::new(|| css("[style]"));

/// Issue codes apply_fixes() knows how to repair
pub const FIXABLE_CODES: [&str; 2] = ["IMG_MISSING_ALT", "LOW_CONTRAST"];

/// One change made to a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedFix {
    pub code: String,
    /// What was changed, e.g. `set alt='logo'`
    pub fix: String,
    /// The element after the change, truncated
    pub context: String,
}

/// A repaired page and the list of changes made to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedPage {
    pub html: String,
    pub fixes: Vec<AppliedFix>,
}

/// True if at least one of `codes` is something apply_fixes() can repair.
pub fn is_fixable<'a>(mut codes: impl Iterator<Item = &'a str>) -> bool {
    codes.any(|code| FIXABLE_CODES.contains(&code))
}

// Repairs missing alt texts and low-contrast inline colors
//
// Returns: the serialized page plus one AppliedFix per edited element
pub fn apply_fixes(html: &str) -> FixedPage {
    let mut document = Html::parse_document(html);
    let mut fixes = Vec::new();

    // Collect first: the tree cannot be edited while a selection borrows it
    let images: Vec<_> = document
        .select(&IMG)
        .filter(|img| !dom::has_value(img, "alt"))
        .map(|img| (img.id(), alt_from_src(img.value().attr("src").unwrap_or_default())))
        .collect();

    for (id, alt) in images {
        if let Some(mut node) = document.tree.get_mut(id) {
            if let Node::Element(element) = node.value() {
                set_attr(element, "alt", &alt);
            }
        }
        fixes.push(AppliedFix {
            code: "IMG_MISSING_ALT".to_string(),
            fix: format!("set alt='{}'", alt),
            context: context_of(&document, id),
        });
    }

    let low_contrast: Vec<_> = document
        .select(&STYLED)
        .filter_map(|element| {
            let style = element.value().attr("style")?;
            let (Some(fg), Some(bg)) = style_colors(style) else {
                return None;
            };
            if contrast_ratio(fg, bg) >= WCAG_AA_THRESHOLD {
                return None;
            }
            let foreground = recommend_foreground(bg);
            Some((element.id(), rewrite_color(style, foreground), foreground))
        })
        .collect();

    for (id, style, foreground) in low_contrast {
        if let Some(mut node) = document.tree.get_mut(id) {
            if let Node::Element(element) = node.value() {
                set_attr(element, "style", &style);
            }
        }
        fixes.push(AppliedFix {
            code: "LOW_CONTRAST".to_string(),
            fix: format!("set color={}", foreground.to_hex()),
            context: context_of(&document, id),
        });
    }

    FixedPage {
        html: document.html(),
        fixes,
    }
}

/// File name for the fixed copy of `page` (a URL or a local path).
///
/// `https://example.com/about` -> `https_example.com_about.html`
pub fn fixed_file_name(page: &str) -> String {
    let flat: String = page
        .replace("://", "_")
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let flat = flat.trim_matches('_');
    let stem = flat
        .strip_suffix(".html")
        .or_else(|| flat.strip_suffix(".htm"))
        .unwrap_or(flat);

    if stem.is_empty() {
        "page.html".to_string()
    } else {
        format!("{}.html", stem)
    }
}

// "img/team-photo_2.jpg?v=3" -> "team photo 2"
fn alt_from_src(src: &str) -> String {
    if src.trim_start().starts_with("data:") {
        return "image".to_string();
    }

    let path = src.split(|c: char| c == '?' || c == '#').next().unwrap_or_default();
    let file = path.rsplit('/').next().unwrap_or_default();
    let stem = match file.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file,
    };

    let words: Vec<&str> = stem
        .split(|c: char| c == '-' || c == '_' || c == '.')
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() {
        "image".to_string()
    } else {
        words.join(" ")
    }
}

// Replaces every `color` declaration, keeping the others in order
fn rewrite_color(style: &str, foreground: Rgb) -> String {
    style
        .split(';')
        .map(str::trim)
        .filter(|declaration| !declaration.is_empty())
        .map(|declaration| match declaration.split_once(':') {
            Some((property, _)) if property.trim().eq_ignore_ascii_case("color") => {
                format!("color: {}", foreground.to_hex())
            }
            _ => declaration.to_string(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

// Attributes parsed from HTML live in the empty namespace
fn set_attr(element: &mut Element, name: &str, value: &str) {
    let key = QualName::new(None, Namespace::from(""), LocalName::from(name));
    element.attrs.insert(key, StrTendril::from(value));
}

fn context_of(document: &Html, id: ego_tree::NodeId) -> String {
    document
        .tree
        .get(id)
        .and_then(ElementRef::wrap)
        .map(|element| dom::snippet(&element, CONTEXT_LIMIT))
        .unwrap_or_default()
}
