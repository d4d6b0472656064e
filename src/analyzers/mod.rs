// src/analyzers/mod.rs
// =============================================================================
// This module contains the accessibility rule checkers ("analyzers").
//
// Every analyzer implements the same small trait:
// - name():        unique identifier, used for --exclude and the registry key
// - description(): one line shown by `a11y-guardian analyzers`
// - analyze():     takes a parsed page and returns zero or more Issues
//
// The AnalyzerRegistry (registry.rs) owns a set of analyzers and runs them
// against a page, isolating failures so one broken rule never hides the
// results of the others.
//
// Submodules:
// - dom: shared helpers over scraper's ElementRef (text, focusability, ...)
// - fixes: automatic repairs for missing alt texts and low contrast
// - one file per built-in analyzer
// =============================================================================

mod alt_text;
mod aria;
mod button;
mod contrast;
mod dom;
mod fixes;
mod form_labels;
mod heading_order;
mod language;
mod link_text;
mod media;
mod registry;
mod skip_link;
mod structure;
mod table;

use scraper::Html;
use serde::{Deserialize, Serialize};

pub use crate::error::AnalyzerError;
pub use alt_text::AltTextAnalyzer;
pub use aria::AriaAnalyzer;
pub use button::ButtonAnalyzer;
pub use contrast::{contrast_ratio, parse_color, recommend_foreground, ContrastAnalyzer, Rgb};
pub use fixes::{apply_fixes, fixed_file_name, is_fixable, AppliedFix, FixedPage, FIXABLE_CODES};
pub use form_labels::FormLabelAnalyzer;
pub use heading_order::HeadingOrderAnalyzer;
pub use language::LanguageAnalyzer;
pub use link_text::LinkTextAnalyzer;
pub use media::MediaAnalyzer;
pub use registry::{summarize_issues, AnalyzerRegistry};
pub use skip_link::SkipLinkAnalyzer;
pub use structure::DocumentStructureAnalyzer;
pub use table::TableAnalyzer;

/// A single accessibility problem found on a page.
///
/// Issues are created by exactly one analyzer and never mutated afterwards;
/// the severity model produces a separate `EnrichedIssue` from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Machine-readable code, e.g. `IMG_MISSING_ALT`
    pub code: String,
    /// Human-readable explanation
    pub message: String,
    /// Truncated markup snippet of the offending element
    pub context: String,
    /// Name of the analyzer that produced this issue
    pub analyzer: String,
}

impl Issue {
    pub fn new(
        analyzer: &str,
        code: &str,
        message: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            context: context.into(),
            analyzer: analyzer.to_string(),
        }
    }
}

/// A pluggable accessibility rule checker.
///
/// Analyzers must be `Send + Sync` so a single registry can be shared by all
/// crawl workers. They receive a private parsed document per call and must
/// not keep state between calls.
pub trait Analyzer: Send + Sync {
    /// Unique name, used as the registry key
    fn name(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str;

    /// Check a parsed page and report every violation found
    fn analyze(&self, document: &Html) -> Result<Vec<Issue>, AnalyzerError>;

    /// Convenience wrapper that parses raw markup first
    fn analyze_html(&self, html: &str) -> Result<Vec<Issue>, AnalyzerError> {
        self.analyze(&Html::parse_document(html))
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why a trait instead of an enum of analyzers?
//    - Users of the library can write their own analyzer and register it
//    - Box<dyn Analyzer> lets the registry hold different types in one map
//
// 2. Why `Send + Sync`?
//    - The registry is shared (behind an Arc) by many tokio tasks
//    - The compiler refuses to share types that are not thread-safe
//
// 3. Why does analyze() return a Result?
//    - A custom analyzer may fail; the registry turns that failure into
//      "zero issues from this analyzer" instead of aborting the whole page
// -----------------------------------------------------------------------------
