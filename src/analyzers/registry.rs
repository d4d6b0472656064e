// src/analyzers/registry.rs
// =============================================================================
// The AnalyzerRegistry maps analyzer names to analyzer instances.
//
// Lifecycle:
// - Built once (usually with AnalyzerRegistry::with_builtin())
// - Wrapped in an Arc and shared read-only by every crawl worker
// - No process-wide global: whoever runs a scan owns its registry
//
// Isolation:
// - Each analyzer call produces its own Result
// - Errors AND panics are caught per analyzer, logged, and turned into
//   "zero issues from this analyzer"; the remaining analyzers still run
// =============================================================================

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use scraper::Html;
use tracing::warn;

use super::{
    AltTextAnalyzer, Analyzer, AnalyzerError, AriaAnalyzer, ButtonAnalyzer, ContrastAnalyzer,
    DocumentStructureAnalyzer, FormLabelAnalyzer, HeadingOrderAnalyzer, Issue, LanguageAnalyzer,
    LinkTextAnalyzer, MediaAnalyzer, SkipLinkAnalyzer, TableAnalyzer,
};

/// Name-keyed collection of analyzers, kept in registration order.
#[derive(Default)]
pub struct AnalyzerRegistry {
    analyzers: Vec<Box<dyn Analyzer>>,
}

impl AnalyzerRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the twelve built-in analyzers.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        registry.register(AltTextAnalyzer);
        registry.register(FormLabelAnalyzer);
        registry.register(HeadingOrderAnalyzer);
        registry.register(ContrastAnalyzer);
        registry.register(LinkTextAnalyzer);
        registry.register(LanguageAnalyzer);
        registry.register(ButtonAnalyzer);
        registry.register(DocumentStructureAnalyzer);
        registry.register(TableAnalyzer);
        registry.register(AriaAnalyzer);
        registry.register(SkipLinkAnalyzer);
        registry.register(MediaAnalyzer);
        registry
    }

    /// Adds an analyzer. An analyzer with the same name is replaced in place.
    pub fn register<A: Analyzer + 'static>(&mut self, analyzer: A) {
        let boxed: Box<dyn Analyzer> = Box::new(analyzer);
        match self.position(boxed.name()) {
            Some(idx) => self.analyzers[idx] = boxed,
            None => self.analyzers.push(boxed),
        }
    }

    /// Removes an analyzer by name, returning true if it was registered.
    pub fn unregister(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(idx) => {
                self.analyzers.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn Analyzer> {
        self.position(name).map(|idx| self.analyzers[idx].as_ref())
    }

    /// Every registered analyzer keyed by name.
    pub fn list(&self) -> BTreeMap<&str, &dyn Analyzer> {
        self.analyzers
            .iter()
            .map(|a| (a.name(), a.as_ref()))
            .collect()
    }

    /// Name -> description for every registered analyzer.
    pub fn descriptions(&self) -> BTreeMap<String, String> {
        self.analyzers
            .iter()
            .map(|a| (a.name().to_string(), a.description().to_string()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.analyzers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyzers.is_empty()
    }

    /// Parses `html` once and runs every analyzer not listed in `exclude`.
    pub fn analyze_all(&self, html: &str, exclude: &[String]) -> Vec<Issue> {
        let document = Html::parse_document(html);
        self.analyze_document(&document, exclude)
    }

    // Runs every non-excluded analyzer on an already parsed page.
    //
    // Never fails: each analyzer outcome is inspected separately and a
    // failure only drops that analyzer's contribution.
    pub fn analyze_document(&self, document: &Html, exclude: &[String]) -> Vec<Issue> {
        let mut issues = Vec::new();

        for analyzer in &self.analyzers {
            if exclude.iter().any(|name| name == analyzer.name()) {
                continue;
            }

            match run_isolated(analyzer.as_ref(), document) {
                Ok(found) => issues.extend(found),
                Err(err) => warn!(analyzer = analyzer.name(), error = %err, "analyzer skipped"),
            }
        }

        issues
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.analyzers.iter().position(|a| a.name() == name)
    }
}

// Calls one analyzer, converting a panic into AnalyzerError::Panicked.
fn run_isolated(analyzer: &dyn Analyzer, document: &Html) -> Result<Vec<Issue>, AnalyzerError> {
    match panic::catch_unwind(AssertUnwindSafe(|| analyzer.analyze(document))) {
        Ok(outcome) => outcome,
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(AnalyzerError::Panicked {
                analyzer: analyzer.name().to_string(),
                reason,
            })
        }
    }
}

/// Counts issues per code.
pub fn summarize_issues(issues: &[Issue]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for issue in issues {
        *counts.entry(issue.code.clone()).or_insert(0) += 1;
    }
    counts
}
