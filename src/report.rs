// src/report.rs
// =============================================================================
// Turns raw scan results into what the user sees.
//
// - Every issue is enriched with severity + WCAG data
// - Issues on each page are sorted critical -> major -> minor
// - Output is either a human-readable listing or JSON:
//     {"target": ..., "pages": {url: [issue, ...]}, "summary": {...},
//      "fixes": {url: {...}}}   <- only with --apply-fixes
// =============================================================================

use std::collections::BTreeMap;
use std::fmt::Write;
use std::path::PathBuf;

use a11y_guardian::analyzers::{summarize_issues, AppliedFix, Issue};
use a11y_guardian::severity::{
    enrich_all, sort_by_severity, summarize_by_severity, EnrichedIssue, Severity, SeverityCounts,
};
use serde::Serialize;

// Widest context snippet shown in the table view
const CONTEXT_WIDTH: usize = 100;

#[derive(Debug, Serialize)]
pub struct Report {
    pub target: String,
    pub pages: BTreeMap<String, Vec<EnrichedIssue>>,
    pub summary: Summary,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub fixes: BTreeMap<String, PageFixes>,
}

/// What --apply-fixes did for one page
#[derive(Debug, Default, Serialize)]
pub struct PageFixes {
    pub applied: Vec<AppliedFix>,
    /// Where the fixed page was written (--outdir)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub written_to: Option<PathBuf>,
    /// Start of the fixed markup when no --outdir was given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html_snippet: Option<String>,
    /// Why the page could not be fixed (e.g. the re-fetch failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Summary {
    pub pages_scanned: usize,
    pub pages_with_issues: usize,
    pub total_issues: usize,
    pub by_severity: SeverityCounts,
    pub by_code: BTreeMap<String, usize>,
}

impl Report {
    pub fn new(target: &str, pages: &BTreeMap<String, Vec<Issue>>) -> Self {
        let all: Vec<Issue> = pages.values().flatten().cloned().collect();

        let pages: BTreeMap<String, Vec<EnrichedIssue>> = pages
            .iter()
            .map(|(url, issues)| {
                let mut enriched = enrich_all(issues);
                sort_by_severity(&mut enriched);
                (url.clone(), enriched)
            })
            .collect();

        let every_enriched: Vec<EnrichedIssue> = pages.values().flatten().cloned().collect();
        let summary = Summary {
            pages_scanned: pages.len(),
            pages_with_issues: pages.values().filter(|i| !i.is_empty()).count(),
            total_issues: all.len(),
            by_severity: summarize_by_severity(&every_enriched),
            by_code: summarize_issues(&all),
        };

        Self {
            target: target.to_string(),
            pages,
            summary,
            fixes: BTreeMap::new(),
        }
    }

    pub fn with_fixes(mut self, fixes: BTreeMap<String, PageFixes>) -> Self {
        self.fixes = fixes;
        self
    }

    pub fn has_issues(&self) -> bool {
        self.summary.total_issues > 0
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    // Human-readable listing: one block per page, then the summary
    pub fn to_pretty(&self) -> String {
        let mut out = String::new();

        for (url, issues) in &self.pages {
            let _ = writeln!(out, "📄 {} ({} issue(s))", url, issues.len());
            for issue in issues {
                let wcag = issue
                    .wcag
                    .as_deref()
                    .map(|w| format!(" [WCAG {}]", w))
                    .unwrap_or_default();
                let _ = writeln!(
                    out,
                    "   {} {:<8} {:<22}{} {}",
                    issue.severity.emoji(),
                    issue.severity.as_str().to_uppercase(),
                    issue.issue.code,
                    wcag,
                    issue.issue.message
                );
                if !issue.issue.context.is_empty() {
                    let _ = writeln!(out, "      ↳ {}", shorten(&issue.issue.context, CONTEXT_WIDTH));
                }
            }
            out.push('\n');
        }

        if !self.fixes.is_empty() {
            let _ = writeln!(out, "🔧 Fixes:");
            for (url, page) in &self.fixes {
                if let Some(error) = &page.error {
                    let _ = writeln!(out, "   ❌ {}: {}", url, error);
                    continue;
                }
                let _ = writeln!(out, "   📄 {} ({} fix(es))", url, page.applied.len());
                for fix in &page.applied {
                    let _ = writeln!(out, "      {:<16} {}", fix.code, fix.fix);
                }
                if let Some(path) = &page.written_to {
                    let _ = writeln!(out, "      📝 Written to {}", path.display());
                }
            }
            out.push('\n');
        }

        let summary = &self.summary;
        let _ = writeln!(out, "📊 Summary:");
        let _ = writeln!(out, "   📄 Pages scanned: {}", summary.pages_scanned);
        let _ = writeln!(out, "   ⚠️  Pages with issues: {}", summary.pages_with_issues);
        for severity in Severity::ALL {
            let _ = writeln!(
                out,
                "   {} {}: {}",
                severity.emoji(),
                capitalize(severity.as_str()),
                summary.by_severity.get(severity)
            );
        }
        let _ = writeln!(out, "   📋 Total: {}", summary.total_issues);

        if !summary.by_code.is_empty() {
            let _ = writeln!(out, "\n🔎 By issue code:");
            for (code, count) in &summary.by_code {
                let _ = writeln!(out, "   {:<24} {}", code, count);
            }
        }
        out
    }
}

// Single-line, char-safe truncation for terminal output
fn shorten(text: &str, width: usize) -> String {
    let flat: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() > width {
        let cut: String = flat.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", cut)
    } else {
        flat
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> BTreeMap<String, Vec<Issue>> {
        BTreeMap::from([
            (
                "https://example.com/".to_string(),
                vec![
                    Issue::new("heading_order", "HEADING_ORDER", "skipped level", "sequence: [1, 3]"),
                    Issue::new("alt_text", "IMG_MISSING_ALT", "no alt", "<img src=\"a.png\">"),
                ],
            ),
            ("https://example.com/clean".to_string(), vec![]),
        ])
    }

    #[test]
    fn test_summary_counts() {
        let report = Report::new("https://example.com/", &sample());
        assert!(report.has_issues());
        assert_eq!(report.summary.pages_scanned, 2);
        assert_eq!(report.summary.pages_with_issues, 1);
        assert_eq!(report.summary.total_issues, 2);
        assert_eq!(report.summary.by_severity.critical, 1);
        assert_eq!(report.summary.by_severity.minor, 1);
        assert_eq!(report.summary.by_code["IMG_MISSING_ALT"], 1);
    }

    #[test]
    fn test_pages_sorted_by_severity() {
        let report = Report::new("https://example.com/", &sample());
        let first = &report.pages["https://example.com/"][0];
        assert_eq!(first.issue.code, "IMG_MISSING_ALT");
    }

    #[test]
    fn test_json_shape() {
        let report = Report::new("https://example.com/", &sample());
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["summary"]["total_issues"], 2);
        assert_eq!(value["summary"]["by_severity"]["critical"], 1);
        assert_eq!(value["pages"]["https://example.com/"][0]["severity"], "critical");
        assert_eq!(value["pages"]["https://example.com/"][0]["wcag"], "1.1.1");
    }

    #[test]
    fn test_pretty_output() {
        let text = Report::new("https://example.com/", &sample()).to_pretty();
        assert!(text.contains("📄 https://example.com/ (2 issue(s))"));
        assert!(text.contains("IMG_MISSING_ALT"));
        assert!(text.contains("[WCAG 1.1.1]"));
        assert!(text.contains("📋 Total: 2"));
    }

    #[test]
    fn test_fixes_in_json_and_pretty_output() {
        let fixes = BTreeMap::from([
            (
                "https://example.com/".to_string(),
                PageFixes {
                    applied: vec![AppliedFix {
                        code: "IMG_MISSING_ALT".to_string(),
                        fix: "set alt='a'".to_string(),
                        context: "<img src=\"a.png\" alt=\"a\">".to_string(),
                    }],
                    written_to: Some(PathBuf::from("out/https_example.com.html")),
                    ..PageFixes::default()
                },
            ),
            (
                "https://example.com/clean".to_string(),
                PageFixes {
                    error: Some("HTTP 503".to_string()),
                    ..PageFixes::default()
                },
            ),
        ]);
        let report = Report::new("https://example.com/", &sample()).with_fixes(fixes);

        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        let page = &value["fixes"]["https://example.com/"];
        assert_eq!(page["applied"][0]["fix"], "set alt='a'");
        assert_eq!(page["written_to"], "out/https_example.com.html");
        assert!(page.get("html_snippet").is_none());
        assert_eq!(value["fixes"]["https://example.com/clean"]["error"], "HTTP 503");

        let text = report.to_pretty();
        assert!(text.contains("🔧 Fixes:"));
        assert!(text.contains("set alt='a'"));
        assert!(text.contains("❌ https://example.com/clean: HTTP 503"));
    }

    #[test]
    fn test_no_fixes_key_without_apply_fixes() {
        let report = Report::new("https://example.com/", &sample());
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert!(value.get("fixes").is_none());
    }

    #[test]
    fn test_empty_report() {
        let report = Report::new("page.html", &BTreeMap::from([("page.html".to_string(), vec![])]));
        assert!(!report.has_issues());
        assert_eq!(report.summary.pages_scanned, 1);
    }

    #[test]
    fn test_shorten() {
        assert_eq!(shorten("a\n   b", 10), "a b");
        assert_eq!(shorten("abcdefghij", 5), "ab...");
    }
}
