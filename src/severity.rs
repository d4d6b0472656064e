// src/severity.rs
// =============================================================================
// Severity model: maps issue codes to a severity tier and the WCAG success
// criterion they violate.
//
// Issues coming out of the analyzers carry no severity. Reports call
// enrich() to get an EnrichedIssue (the original issue plus four fields),
// then sort and summarize by tier.
//
// Unknown codes (for example from a user-registered analyzer) are treated
// as minor and carry no WCAG reference.
// =============================================================================

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::analyzers::Issue;

/// How badly an issue blocks access, most severe first.
///
/// The derived ordering is the report ordering: Critical < Major < Minor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Severity {
    /// Blocks access for users with disabilities
    Critical,
    /// Significant barrier, hard to work around
    Major,
    /// Usability problem with workarounds
    Minor,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Critical, Severity::Major, Severity::Minor];

    pub const fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Major => "major",
            Severity::Minor => "minor",
        }
    }

    /// Color name used by terminal and HTML output
    pub const fn color(self) -> &'static str {
        match self {
            Severity::Critical => "red",
            Severity::Major => "yellow",
            Severity::Minor => "blue",
        }
    }

    pub const fn emoji(self) -> &'static str {
        match self {
            Severity::Critical => "🔴",
            Severity::Major => "🟡",
            Severity::Minor => "🔵",
        }
    }
}

// Any tier name we do not know lands in the minor bucket.
impl From<String> for Severity {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "critical" => Severity::Critical,
            "major" => Severity::Major,
            _ => Severity::Minor,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the lookup table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeverityInfo {
    pub level: Severity,
    pub wcag: &'static str,
    pub wcag_name: &'static str,
    pub impact: &'static str,
}

const fn info(
    level: Severity,
    wcag: &'static str,
    wcag_name: &'static str,
    impact: &'static str,
) -> SeverityInfo {
    SeverityInfo {
        level,
        wcag,
        wcag_name,
        impact,
    }
}

static SEVERITY_TABLE: Lazy<BTreeMap<&'static str, SeverityInfo>> = Lazy::new(|| {
    use Severity::*;
    BTreeMap::from([
        // critical
        ("IMG_MISSING_ALT", info(Critical, "1.1.1", "Non-text Content", "Screen reader users cannot understand image content")),
        ("LINK_IMG_MISSING_ALT", info(Critical, "1.1.1", "Non-text Content", "Screen reader users cannot understand link purpose")),
        ("FORM_CONTROL_NO_LABEL", info(Critical, "1.3.1", "Info and Relationships", "Screen reader users cannot identify form fields")),
        ("LINK_NO_TEXT", info(Critical, "2.4.4", "Link Purpose (In Context)", "Screen reader users cannot understand link destination")),
        ("BUTTON_NO_TEXT", info(Critical, "4.1.2", "Name, Role, Value", "Screen reader users cannot understand button purpose")),
        ("MISSING_LANG", info(Critical, "3.1.1", "Language of Page", "Screen readers may mispronounce content")),
        ("TABLE_NO_HEADERS", info(Critical, "1.3.1", "Info and Relationships", "Screen reader users cannot understand table structure")),
        ("ARIA_HIDDEN_FOCUSABLE", info(Critical, "4.1.2", "Name, Role, Value", "Keyboard users can focus invisible elements")),
        // major
        ("LOW_CONTRAST", info(Major, "1.4.3", "Contrast (Minimum)", "Users with low vision may not be able to read text")),
        ("VIDEO_NO_CAPTIONS", info(Major, "1.2.2", "Captions (Prerecorded)", "Deaf users cannot access video audio content")),
        ("AUDIO_NO_TRANSCRIPT", info(Major, "1.2.1", "Audio-only and Video-only", "Deaf users cannot access audio content")),
        ("INVALID_ARIA_ROLE", info(Major, "4.1.2", "Name, Role, Value", "Assistive technology may not interpret element correctly")),
        ("MISSING_MAIN", info(Major, "1.3.1", "Info and Relationships", "Screen reader users cannot easily navigate to main content")),
        ("AUTOPLAY_NO_CONTROLS", info(Major, "1.4.2", "Audio Control", "Users cannot stop unwanted audio")),
        // minor
        ("HEADING_ORDER", info(Minor, "1.3.1", "Info and Relationships", "May confuse screen reader users navigating by headings")),
        ("INVALID_LANG", info(Minor, "3.1.1", "Language of Page", "Screen readers may not properly switch language")),
        ("NO_SKIP_LINK", info(Minor, "2.4.1", "Bypass Blocks", "Keyboard users must tab through all navigation")),
        ("BROKEN_SKIP_LINK", info(Minor, "2.4.1", "Bypass Blocks", "Skip link does not work as expected")),
        ("MULTIPLE_H1", info(Minor, "1.3.1", "Info and Relationships", "May confuse screen reader users about page structure")),
        ("TABLE_NO_CAPTION", info(Minor, "1.3.1", "Info and Relationships", "Screen reader users may not understand table purpose")),
        ("MISSING_TITLE", info(Minor, "2.4.2", "Page Titled", "Users may not identify page purpose in tabs/bookmarks")),
    ])
});

/// Table entry for a code, if the code is known.
pub fn lookup(code: &str) -> Option<&'static SeverityInfo> {
    SEVERITY_TABLE.get(code)
}

/// Severity tier for a code (minor when unknown).
pub fn severity_of(code: &str) -> Severity {
    lookup(code).map_or(Severity::Minor, |i| i.level)
}

/// An Issue plus its severity and WCAG reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedIssue {
    #[serde(flatten)]
    pub issue: Issue,
    pub severity: Severity,
    pub wcag: Option<String>,
    pub wcag_name: Option<String>,
    pub impact: Option<String>,
}

/// Builds a new EnrichedIssue; the input issue is left untouched.
pub fn enrich(issue: &Issue) -> EnrichedIssue {
    let info = lookup(&issue.code);
    EnrichedIssue {
        issue: issue.clone(),
        severity: info.map_or(Severity::Minor, |i| i.level),
        wcag: info.map(|i| i.wcag.to_string()),
        wcag_name: info.map(|i| i.wcag_name.to_string()),
        impact: info.map(|i| i.impact.to_string()),
    }
}

pub fn enrich_all(issues: &[Issue]) -> Vec<EnrichedIssue> {
    issues.iter().map(enrich).collect()
}

/// Orders critical first, then major, then minor. Ties keep their order.
pub fn sort_by_severity(issues: &mut [EnrichedIssue]) {
    // slice::sort_by_key is a stable sort
    issues.sort_by_key(|issue| issue.severity);
}

/// Issue counts per severity tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub major: usize,
    pub minor: usize,
}

impl SeverityCounts {
    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::Major => self.major,
            Severity::Minor => self.minor,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.major + self.minor
    }

    fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::Major => self.major += 1,
            Severity::Minor => self.minor += 1,
        }
    }
}

pub fn summarize_by_severity(issues: &[EnrichedIssue]) -> SeverityCounts {
    let mut counts = SeverityCounts::default();
    for issue in issues {
        counts.add(issue.severity);
    }
    counts
}
