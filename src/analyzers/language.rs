// src/analyzers/language.rs
// The <html> element must declare a valid page language.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use super::dom::{self, css};
use super::{Analyzer, AnalyzerError, Issue};

static HTML_ROOT: Lazy<Selector> = Lazy::new(|| css("html"));

// ISO 639-1 two-letter codes
const VALID_LANG_CODES: &[&str] = &[
    "aa", "ab", "ae", "af", "ak", "am", "an", "ar", "as", "av", "ay", "az", "ba", "be", "bg", "bh",
    "bi", "bm", "bn", "bo", "br", "bs", "ca", "ce", "ch", "co", "cr", "cs", "cu", "cv", "cy", "da",
    "de", "dv", "dz", "ee", "el", "en", "eo", "es", "et", "eu", "fa", "ff", "fi", "fj", "fo", "fr",
    "fy", "ga", "gd", "gl", "gn", "gu", "gv", "ha", "he", "hi", "ho", "hr", "ht", "hu", "hy", "hz",
    "ia", "id", "ie", "ig", "ii", "ik", "io", "is", "it", "iu", "ja", "jv", "ka", "kg", "ki", "kj",
    "kk", "kl", "km", "kn", "ko", "kr", "ks", "ku", "kv", "kw", "ky", "la", "lb", "lg", "li", "ln",
    "lo", "lt", "lu", "lv", "mg", "mh", "mi", "mk", "ml", "mn", "mr", "ms", "mt", "my", "na", "nb",
    "nd", "ne", "ng", "nl", "nn", "no", "nr", "nv", "ny", "oc", "oj", "om", "or", "os", "pa", "pi",
    "pl", "ps", "pt", "qu", "rm", "rn", "ro", "ru", "rw", "sa", "sc", "sd", "se", "sg", "si", "sk",
    "sl", "sm", "sn", "so", "sq", "sr", "ss", "st", "su", "sv", "sw", "ta", "te", "tg", "th", "ti",
    "tk", "tl", "tn", "to", "tr", "ts", "tt", "tw", "ty", "ug", "uk", "ur", "uz", "ve", "vi", "vo",
    "wa", "wo", "xh", "yi", "yo", "za", "zh", "zu",
];

/// Detects a missing, empty or unrecognised `lang` on the root element.
pub struct LanguageAnalyzer;

impl Analyzer for LanguageAnalyzer {
    fn name(&self) -> &str {
        "language"
    }

    fn description(&self) -> &str {
        "Detect missing or invalid lang attribute on HTML element"
    }

    fn analyze(&self, document: &Html) -> Result<Vec<Issue>, AnalyzerError> {
        let Some(root) = document.select(&HTML_ROOT).next() else {
            return Ok(Vec::new());
        };
        let context = dom::snippet(&root, 100);
        let lang = root.value().attr("lang").map(str::trim).unwrap_or("");

        if lang.is_empty() {
            return Ok(vec![Issue::new(
                self.name(),
                "MISSING_LANG",
                "HTML element is missing the 'lang' attribute. \
                 Screen readers use this to determine pronunciation.",
                context,
            )]);
        }

        let primary = lang.split('-').next().unwrap_or("").to_ascii_lowercase();
        if VALID_LANG_CODES.contains(&primary.as_str()) {
            return Ok(Vec::new());
        }

        Ok(vec![Issue::new(
            self.name(),
            "INVALID_LANG",
            format!(
                "Invalid language code '{}'. Use a valid ISO 639-1 language code.",
                lang
            ),
            context,
        )])
    }
}
