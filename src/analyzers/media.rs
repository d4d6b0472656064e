// src/analyzers/media.rs
// Video captions and autoplaying media.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use super::dom::{self, css, CONTEXT_LIMIT};
use super::{Analyzer, AnalyzerError, Issue};

static VIDEO: Lazy<Selector> = Lazy::new(|| css("video"));
static AUDIO: Lazy<Selector> = Lazy::new(|| css("audio"));
static TRACK: Lazy<Selector> = Lazy::new(|| css("track"));

/// Detects uncaptioned video and media that autoplays with sound and no controls.
pub struct MediaAnalyzer;

impl MediaAnalyzer {
    fn check_autoplay(&self, element: &ElementRef, kind: &str, issues: &mut Vec<Issue>) {
        let autoplays = dom::has_attr(element, "autoplay");
        if autoplays && !dom::has_attr(element, "muted") && !dom::has_attr(element, "controls") {
            issues.push(Issue::new(
                self.name(),
                "AUTOPLAY_NO_CONTROLS",
                format!(
                    "{} autoplays with sound but has no controls. \
                     Users cannot pause or mute the {}.",
                    kind,
                    kind.to_lowercase()
                ),
                dom::snippet(element, CONTEXT_LIMIT),
            ));
        }
    }
}

impl Analyzer for MediaAnalyzer {
    fn name(&self) -> &str {
        "media"
    }

    fn description(&self) -> &str {
        "Detect media accessibility issues (missing captions, transcripts)"
    }

    fn analyze(&self, document: &Html) -> Result<Vec<Issue>, AnalyzerError> {
        let mut issues = Vec::new();

        for video in document.select(&VIDEO) {
            let captioned = video.select(&TRACK).any(|track| {
                matches!(track.value().attr("kind"), Some("captions") | Some("subtitles"))
            });
            if !captioned {
                issues.push(Issue::new(
                    self.name(),
                    "VIDEO_NO_CAPTIONS",
                    "Video element is missing captions. \
                     Add <track kind='captions'> for deaf/hard-of-hearing users.",
                    dom::snippet(&video, CONTEXT_LIMIT),
                ));
            }
            self.check_autoplay(&video, "Video", &mut issues);
        }

        for audio in document.select(&AUDIO) {
            self.check_autoplay(&audio, "Audio", &mut issues);
        }

        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(html: &str) -> Vec<String> {
        MediaAnalyzer
            .analyze_html(html)
            .unwrap()
            .into_iter()
            .map(|i| i.code)
            .collect()
    }

    #[test]
    fn test_video_without_captions() {
        assert_eq!(codes(r#"<video src="a.mp4" controls></video>"#), vec!["VIDEO_NO_CAPTIONS"]);
    }

    #[test]
    fn test_captioned_video() {
        let html = r#"<video controls><track kind="subtitles" src="a.vtt"></video>"#;
        assert!(codes(html).is_empty());
    }

    #[test]
    fn test_autoplay_rules() {
        let html = r#"<video autoplay><track kind="captions"></video>"#;
        assert_eq!(codes(html), vec!["AUTOPLAY_NO_CONTROLS"]);
        assert!(codes(r#"<audio autoplay muted></audio>"#).is_empty());
        assert!(codes(r#"<audio autoplay controls></audio>"#).is_empty());
        assert_eq!(codes(r#"<audio autoplay></audio>"#), vec!["AUTOPLAY_NO_CONTROLS"]);
    }
}
