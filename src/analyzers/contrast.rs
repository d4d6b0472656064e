// src/analyzers/contrast.rs
// =============================================================================
// Checks the text/background contrast of inline styles against WCAG AA.
//
// Only the element's own `style` attribute is inspected (no stylesheet
// cascade). An element is checked when it declares both `color` and
// `background-color` (or the `background` shorthand starting with a color).
//
// Supported color syntaxes:
// - named colors (a common subset: white, black, red, ...)
// - #rgb and #rrggbb
// - rgb() / rgba()  (alpha is ignored)
// - hsl() / hsla()  (alpha is ignored)
// =============================================================================

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use super::dom::{self, css, CONTEXT_LIMIT};
use super::{Analyzer, AnalyzerError, Issue};

/// Minimum contrast ratio for normal text at WCAG level AA
pub const WCAG_AA_THRESHOLD: f64 = 4.5;

static STYLED: Lazy<Selector> = Lazy::new(|| css("[style]"));
static HEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#([0-9a-f]{3,6})").expect("static regex"));
static RGB: Lazy<Regex> = Lazy::new(|| Regex::new(r"^rgba?\(([^)]+)\)").expect("static regex"));
static HSL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^hsla?\(([^)]+)\)").expect("static regex"));

const NAMED_COLORS: &[(&str, Rgb)] = &[
    ("white", Rgb(255, 255, 255)),
    ("black", Rgb(0, 0, 0)),
    ("red", Rgb(255, 0, 0)),
    ("green", Rgb(0, 128, 0)),
    ("blue", Rgb(0, 0, 255)),
    ("yellow", Rgb(255, 255, 0)),
    ("cyan", Rgb(0, 255, 255)),
    ("magenta", Rgb(255, 0, 255)),
    ("gray", Rgb(128, 128, 128)),
    ("grey", Rgb(128, 128, 128)),
    ("silver", Rgb(192, 192, 192)),
    ("maroon", Rgb(128, 0, 0)),
    ("olive", Rgb(128, 128, 0)),
    ("lime", Rgb(0, 255, 0)),
    ("aqua", Rgb(0, 255, 255)),
    ("teal", Rgb(0, 128, 128)),
    ("navy", Rgb(0, 0, 128)),
    ("fuchsia", Rgb(255, 0, 255)),
    ("purple", Rgb(128, 0, 128)),
    ("orange", Rgb(255, 165, 0)),
    ("pink", Rgb(255, 192, 203)),
];

/// An sRGB color with 8-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Lowercase `#rrggbb` form.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }

    /// WCAG relative luminance in [0, 1].
    pub fn relative_luminance(self) -> f64 {
        fn channel(c: u8) -> f64 {
            let s = f64::from(c) / 255.0;
            if s <= 0.03928 {
                s / 12.92
            } else {
                ((s + 0.055) / 1.055).powf(2.4)
            }
        }
        0.2126 * channel(self.0) + 0.7152 * channel(self.1) + 0.0722 * channel(self.2)
    }
}

/// WCAG contrast ratio between two colors, in [1, 21]. Symmetric.
pub fn contrast_ratio(a: Rgb, b: Rgb) -> f64 {
    let (la, lb) = (a.relative_luminance(), b.relative_luminance());
    let (lighter, darker) = if la >= lb { (la, lb) } else { (lb, la) };
    (lighter + 0.05) / (darker + 0.05)
}

/// Black or white, whichever reads better on `background`.
///
/// Black wins whenever it meets the AA threshold; otherwise white is used.
pub fn recommend_foreground(background: Rgb) -> Rgb {
    let black = Rgb(0, 0, 0);
    if contrast_ratio(black, background) >= WCAG_AA_THRESHOLD {
        black
    } else {
        Rgb(255, 255, 255)
    }
}

// Parses a CSS color value.
//
// Returns None for anything we cannot resolve (currentColor, gradients,
// var(), malformed values). Unresolvable colors are simply not checked.
pub fn parse_color(value: &str) -> Option<Rgb> {
    let v = value.trim().to_ascii_lowercase();
    if v.is_empty() {
        return None;
    }

    if let Some((_, rgb)) = NAMED_COLORS.iter().find(|(name, _)| *name == v) {
        return Some(*rgb);
    }

    if let Some(caps) = HEX.captures(&v) {
        return parse_hex(&caps[1]);
    }

    if let Some(caps) = RGB.captures(&v) {
        return parse_rgb_args(&caps[1]);
    }

    if let Some(caps) = HSL.captures(&v) {
        return parse_hsl_args(&caps[1]);
    }

    None
}

fn parse_hex(digits: &str) -> Option<Rgb> {
    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => digits.to_string(),
        _ => return None,
    };
    let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok();
    Some(Rgb(channel(0)?, channel(2)?, channel(4)?))
}

fn parse_rgb_args(args: &str) -> Option<Rgb> {
    let channels: Vec<u8> = args
        .split(',')
        .take(3)
        .map(|part| {
            let number = part.trim().split('%').next().unwrap_or("").trim();
            number.parse::<i64>().ok().map(|n| n.clamp(0, 255) as u8)
        })
        .collect::<Option<_>>()?;

    match channels.as_slice() {
        [r, g, b] => Some(Rgb(*r, *g, *b)),
        _ => None,
    }
}

fn parse_hsl_args(args: &str) -> Option<Rgb> {
    let parts: Vec<f64> = args
        .split(',')
        .take(3)
        .map(|p| p.trim().trim_end_matches('%').trim().parse::<f64>().ok())
        .collect::<Option<_>>()?;
    let [h, s, l] = parts.as_slice() else {
        return None;
    };
    let (h, s, l) = (h / 360.0, s / 100.0, l / 100.0);

    if s == 0.0 {
        let grey = to_byte(l);
        return Some(Rgb(grey, grey, grey));
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    Some(Rgb(
        to_byte(hue_to_rgb(p, q, h + 1.0 / 3.0)),
        to_byte(hue_to_rgb(p, q, h)),
        to_byte(hue_to_rgb(p, q, h - 1.0 / 3.0)),
    ))
}

fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

fn to_byte(unit: f64) -> u8 {
    (unit * 255.0).clamp(0.0, 255.0) as u8
}

// Pulls the foreground and background colors out of an inline style.
pub(crate) fn style_colors(style: &str) -> (Option<Rgb>, Option<Rgb>) {
    let mut color = None;
    let mut background = None;

    for declaration in style.split(';') {
        let Some((property, value)) = declaration.split_once(':') else {
            continue;
        };
        match property.trim().to_ascii_lowercase().as_str() {
            "color" => color = parse_color(value),
            "background-color" | "background" => background = parse_color(value),
            _ => {}
        }
    }

    (color, background)
}

/// Flags inline styles whose text/background contrast is below 4.5:1.
pub struct ContrastAnalyzer;

impl Analyzer for ContrastAnalyzer {
    fn name(&self) -> &str {
        "contrast"
    }

    fn description(&self) -> &str {
        "Detect low contrast in inline style colors"
    }

    fn analyze(&self, document: &Html) -> Result<Vec<Issue>, AnalyzerError> {
        let mut issues = Vec::new();

        for element in document.select(&STYLED) {
            let style = element.value().attr("style").unwrap_or_default();
            let (Some(fg), Some(bg)) = style_colors(style) else {
                continue;
            };

            let ratio = contrast_ratio(fg, bg);
            if ratio < WCAG_AA_THRESHOLD {
                issues.push(Issue::new(
                    self.name(),
                    "LOW_CONTRAST",
                    format!(
                        "Low contrast ratio ({:.2}:1): text may be hard to read. \
                         WCAG AA requires at least {}:1.",
                        ratio, WCAG_AA_THRESHOLD
                    ),
                    dom::snippet(&element, CONTEXT_LIMIT),
                ));
            }
        }

        Ok(issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(value: &str) -> Rgb {
        parse_color(value).unwrap()
    }

    #[test]
    fn test_black_on_white_is_21() {
        let ratio = contrast_ratio(hex("#000000"), hex("#ffffff"));
        assert!((ratio - 21.0).abs() < 1e-9);
    }

    #[test]
    fn test_ratio_is_symmetric_and_self_is_one() {
        let pairs = [("#777777", "#ffffff"), ("navy", "#abc"), ("rgb(10,200,30)", "hsl(200, 50%, 40%)")];
        for (a, b) in pairs {
            let (a, b) = (hex(a), hex(b));
            assert!((contrast_ratio(a, b) - contrast_ratio(b, a)).abs() < 1e-12);
            assert!((contrast_ratio(a, a) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_parse_color_formats() {
        assert_eq!(parse_color("#FFF"), Some(Rgb(255, 255, 255)));
        assert_eq!(parse_color(" #336699 "), Some(Rgb(0x33, 0x66, 0x99)));
        assert_eq!(parse_color("White"), Some(Rgb(255, 255, 255)));
        assert_eq!(parse_color("rgba(255, 0, 0, 0.5)"), Some(Rgb(255, 0, 0)));
        assert_eq!(parse_color("hsl(0, 0%, 100%)"), Some(Rgb(255, 255, 255)));
        assert_eq!(parse_color("hsl(120, 100%, 25%)"), Some(Rgb(0, 127, 0)));
        assert_eq!(parse_color("#abcd"), None);
        assert_eq!(parse_color("currentColor"), None);
        assert_eq!(parse_color(""), None);
    }

    #[test]
    fn test_low_contrast_flagged() {
        let html = r#"<p style="color: #777777; background-color: #ffffff">text</p>"#;
        let issues = ContrastAnalyzer.analyze_html(html).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].code, "LOW_CONTRAST");
        assert!(issues[0].message.contains("4.48:1"));
    }

    #[test]
    fn test_recommend_foreground() {
        assert_eq!(recommend_foreground(hex("#ffffff")), Rgb(0, 0, 0));
        assert_eq!(recommend_foreground(hex("navy")), Rgb(255, 255, 255));
        assert_eq!(recommend_foreground(hex("#777777")), Rgb(0, 0, 0));
    }

    #[test]
    fn test_good_contrast_and_partial_styles_pass() {
        let html = r#"
            <p style="color:#000;background:#fff">ok</p>
            <p style="color:#777">no background</p>
            <p style="background-color: url(x.png)">no color</p>
        "#;
        assert!(ContrastAnalyzer.analyze_html(html).unwrap().is_empty());
    }
}
