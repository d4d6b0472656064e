// src/config.rs
// =============================================================================
// Configuration file + environment overrides.
//
// Precedence (highest first):
//   1. command-line flags (applied by main.rs)
//   2. A11Y_GUARDIAN_* environment variables
//   3. the config file (--config, or the first discovered one)
//   4. built-in defaults
//
// Example a11y-guardian.yaml:
//
//   scan:
//     concurrency: 4
//     max_pages: 50
//     rate_limit: 2.0
//   analyzers:
//     exclude: [contrast]
//   output:
//     format: json
//   database:
//     path: scans.db
// =============================================================================

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::crawl::{ScanOptions, DEFAULT_USER_AGENT, MIN_REQUESTS_PER_SECOND};
use crate::error::ConfigError;

/// Files looked for in the working directory, in order
const LOCAL_CONFIG_FILES: &[&str] = &[
    "a11y-guardian.yaml",
    "a11y-guardian.yml",
    ".a11y-guardian.yaml",
    ".a11y-guardian.yml",
];

/// Files looked for under $HOME/.a11y-guardian/, in order
const HOME_CONFIG_FILES: &[&str] = &["config.yaml", "config.yml"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanConfig,
    pub analyzers: AnalyzerConfig,
    pub output: OutputConfig,
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub concurrency: usize,
    pub max_pages: usize,
    /// Seconds to pause after each page
    pub delay: f64,
    /// Requests per second, 0 = unlimited
    pub rate_limit: f64,
    pub adaptive_rate: bool,
    /// Per-request timeout in seconds
    pub timeout: f64,
    pub respect_robots: bool,
    pub user_agent: Option<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            concurrency: 10,
            max_pages: 200,
            delay: 0.0,
            rate_limit: 0.0,
            adaptive_rate: false,
            timeout: 10.0,
            respect_robots: true,
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Analyzer names to skip
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Write the report here instead of stdout
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file that receives one row per scanned page
    pub path: Option<PathBuf>,
}

impl Config {
    // Reads a config file; the format follows the extension.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("yaml") | Some("yml") => {
                serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
                    path: path.to_path_buf(),
                    source,
                })
            }
            Some("json") => serde_json::from_str(&text).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            }),
            _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
        }
    }

    /// First existing file among the standard locations.
    pub fn discover() -> Option<PathBuf> {
        let home = std::env::var_os("HOME").map(PathBuf::from);
        discover_in(Path::new("."), home.as_deref())
    }

    // Loads the effective configuration
    //
    // Parameters:
    //   explicit: a --config path; when None the standard locations are searched
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit.map(Path::to_path_buf).or_else(Self::discover) {
            Some(path) => {
                debug!(path = %path.display(), "loading config file");
                Self::from_file(&path)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    // Rejects timing values the crawler cannot turn into a Duration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let scan = &self.scan;
        if !(scan.delay >= 0.0 && Duration::try_from_secs_f64(scan.delay).is_ok()) {
            return Err(out_of_range("scan.delay", scan.delay, "0 or more seconds"));
        }
        if !(scan.timeout > 0.0 && Duration::try_from_secs_f64(scan.timeout).is_ok()) {
            return Err(out_of_range("scan.timeout", scan.timeout, "a positive number of seconds"));
        }
        let rate = scan.rate_limit;
        if !(rate == 0.0 || (rate.is_finite() && rate >= MIN_REQUESTS_PER_SECOND)) {
            return Err(out_of_range(
                "scan.rate_limit",
                rate,
                "0 or at least one request per hour",
            ));
        }
        Ok(())
    }

    /// Applies A11Y_GUARDIAN_* overrides using `lookup` to read variables.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(v) = parse_var(&lookup, "A11Y_GUARDIAN_CONCURRENCY")? {
            self.scan.concurrency = v;
        }
        if let Some(v) = parse_var(&lookup, "A11Y_GUARDIAN_MAX_PAGES")? {
            self.scan.max_pages = v;
        }
        if let Some(v) = parse_var(&lookup, "A11Y_GUARDIAN_DELAY")? {
            self.scan.delay = v;
        }
        if let Some(v) = parse_var(&lookup, "A11Y_GUARDIAN_RATE_LIMIT")? {
            self.scan.rate_limit = v;
        }
        if let Some(v) = lookup("A11Y_GUARDIAN_DB_PATH").filter(|v| !v.is_empty()) {
            self.database.path = Some(PathBuf::from(v));
        }
        Ok(())
    }

    /// Crawler options derived from this configuration
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            max_pages: self.scan.max_pages,
            concurrency: self.scan.concurrency.max(1),
            delay: seconds(self.scan.delay).unwrap_or(Duration::ZERO),
            rate_limit: self.scan.rate_limit.max(0.0),
            adaptive_rate: self.scan.adaptive_rate,
            exclude: self.analyzers.exclude.clone(),
            respect_robots: self.scan.respect_robots,
            user_agent: self
                .scan
                .user_agent
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            timeout: seconds(self.scan.timeout).unwrap_or(Duration::from_secs(10)),
            db_path: self.database.path.clone(),
            ..ScanOptions::default()
        }
    }
}

fn discover_in(dir: &Path, home: Option<&Path>) -> Option<PathBuf> {
    let local = LOCAL_CONFIG_FILES.iter().map(|name| dir.join(name));
    let global = home
        .into_iter()
        .flat_map(|h| HOME_CONFIG_FILES.iter().map(move |name| h.join(".a11y-guardian").join(name)));
    local.chain(global).find(|p| p.is_file())
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv {
                var: var.to_string(),
                value,
            }),
    }
}

fn out_of_range(field: &'static str, value: f64, expected: &'static str) -> ConfigError {
    ConfigError::OutOfRange {
        field,
        value,
        expected,
    }
}

// Positive seconds that fit in a Duration only
fn seconds(value: f64) -> Option<Duration> {
    if value > 0.0 {
        Duration::try_from_secs_f64(value).ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let options = Config::default().scan_options();
        assert_eq!(options.concurrency, 10);
        assert_eq!(options.max_pages, 200);
        assert_eq!(options.delay, Duration::ZERO);
        assert_eq!(options.timeout, Duration::from_secs(10));
        assert!(options.respect_robots);
        assert_eq!(options.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn test_yaml_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "a11y-guardian.yaml",
            "scan:\n  concurrency: 4\n  delay: 0.5\nanalyzers:\n  exclude: [contrast]\noutput:\n  format: json\n",
        );
        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.scan.concurrency, 4);
        assert_eq!(config.scan.max_pages, 200);
        assert_eq!(config.analyzers.exclude, vec!["contrast"]);
        assert_eq!(config.output.format, OutputFormat::Json);
        assert_eq!(config.scan_options().delay, Duration::from_millis(500));
    }

    #[test]
    fn test_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "config.json",
            r#"{"scan": {"respect_robots": false}, "database": {"path": "out/scans.db"}}"#,
        );
        let config = Config::from_file(&path).unwrap();
        assert!(!config.scan.respect_robots);
        assert_eq!(config.database.path, Some(PathBuf::from("out/scans.db")));
    }

    #[test]
    fn test_unsupported_and_invalid_files() {
        let dir = tempfile::tempdir().unwrap();
        let toml = write_file(dir.path(), "config.toml", "x = 1");
        assert!(matches!(
            Config::from_file(&toml),
            Err(ConfigError::UnsupportedFormat(_))
        ));
        let bad = write_file(dir.path(), "bad.yaml", "scan: [not, a, map]");
        assert!(matches!(Config::from_file(&bad), Err(ConfigError::Yaml { .. })));
        assert!(matches!(
            Config::from_file(&dir.path().join("missing.yaml")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("A11Y_GUARDIAN_CONCURRENCY", "3"),
            ("A11Y_GUARDIAN_RATE_LIMIT", "1.5"),
            ("A11Y_GUARDIAN_DB_PATH", "/tmp/a11y.db"),
        ]);
        let mut config = Config::default();
        config
            .apply_overrides(|var| env.get(var).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.scan.concurrency, 3);
        assert_eq!(config.scan.rate_limit, 1.5);
        assert_eq!(config.scan.max_pages, 200);
        assert_eq!(config.database.path, Some(PathBuf::from("/tmp/a11y.db")));
    }

    #[test]
    fn test_invalid_env_value() {
        let mut config = Config::default();
        let err = config
            .apply_overrides(|var| (var == "A11Y_GUARDIAN_MAX_PAGES").then(|| "lots".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { ref var, .. } if var == "A11Y_GUARDIAN_MAX_PAGES"));
    }

    #[test]
    fn test_out_of_range_values_are_rejected() {
        for (var, value, field) in [
            ("A11Y_GUARDIAN_RATE_LIMIT", "1e-20", "scan.rate_limit"),
            ("A11Y_GUARDIAN_RATE_LIMIT", "-1", "scan.rate_limit"),
            ("A11Y_GUARDIAN_RATE_LIMIT", "inf", "scan.rate_limit"),
            ("A11Y_GUARDIAN_DELAY", "1e30", "scan.delay"),
            ("A11Y_GUARDIAN_DELAY", "NaN", "scan.delay"),
        ] {
            let mut config = Config::default();
            config
                .apply_overrides(|name| (name == var).then(|| value.to_string()))
                .unwrap();
            let err = config.validate().unwrap_err();
            assert!(
                matches!(err, ConfigError::OutOfRange { field: f, .. } if f == field),
                "{}={} gave {:?}",
                var,
                value,
                err
            );
        }

        let mut config = Config::default();
        config.scan.timeout = 1e30;
        assert!(config.validate().is_err());
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_load_rejects_huge_timeout_in_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "a11y-guardian.yaml", "scan:\n  timeout: 1.0e30\n");
        assert!(matches!(
            Config::load(Some(&path)),
            Err(ConfigError::OutOfRange { field: "scan.timeout", .. })
        ));
    }

    #[test]
    fn test_scan_options_never_panic_on_unvalidated_values() {
        let mut config = Config::default();
        config.scan.delay = 1e30;
        config.scan.timeout = f64::INFINITY;
        let options = config.scan_options();
        assert_eq!(options.delay, Duration::ZERO);
        assert_eq!(options.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_discovery_order() {
        let dir = tempfile::tempdir().unwrap();
        let home = tempfile::tempdir().unwrap();
        assert_eq!(discover_in(dir.path(), Some(home.path())), None);

        std::fs::create_dir_all(home.path().join(".a11y-guardian")).unwrap();
        let global = write_file(&home.path().join(".a11y-guardian"), "config.yml", "{}");
        assert_eq!(discover_in(dir.path(), Some(home.path())), Some(global));

        let hidden = write_file(dir.path(), ".a11y-guardian.yaml", "{}");
        assert_eq!(discover_in(dir.path(), Some(home.path())), Some(hidden));

        let visible = write_file(dir.path(), "a11y-guardian.yml", "{}");
        assert_eq!(discover_in(dir.path(), Some(home.path())), Some(visible));
    }
}
