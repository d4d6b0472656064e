// src/error.rs
// =============================================================================
// Error types for the library.
//
// The binary uses anyhow (any error + context), but the library reports
// typed errors so callers can tell the cases apart:
// - ScanError:     a scan could not start at all (bad URL, HTTP client, config)
// - FetchError:    one page could not be downloaded (transient or permanent)
// - AnalyzerError: one analyzer failed on one page
// - StoreError:    persisting or reading scan results failed
// - ConfigError:   a config file or environment variable was unusable
//
// Only ScanError ever aborts a scan. Everything else is logged and turned
// into "no issues for this page / analyzer".
// =============================================================================

use std::path::PathBuf;

use thiserror::Error;

/// Errors that prevent a scan from starting
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported URL '{0}': only http and https can be scanned")]
    UnsupportedScheme(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to fetch {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors returned by a PageFetcher
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("failed to read response body: {0}")]
    Read(String),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("{0}")]
    Other(String),
}

impl FetchError {
    // Decides whether another attempt could succeed.
    //
    // Transient: timeouts, connection and read failures, 429 and 5xx.
    // Permanent: every other HTTP status and anything unclassified.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Timeout | FetchError::Connect(_) | FetchError::Read(_) => true,
            FetchError::Status(code) => *code == 429 || *code >= 500,
            FetchError::Other(_) => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::Connect(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else if err.is_body() || err.is_decode() || err.is_request() {
            FetchError::Read(err.to_string())
        } else {
            FetchError::Other(err.to_string())
        }
    }
}

/// Errors produced by a single analyzer on a single page
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalyzerError {
    #[error("analyzer '{analyzer}' failed: {reason}")]
    Failed { analyzer: String, reason: String },

    #[error("analyzer '{analyzer}' panicked: {reason}")]
    Panicked { analyzer: String, reason: String },
}

/// Errors from the scan result store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("failed to create directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("failed to encode issues: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Errors loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported config format '{0}' (expected .yaml, .yml or .json)")]
    UnsupportedFormat(PathBuf),

    #[error("invalid value '{value}' for {var}")]
    InvalidEnv { var: String, value: String },

    #[error("{field} = {value} is out of range ({expected})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        expected: &'static str,
    },
}
