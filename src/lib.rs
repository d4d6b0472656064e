// src/lib.rs
// =============================================================================
// a11y-guardian: crawl a website and check every page for accessibility
// problems.
//
// Modules:
// - analyzers: the twelve built-in rule checkers, their registry and the
//              automatic fixes for missing alt texts and low contrast
// - crawl:     polite concurrent crawler (robots.txt, sitemap, rate limits)
// - severity:  severity tiers and WCAG references for issue codes
// - store:     optional SQLite persistence of results
// - config:    config file + environment overrides
// - logging:   tracing-subscriber setup
// - error:     typed errors
//
// The functions below are the high-level entry points used by the binary.
// =============================================================================

pub mod analyzers;
pub mod config;
pub mod crawl;
pub mod error;
pub mod logging;
pub mod severity;
pub mod store;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use tracing::warn;
use url::Url;

pub use analyzers::{apply_fixes, Analyzer, AnalyzerRegistry, AppliedFix, FixedPage, Issue};
pub use config::Config;
pub use crawl::{CrawlResult, ProgressCallback, ScanOptions, SiteScanner};
pub use error::{AnalyzerError, ConfigError, FetchError, ScanError, StoreError};
pub use severity::{EnrichedIssue, Severity};

use crawl::{fetch_with_retry, site_key, HttpFetcher};
use store::{ScanStore, SqliteStore};

// Crawls a whole site with the built-in analyzers
//
// Parameters:
//   start_url: first page; only pages on the same host and port are visited
//   options:   crawl limits, politeness settings, exclusions, database path
//   progress:  optional callback after each fetched page
//
// Returns: URL -> issues for every visited page
pub async fn scan_site(
    start_url: &str,
    options: ScanOptions,
    progress: Option<ProgressCallback>,
) -> Result<CrawlResult, ScanError> {
    let fetcher = HttpFetcher::new(&options.user_agent, options.timeout)?;
    let store = options.db_path.as_deref().and_then(open_store);
    let registry = Arc::new(AnalyzerRegistry::with_builtin());

    let mut scanner = SiteScanner::new(Arc::new(fetcher), registry, options);
    if let Some(store) = store {
        scanner = scanner.with_store(store);
    }
    if let Some(progress) = progress {
        scanner = scanner.with_progress(progress);
    }
    scanner.scan(start_url).await
}

// Fetches and analyzes a single page without crawling.
pub async fn scan_page(url: &str, options: &ScanOptions) -> Result<Vec<Issue>, ScanError> {
    let (parsed, body) = fetch_page(url, options).await?;
    let issues = scan_html(&body, &options.exclude);

    if let Some(store) = options.db_path.as_deref().and_then(open_store) {
        if let Err(err) = store.save(&site_key(&parsed), url, &issues) {
            warn!(url, error = %err, "failed to save scan result");
        }
    }
    Ok(issues)
}

// Fetches a page and repairs missing alt texts and low-contrast colors
//
// Returns: the fixed markup and the list of changes; nothing is written
pub async fn fix_page(url: &str, options: &ScanOptions) -> Result<FixedPage, ScanError> {
    let (_, body) = fetch_page(url, options).await?;
    Ok(apply_fixes(&body))
}

/// Reads a local HTML file and repairs what can be repaired.
pub fn fix_file(path: &Path) -> Result<FixedPage, ScanError> {
    Ok(apply_fixes(&read_html(path)?))
}

/// Analyzes a local HTML file.
pub fn scan_file(path: &Path, exclude: &[String]) -> Result<Vec<Issue>, ScanError> {
    Ok(scan_html(&read_html(path)?, exclude))
}

/// Runs the built-in analyzers on raw markup.
pub fn scan_html(html: &str, exclude: &[String]) -> Vec<Issue> {
    AnalyzerRegistry::with_builtin().analyze_all(html, exclude)
}

/// Name -> description of every built-in analyzer
pub fn list_analyzers() -> BTreeMap<String, String> {
    AnalyzerRegistry::with_builtin().descriptions()
}

// One page over HTTP(S), with the crawler's retry policy
async fn fetch_page(url: &str, options: &ScanOptions) -> Result<(Url, String), ScanError> {
    let parsed = Url::parse(url).map_err(|source| ScanError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ScanError::UnsupportedScheme(url.to_string()));
    }

    let fetcher = HttpFetcher::new(&options.user_agent, options.timeout)?;
    let body = fetch_with_retry(&fetcher, url, &options.retry)
        .await
        .map_err(|source| ScanError::Fetch {
            url: url.to_string(),
            source,
        })?;
    Ok((parsed, body))
}

fn read_html(path: &Path) -> Result<String, ScanError> {
    std::fs::read_to_string(path).map_err(|source| ScanError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// Persistence is best effort: an unusable database is logged and skipped.
fn open_store(path: &Path) -> Option<Arc<dyn ScanStore>> {
    match SqliteStore::open(path) {
        Ok(store) => Some(Arc::new(store)),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "results will not be saved");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_list_analyzers() {
        let analyzers = list_analyzers();
        assert_eq!(analyzers.len(), 12);
        assert!(analyzers.contains_key("contrast"));
        assert!(analyzers.values().all(|d| !d.is_empty()));
    }

    #[test]
    fn test_scan_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("page.html");
        std::fs::write(
            &file,
            r#"<html lang="en"><head><title>T</title></head><body><main><h1>Hi</h1><img src="a.png"></main></body></html>"#,
        )
        .unwrap();

        let issues = scan_file(&file, &[]).unwrap();
        let codes: Vec<&str> = issues.iter().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, vec!["IMG_MISSING_ALT"]);

        assert!(matches!(
            scan_file(&dir.path().join("missing.html"), &[]),
            Err(ScanError::Io { .. })
        ));
    }

    #[tokio::test]
    async fn test_scan_page_and_persist() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body><img src=x></body></html>"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("scans.db");
        let options = ScanOptions {
            db_path: Some(db.clone()),
            exclude: vec!["document_structure".to_string()],
            ..ScanOptions::default()
        };

        let url = format!("{}/", server.uri());
        let issues = scan_page(&url, &options).await.unwrap();
        let codes: Vec<&str> = issues.iter().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, vec!["IMG_MISSING_ALT", "MISSING_LANG"]);

        let saved = SqliteStore::open(&db).unwrap().results(None).unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].issues, issues);
    }

    #[tokio::test]
    async fn test_scan_page_permanent_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let options = ScanOptions {
            timeout: Duration::from_secs(5),
            ..ScanOptions::default()
        };
        let err = scan_page(&format!("{}/nope", server.uri()), &options)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ScanError::Fetch { source: FetchError::Status(404), .. }
        ));
    }

    #[tokio::test]
    async fn test_page_and_site_scans_share_a_site_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body><p>hi</p></body></html>"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("scans.db");
        let options = ScanOptions {
            db_path: Some(db.clone()),
            max_pages: 5,
            poll_interval: Duration::from_millis(50),
            ..ScanOptions::default()
        };
        let url = format!("{}/", server.uri());
        scan_page(&url, &options).await.unwrap();
        scan_site(&url, options, None).await.unwrap();

        // the mock server listens on a non-default port
        let key = site_key(&Url::parse(&url).unwrap());
        assert!(key.contains(':'));
        let saved = SqliteStore::open(&db).unwrap().results(Some(&key)).unwrap();
        assert_eq!(saved.len(), 2);
    }

    #[tokio::test]
    async fn test_fix_page_over_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<html><body><img src="/img/logo.png"><p style="color:#777;background:#fff">x</p></body></html>"#,
            ))
            .mount(&server)
            .await;

        let fixed = fix_page(&format!("{}/", server.uri()), &ScanOptions::default())
            .await
            .unwrap();
        let codes: Vec<&str> = fixed.fixes.iter().map(|f| f.code.as_str()).collect();
        assert_eq!(codes, vec!["IMG_MISSING_ALT", "LOW_CONTRAST"]);
        assert!(fixed.html.contains(r#"alt="logo""#));
    }

    #[test]
    fn test_fix_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("page.html");
        std::fs::write(&file, r#"<img src="logo.png">"#).unwrap();

        let fixed = fix_file(&file).unwrap();
        assert_eq!(fixed.fixes.len(), 1);
        assert!(scan_html(&fixed.html, &[]).iter().all(|i| i.code != "IMG_MISSING_ALT"));
        assert!(matches!(fix_file(&dir.path().join("nope.html")), Err(ScanError::Io { .. })));
    }

    #[tokio::test]
    async fn test_scan_site_against_local_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"<html lang="en"><body><a href="/next">next</a></body></html>"#),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/next"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body></body></html>"))
            .mount(&server)
            .await;

        let options = ScanOptions {
            max_pages: 10,
            concurrency: 2,
            poll_interval: Duration::from_millis(50),
            ..ScanOptions::default()
        };
        let result = scan_site(&format!("{}/", server.uri()), options, None)
            .await
            .unwrap();
        assert_eq!(result.page_count(), 2);
        assert!(result.pages.contains_key(&format!("{}/next", server.uri())));
    }
}
