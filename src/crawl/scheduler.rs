// src/crawl/scheduler.rs
// =============================================================================
// SiteScanner: the crawl session.
//
// Init:
//   1. Validate the start URL (http/https only)
//   2. Fetch /robots.txt and /sitemap.xml (failures mean "no rules" / "no seeds")
//   3. Seed the frontier with the start URL plus same-site sitemap URLs
//
// Running:
//   `concurrency` tokio tasks share the frontier, the rate limiter and the
//   results map. Each worker loops:
//     claim URL -> robots check -> semaphore -> rate limiter -> fetch (retry)
//     -> analyze + extract links + persist (one blocking task, one parse)
//     -> enqueue same-site links -> progress -> politeness sleep
//
// Terminal:
//   The frontier reports exhaustion (page cap reached, or nothing queued and
//   nothing in flight). No page failure ever ends the session early.
// =============================================================================

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use scraper::Html;
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

use super::fetch::{fetch_with_retry, PageFetcher, RetryPolicy, DEFAULT_USER_AGENT};
use super::frontier::Frontier;
use super::links::{extract_links, is_crawlable, same_site, site_file, site_key, strip_fragment};
use super::rate_limit::{AdaptiveRateLimiter, RateLimiter, RequestPacer};
use super::robots::RobotsPolicy;
use super::sitemap::parse_sitemap;
use crate::analyzers::{AnalyzerRegistry, Issue};
use crate::error::ScanError;
use crate::store::ScanStore;

/// Called after each fetched page with (pages_scanned, total_found, url).
pub type ProgressCallback = Arc<dyn Fn(usize, usize, &str) + Send + Sync>;

/// Starting rate for the adaptive limiter when no rate limit is configured
pub const DEFAULT_ADAPTIVE_RPS: f64 = 2.0;

/// Knobs for one crawl session
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Upper bound on URLs claimed (fetched or blocked)
    pub max_pages: usize,
    /// Simultaneous in-flight fetches (and worker count)
    pub concurrency: usize,
    /// Minimum sleep after each page; robots Crawl-delay wins if larger
    pub delay: Duration,
    /// Requests per second across all workers, 0 = unlimited
    pub rate_limit: f64,
    /// Let the rate adapt to errors and slow responses
    pub adaptive_rate: bool,
    pub adaptive_min_rps: f64,
    pub adaptive_max_rps: f64,
    /// Analyzer names to skip
    pub exclude: Vec<String>,
    pub respect_robots: bool,
    pub user_agent: String,
    /// Per-request timeout
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// How long an idle worker sleeps between frontier checks
    pub poll_interval: Duration,
    /// Persist every page into this SQLite database
    pub db_path: Option<PathBuf>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_pages: 200,
            concurrency: 10,
            delay: Duration::ZERO,
            rate_limit: 0.0,
            adaptive_rate: false,
            adaptive_min_rps: 0.1,
            adaptive_max_rps: 10.0,
            exclude: Vec::new(),
            respect_robots: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
            poll_interval: Duration::from_secs(2),
            db_path: None,
        }
    }
}

/// Issues found on every visited page, keyed by URL
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlResult {
    pub start_url: String,
    pub pages: BTreeMap<String, Vec<Issue>>,
}

impl CrawlResult {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn issue_count(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    pub fn issues(&self, url: &str) -> Option<&[Issue]> {
        self.pages.get(url).map(Vec::as_slice)
    }
}

/// Crawls one site and runs the analyzers on every page.
pub struct SiteScanner {
    fetcher: Arc<dyn PageFetcher>,
    registry: Arc<AnalyzerRegistry>,
    options: ScanOptions,
    store: Option<Arc<dyn ScanStore>>,
    progress: Option<ProgressCallback>,
}

// Everything the workers share
struct Session {
    start: Url,
    site: String,
    fetcher: Arc<dyn PageFetcher>,
    registry: Arc<AnalyzerRegistry>,
    store: Option<Arc<dyn ScanStore>>,
    progress: Option<ProgressCallback>,
    options: ScanOptions,
    robots: RobotsPolicy,
    pacer: Option<Arc<dyn RequestPacer>>,
    frontier: Frontier,
    permits: Semaphore,
    results: Mutex<BTreeMap<String, Vec<Issue>>>,
}

impl SiteScanner {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        registry: Arc<AnalyzerRegistry>,
        options: ScanOptions,
    ) -> Self {
        Self {
            fetcher,
            registry,
            options,
            store: None,
            progress: None,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn ScanStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    // Runs a full crawl session starting at `start_url`
    //
    // Returns: Err only when the start URL itself is unusable
    pub async fn scan(&self, start_url: &str) -> Result<CrawlResult, ScanError> {
        let start = Url::parse(start_url).map_err(|source| ScanError::InvalidUrl {
            url: start_url.to_string(),
            source,
        })?;
        if !is_crawlable(&start) || start.host_str().is_none() {
            return Err(ScanError::UnsupportedScheme(start_url.to_string()));
        }
        let start = strip_fragment(start);
        let site = site_key(&start);

        info!(site = %site, "fetching robots.txt and sitemap.xml");
        let robots = self.load_robots(&start).await;
        let seeds = self.load_sitemap(&start).await;
        info!(
            sitemap_urls = seeds.len(),
            disallow_rules = robots.disallow.len(),
            "crawl initialised"
        );

        let frontier = Frontier::new(self.options.max_pages);
        frontier.push(start.to_string());
        for seed in seeds {
            frontier.push(seed.to_string());
        }

        let concurrency = self.options.concurrency.max(1);
        let session = Arc::new(Session {
            start: start.clone(),
            site,
            fetcher: Arc::clone(&self.fetcher),
            registry: Arc::clone(&self.registry),
            store: self.store.clone(),
            progress: self.progress.clone(),
            options: self.options.clone(),
            robots,
            pacer: build_pacer(&self.options),
            frontier,
            permits: Semaphore::new(concurrency),
            results: Mutex::new(BTreeMap::new()),
        });

        info!(workers = concurrency, max_pages = self.options.max_pages, "starting workers");
        let workers: Vec<_> = (0..concurrency)
            .map(|id| tokio::spawn(run_worker(Arc::clone(&session), id)))
            .collect();

        for outcome in futures::future::join_all(workers).await {
            if let Err(err) = outcome {
                warn!(error = %err, "crawl worker ended abnormally");
            }
        }

        let pages = std::mem::take(&mut *session.results.lock());
        info!(pages = pages.len(), "scan complete");
        Ok(CrawlResult {
            start_url: start.to_string(),
            pages,
        })
    }

    async fn load_robots(&self, start: &Url) -> RobotsPolicy {
        if !self.options.respect_robots {
            return RobotsPolicy::permissive();
        }
        let Some(robots_url) = site_file(start, "robots.txt") else {
            return RobotsPolicy::permissive();
        };
        match fetch_with_retry(self.fetcher.as_ref(), robots_url.as_str(), &self.options.retry).await {
            Ok(text) => RobotsPolicy::from_robots_txt(&text, &self.options.user_agent),
            Err(err) => {
                debug!(url = %robots_url, error = %err, "no usable robots.txt");
                RobotsPolicy::permissive()
            }
        }
    }

    async fn load_sitemap(&self, start: &Url) -> Vec<Url> {
        let Some(sitemap_url) = site_file(start, "sitemap.xml") else {
            return Vec::new();
        };
        match fetch_with_retry(self.fetcher.as_ref(), sitemap_url.as_str(), &self.options.retry).await {
            Ok(xml) => parse_sitemap(&xml)
                .iter()
                .filter_map(|loc| Url::parse(loc).ok())
                .filter(|url| is_crawlable(url) && same_site(start, url))
                .map(strip_fragment)
                .collect(),
            Err(err) => {
                debug!(url = %sitemap_url, error = %err, "no usable sitemap.xml");
                Vec::new()
            }
        }
    }
}

fn build_pacer(options: &ScanOptions) -> Option<Arc<dyn RequestPacer>> {
    if options.adaptive_rate {
        let initial = if options.rate_limit > 0.0 {
            options.rate_limit
        } else {
            DEFAULT_ADAPTIVE_RPS
        };
        Some(Arc::new(AdaptiveRateLimiter::new(
            initial,
            options.adaptive_min_rps,
            options.adaptive_max_rps,
        )))
    } else if options.rate_limit > 0.0 {
        Some(Arc::new(RateLimiter::new(options.rate_limit)))
    } else {
        None
    }
}

async fn run_worker(session: Arc<Session>, id: usize) {
    debug!(worker = id, "worker started");
    while let Some(claim) = session.frontier.next(session.options.poll_interval).await {
        session.visit(claim.url()).await;
    }
    debug!(worker = id, "worker retired");
}

impl Session {
    async fn visit(&self, url: &str) {
        let page_url = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(url, error = %err, "skipping unparseable URL");
                self.record(url, Vec::new());
                return;
            }
        };

        let path = match page_url.path() {
            "" => "/",
            p => p,
        };
        if !self.robots.is_allowed(path) {
            debug!(url, "blocked by robots.txt");
            self.record(url, Vec::new());
            return;
        }

        let Ok(_permit) = self.permits.acquire().await else {
            return;
        };

        if let Some(pacer) = &self.pacer {
            pacer.acquire().await;
        }

        let started = Instant::now();
        let fetched = fetch_with_retry(self.fetcher.as_ref(), url, &self.options.retry).await;
        let elapsed = started.elapsed();

        match fetched {
            Ok(body) => {
                if let Some(pacer) = &self.pacer {
                    pacer.record_success(elapsed);
                }
                let (issues, links) = self.analyze(page_url, body).await;
                debug!(url, issues = issues.len(), ?elapsed, "page scanned");
                self.record(url, issues);

                for link in links {
                    if same_site(&self.start, &link) {
                        self.frontier.push(link.into());
                    }
                }
            }
            Err(err) => {
                if let Some(pacer) = &self.pacer {
                    pacer.record_error();
                }
                warn!(url, error = %err, "failed to fetch page");
                self.record(url, Vec::new());
            }
        }

        if let Some(progress) = &self.progress {
            progress(self.frontier.seen_count(), self.frontier.total_found(), url);
        }

        let pause = self.robots.crawl_delay.max(self.options.delay);
        if !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
    }

    // Parses the page once on the blocking pool and uses that parse for the
    // analyzers, link discovery and persistence (scraper's Html is not Send).
    async fn analyze(&self, page_url: Url, body: String) -> (Vec<Issue>, Vec<Url>) {
        let registry = Arc::clone(&self.registry);
        let store = self.store.clone();
        let exclude = self.options.exclude.clone();
        let site = self.site.clone();

        let job = tokio::task::spawn_blocking(move || {
            let document = Html::parse_document(&body);
            let issues = registry.analyze_document(&document, &exclude);
            let links = extract_links(&document, &page_url);

            if let Some(store) = store {
                if let Err(err) = store.save(&site, page_url.as_str(), &issues) {
                    warn!(url = %page_url, error = %err, "failed to save scan result");
                }
            }
            (issues, links)
        });

        match job.await {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!(error = %err, "page analysis aborted");
                (Vec::new(), Vec::new())
            }
        }
    }

    // Each URL is claimed once, so each key is written by exactly one worker.
    fn record(&self, url: &str, issues: Vec<Issue>) {
        self.results.lock().insert(url.to_string(), issues);
    }
}
