// src/crawl/mod.rs
// =============================================================================
// This module handles website crawling.
//
// Features:
// - Concurrent workers sharing one deduplicating frontier
// - Same-site restriction (host + port of the start URL)
// - robots.txt Disallow / Crawl-delay and sitemap.xml seeding
// - Fixed or adaptive rate limiting across all workers
// - Retry with exponential backoff for transient network failures
//
// Submodules:
// - fetch:      PageFetcher trait, reqwest implementation, retry policy
// - frontier:   URL queue + seen set with at-most-once claiming
// - links:      link resolution and same-site checks
// - rate_limit: RateLimiter / AdaptiveRateLimiter
// - robots:     robots.txt parsing and group selection
// - scheduler:  SiteScanner, the crawl session itself
// - sitemap:    <loc> extraction
// =============================================================================

mod fetch;
mod frontier;
mod links;
mod rate_limit;
mod robots;
mod scheduler;
mod sitemap;

pub use fetch::{fetch_with_retry, HttpFetcher, PageFetcher, RetryPolicy, DEFAULT_USER_AGENT};
pub use frontier::{Claim, Frontier};
pub use links::{extract_links, resolve_link, same_site, site_key, strip_fragment};
pub use rate_limit::{
    AdaptiveRateLimiter, RateLimiter, RateLimiterStats, RequestPacer, MAX_INTERVAL,
    MIN_REQUESTS_PER_SECOND, SLOW_RESPONSE_THRESHOLD,
};
pub use robots::{choose_group, is_blocked, parse_robots_txt, RobotsPolicy, RobotsRuleGroup};
pub use scheduler::{CrawlResult, ProgressCallback, ScanOptions, SiteScanner, DEFAULT_ADAPTIVE_RPS};
pub use sitemap::parse_sitemap;

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why a trait for fetching (PageFetcher)?
//    - The crawler does not care where pages come from
//    - Tests use an in-memory website: fast and deterministic
//
// 2. Why Arc everywhere?
//    - Every worker is a separate tokio task
//    - Arc (atomic reference count) lets them share one frontier, one
//      rate limiter and one analyzer registry safely
//
// 3. Why spawn_blocking for analysis?
//    - HTML parsing and the analyzers are CPU work, not I/O
//    - Running them on tokio's blocking pool keeps the async workers free
//      to drive network requests
// -----------------------------------------------------------------------------
