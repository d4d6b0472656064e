// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Load the config file + environment overrides, then apply CLI flags
// 3. Dispatch to the appropriate subcommand handler
// 4. With --apply-fixes, repair what can be repaired and record it
// 5. Print the report and exit with a proper code
//    (0 = no issues, 1 = accessibility issues found, 2 = error)
// =============================================================================

// Module declarations for the binary-only parts
mod cli;    // src/cli.rs - command-line parsing
mod report; // src/report.rs - pretty / JSON output

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser; // Parser trait enables the parse() method

use a11y_guardian::config::{Config, OutputFormat};
use a11y_guardian::crawl::MIN_REQUESTS_PER_SECOND;
use a11y_guardian::logging::init_logging;
use a11y_guardian::analyzers::{fixed_file_name, is_fixable};
use a11y_guardian::{
    fix_file, fix_page, list_analyzers, scan_file, scan_page, scan_site, Issue, ProgressCallback,
    ScanOptions,
};
use cli::{Cli, Commands, CrawlArgs, FixArgs, OutputArgs};
use report::{PageFixes, Report};

// How much of a fixed page goes into the report when it is not written out
const FIXED_SNIPPET_CHARS: usize = 2000;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // {:#} prints the whole context chain on one line
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// This is the main application logic
// Returns:
//   Ok(0) = no issues
//   Ok(1) = issues found
//   Err   = unexpected error (exit code 2)
async fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    match cli.command {
        Commands::Page {
            target,
            file,
            output,
            fix,
            exclude,
            timeout,
            db,
        } => {
            let mut options = config.scan_options();
            options.exclude.extend(exclude);
            if let Some(secs) = timeout {
                options.timeout = seconds("--timeout", secs)?;
            }
            if db.is_some() {
                options.db_path = db;
            }
            handle_page_scan(&target, file, &options, &config, &output, &fix).await
        }
        Commands::Site {
            website_url,
            output,
            crawl,
            fix,
            exclude,
            db,
        } => {
            let mut options = config.scan_options();
            apply_crawl_args(&mut options, &crawl)?;
            options.exclude.extend(exclude);
            if db.is_some() {
                options.db_path = db;
            }
            handle_site_scan(&website_url, options, &config, &output, &fix).await
        }
        Commands::Analyzers { json } => handle_list_analyzers(json),
    }
}

// Handles the 'page' subcommand
async fn handle_page_scan(
    target: &str,
    is_file: bool,
    options: &ScanOptions,
    config: &Config,
    output: &OutputArgs,
    fix: &FixArgs,
) -> Result<i32> {
    let json = wants_json(output, config);
    if !json {
        eprintln!("🔍 Scanning page: {}", target);
    }

    let issues = if is_file {
        scan_file(Path::new(target), &options.exclude)?
    } else {
        scan_page(target, options).await?
    };

    let pages = BTreeMap::from([(target.to_string(), issues)]);
    let mut report = Report::new(target, &pages);
    if fix.apply_fixes {
        let fixes = fix_pages(&pages, is_file, options, fix.outdir.as_deref()).await?;
        report = report.with_fixes(fixes);
    }
    emit(&report, json, output, config)
}

// Handles the 'site' subcommand
async fn handle_site_scan(
    website_url: &str,
    options: ScanOptions,
    config: &Config,
    output: &OutputArgs,
    fix: &FixArgs,
) -> Result<i32> {
    let json = wants_json(output, config);

    // Progress lines go to stderr so stdout stays clean for the report
    let progress: Option<ProgressCallback> = if json {
        None
    } else {
        eprintln!("🔍 Scanning website: {}", website_url);
        eprintln!(
            "📊 Max pages: {}, concurrency: {}",
            options.max_pages, options.concurrency
        );
        Some(Arc::new(|scanned: usize, found: usize, url: &str| {
            eprintln!("  Scanned [{}/{}]: {}", scanned, found, url);
        }))
    };

    // The scan consumes the options; fixing re-fetches pages with the same settings
    let fetch_options = options.clone();
    let result = scan_site(website_url, options, progress).await?;

    if !json {
        eprintln!("📄 Scanned {} page(s)\n", result.page_count());
    }

    let mut report = Report::new(&result.start_url, &result.pages);
    if fix.apply_fixes {
        let fixes = fix_pages(&result.pages, false, &fetch_options, fix.outdir.as_deref()).await?;
        report = report.with_fixes(fixes);
    }
    emit(&report, json, output, config)
}

// Handles the 'analyzers' subcommand
fn handle_list_analyzers(json: bool) -> Result<i32> {
    let analyzers = list_analyzers();
    if json {
        println!("{}", serde_json::to_string_pretty(&analyzers)?);
    } else {
        println!("{:<20} {}", "ANALYZER", "DESCRIPTION");
        println!("{}", "=".repeat(80));
        for (name, description) in &analyzers {
            println!("{:<20} {}", name, description);
        }
    }
    Ok(0)
}

// Repairs every page that has at least one fixable issue
//
// Parameters:
//   pages:   scan results; pages without a fixable issue are skipped
//   is_file: the keys are local paths rather than URLs
//   outdir:  write fixed pages here; otherwise keep a snippet in the report
//
// Returns: url -> what was fixed. A page that cannot be re-read gets an
// error entry; failing to write into outdir aborts.
async fn fix_pages(
    pages: &BTreeMap<String, Vec<Issue>>,
    is_file: bool,
    options: &ScanOptions,
    outdir: Option<&Path>,
) -> Result<BTreeMap<String, PageFixes>> {
    if let Some(dir) = outdir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    let mut fixes = BTreeMap::new();
    for (target, issues) in pages {
        if !is_fixable(issues.iter().map(|i| i.code.as_str())) {
            continue;
        }

        let fixed = if is_file {
            fix_file(Path::new(target))
        } else {
            fix_page(target, options).await
        };

        let entry = match fixed {
            Ok(page) => {
                let mut entry = PageFixes {
                    applied: page.fixes,
                    ..PageFixes::default()
                };
                match outdir {
                    Some(dir) => {
                        let path = dir.join(fixed_file_name(target));
                        std::fs::write(&path, &page.html)
                            .with_context(|| format!("failed to write {}", path.display()))?;
                        entry.written_to = Some(path);
                    }
                    None => {
                        entry.html_snippet =
                            Some(page.html.chars().take(FIXED_SNIPPET_CHARS).collect());
                    }
                }
                entry
            }
            Err(err) => PageFixes {
                error: Some(err.to_string()),
                ..PageFixes::default()
            },
        };
        fixes.insert(target.clone(), entry);
    }
    Ok(fixes)
}

// CLI flags override whatever the config file and environment said
fn apply_crawl_args(options: &mut ScanOptions, crawl: &CrawlArgs) -> Result<()> {
    if let Some(max_pages) = crawl.max_pages {
        options.max_pages = max_pages;
    }
    if let Some(concurrency) = crawl.concurrency {
        options.concurrency = concurrency.max(1);
    }
    if let Some(delay) = crawl.delay {
        options.delay = if delay == 0.0 {
            Duration::ZERO
        } else {
            seconds("--delay", delay)?
        };
    }
    if let Some(rate_limit) = crawl.rate_limit {
        anyhow::ensure!(
            rate_limit == 0.0 || (rate_limit.is_finite() && rate_limit >= MIN_REQUESTS_PER_SECOND),
            "--rate-limit must be 0 (unlimited) or at least one request per hour"
        );
        options.rate_limit = rate_limit;
    }
    if let Some(timeout) = crawl.timeout {
        options.timeout = seconds("--timeout", timeout)?;
    }
    if crawl.adaptive {
        options.adaptive_rate = true;
    }
    if crawl.no_robots {
        options.respect_robots = false;
    }
    Ok(())
}

fn seconds(flag: &str, value: f64) -> Result<Duration> {
    anyhow::ensure!(value > 0.0, "{} must be a positive number of seconds", flag);
    Duration::try_from_secs_f64(value)
        .with_context(|| format!("{} of {} seconds is too large", flag, value))
}

fn wants_json(output: &OutputArgs, config: &Config) -> bool {
    output.json || config.output.format == OutputFormat::Json
}

// Prints (or writes) the report and picks the exit code
fn emit(report: &Report, json: bool, output: &OutputArgs, config: &Config) -> Result<i32> {
    let rendered = if json {
        report.to_json()?
    } else {
        report.to_pretty()
    };

    match output.output.as_ref().or(config.output.path.as_ref()) {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("failed to write report to {}", path.display()))?;
            eprintln!("📝 Report written to {}", path.display());
        }
        None => println!("{}", rendered),
    }

    if report.has_issues() {
        Ok(1) // Exit code 1 = issues found
    } else {
        Ok(0) // Exit code 0 = all good
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_rejects_unrepresentable_values() {
        assert_eq!(seconds("--timeout", 2.5).unwrap(), Duration::from_millis(2500));
        assert!(seconds("--timeout", 1e30).is_err());
        assert!(seconds("--timeout", f64::INFINITY).is_err());
        assert!(seconds("--timeout", f64::NAN).is_err());
        assert!(seconds("--timeout", 0.0).is_err());
    }

    #[test]
    fn test_crawl_args_out_of_range() {
        let mut options = ScanOptions::default();
        let tiny_rate = CrawlArgs {
            rate_limit: Some(1e-20),
            ..CrawlArgs::default()
        };
        assert!(apply_crawl_args(&mut options, &tiny_rate).is_err());

        let huge_delay = CrawlArgs {
            delay: Some(1e30),
            ..CrawlArgs::default()
        };
        assert!(apply_crawl_args(&mut options, &huge_delay).is_err());

        let fine = CrawlArgs {
            rate_limit: Some(0.5),
            delay: Some(0.0),
            ..CrawlArgs::default()
        };
        apply_crawl_args(&mut options, &fine).unwrap();
        assert_eq!(options.rate_limit, 0.5);
        assert_eq!(options.delay, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_fix_pages_writes_fixed_files() {
        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("index.html");
        let clean = dir.path().join("clean.html");
        std::fs::write(&page, r#"<img src="logo.png">"#).unwrap();
        std::fs::write(&clean, "<p>ok</p>").unwrap();

        let page_key = page.to_string_lossy().to_string();
        let pages = BTreeMap::from([
            (
                page_key.clone(),
                vec![Issue::new("alt_text", "IMG_MISSING_ALT", "no alt", "")],
            ),
            (clean.to_string_lossy().to_string(), vec![]),
        ]);

        let outdir = dir.path().join("fixed");
        let fixes = fix_pages(&pages, true, &ScanOptions::default(), Some(&outdir))
            .await
            .unwrap();

        assert_eq!(fixes.len(), 1);
        let entry = &fixes[&page_key];
        assert_eq!(entry.applied.len(), 1);
        let written = entry.written_to.as_ref().unwrap();
        assert!(written.starts_with(&outdir));
        assert!(std::fs::read_to_string(written).unwrap().contains(r#"alt="logo""#));
    }

    #[tokio::test]
    async fn test_fix_pages_keeps_snippet_or_error() {
        let dir = tempfile::tempdir().unwrap();
        let page = dir.path().join("page.html");
        std::fs::write(&page, r#"<p style="color:#777;background:#fff">x</p>"#).unwrap();
        let missing = dir.path().join("gone.html");

        let contrast = vec![Issue::new("contrast", "LOW_CONTRAST", "low", "")];
        let pages = BTreeMap::from([
            (page.to_string_lossy().to_string(), contrast.clone()),
            (missing.to_string_lossy().to_string(), contrast),
        ]);
        let fixes = fix_pages(&pages, true, &ScanOptions::default(), None)
            .await
            .unwrap();

        let fixed = &fixes[&page.to_string_lossy().to_string()];
        assert!(fixed.html_snippet.as_ref().unwrap().contains("color: #000000"));
        let failed = &fixes[&missing.to_string_lossy().to_string()];
        assert!(failed.error.is_some());
        assert!(failed.applied.is_empty());
    }
}
