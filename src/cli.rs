// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// Every scan setting is an Option here: None means "not given on the
// command line", so the config file / environment value is kept.
// =============================================================================

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

// This struct represents our entire CLI application
#[derive(Parser, Debug)]
#[command(
    name = "a11y-guardian",
    version,
    about = "A CLI tool to scan web pages and whole websites for accessibility issues",
    long_about = "a11y-guardian crawls a website politely (robots.txt, rate limits) and checks every \
                  page against a set of WCAG-based rules. It exits with code 1 when issues are \
                  found, which makes it easy to use in CI/CD pipelines."
)]
pub struct Cli {
    /// Path to a YAML or JSON config file
    ///
    /// Without this flag, ./a11y-guardian.yaml and ~/.a11y-guardian/config.yaml
    /// (and their variants) are tried
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Show debug logs on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

// This enum defines our subcommands (page, site, analyzers)
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a single page (a URL, or a local HTML file with --file)
    ///
    /// Example: a11y-guardian page https://example.com/contact
    Page {
        /// URL of the page, or a path when --file is set
        target: String,

        /// Treat TARGET as a local HTML file
        #[arg(long)]
        file: bool,

        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        fix: FixArgs,

        /// Analyzers to skip (comma separated)
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<String>,

        /// Per-request timeout in seconds
        #[arg(long)]
        timeout: Option<f64>,

        /// Save the result into this SQLite database
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// Crawl a website and scan every page on the same host
    ///
    /// Example: a11y-guardian site https://example.com --max-pages 50 --rate-limit 2
    Site {
        /// Website URL to start crawling from
        website_url: String,

        #[command(flatten)]
        output: OutputArgs,

        #[command(flatten)]
        crawl: CrawlArgs,

        #[command(flatten)]
        fix: FixArgs,

        /// Analyzers to skip (comma separated)
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<String>,

        /// Save every page's result into this SQLite database
        #[arg(long)]
        db: Option<PathBuf>,
    },

    /// List the available analyzers
    Analyzers {
        /// Output the list as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Default)]
pub struct OutputArgs {
    /// Output results in JSON format instead of a table
    #[arg(long)]
    pub json: bool,

    /// Write the report to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub struct FixArgs {
    /// Repair missing alt texts and low-contrast inline colors
    #[arg(long)]
    pub apply_fixes: bool,

    /// Write each fixed page into this directory
    /// (otherwise the start of the fixed HTML is shown in the report)
    #[arg(long, requires = "apply_fixes")]
    pub outdir: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub struct CrawlArgs {
    /// Maximum number of pages to visit
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Number of concurrent workers
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Seconds to wait after each page (robots.txt Crawl-delay wins if larger)
    #[arg(long)]
    pub delay: Option<f64>,

    /// Maximum requests per second across all workers (0 = unlimited)
    #[arg(long)]
    pub rate_limit: Option<f64>,

    /// Slow down on errors and speed up while the server is healthy
    #[arg(long)]
    pub adaptive: bool,

    /// Ignore robots.txt
    #[arg(long)]
    pub no_robots: bool,

    /// Per-request timeout in seconds
    #[arg(long)]
    pub timeout: Option<f64>,
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What does #[command(flatten)] do?
//    - It pulls the fields of another struct (OutputArgs, CrawlArgs) into
//      this subcommand, so shared flags are declared once
//
// 2. Why Option<usize> instead of a default value?
//    - A default would always override the config file
//    - None lets main.rs tell "not given" apart from "given"
//
// 3. What is value_delimiter = ','?
//    - `--exclude contrast,aria` becomes vec!["contrast", "aria"]
//    - The flag can also be repeated: `--exclude contrast --exclude aria`
//
// 4. What does global = true mean?
//    - The flag can be written before or after the subcommand
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_site_command() {
        let cli = Cli::parse_from([
            "a11y-guardian",
            "site",
            "https://example.com",
            "--max-pages",
            "5",
            "--exclude",
            "contrast,aria",
            "--adaptive",
            "--json",
            "-v",
        ]);
        assert!(cli.verbose);
        match cli.command {
            Commands::Site {
                website_url,
                output,
                crawl,
                exclude,
                ..
            } => {
                assert_eq!(website_url, "https://example.com");
                assert!(output.json);
                assert_eq!(crawl.max_pages, Some(5));
                assert_eq!(crawl.concurrency, None);
                assert!(crawl.adaptive);
                assert_eq!(exclude, vec!["contrast", "aria"]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_fix_flags() {
        let cli = Cli::parse_from([
            "a11y-guardian",
            "page",
            "https://example.com",
            "--apply-fixes",
            "--outdir",
            "fixed",
        ]);
        match cli.command {
            Commands::Page { fix, .. } => {
                assert!(fix.apply_fixes);
                assert_eq!(fix.outdir, Some(PathBuf::from("fixed")));
            }
            other => panic!("unexpected command {:?}", other),
        }

        let cli = Cli::parse_from(["a11y-guardian", "site", "https://example.com", "--apply-fixes"]);
        assert!(matches!(cli.command, Commands::Site { fix: FixArgs { apply_fixes: true, outdir: None }, .. }));
    }

    #[test]
    fn test_outdir_requires_apply_fixes() {
        let parsed = Cli::try_parse_from(["a11y-guardian", "page", "x.html", "--outdir", "out"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_parse_page_file() {
        let cli = Cli::parse_from(["a11y-guardian", "page", "index.html", "--file"]);
        assert!(matches!(cli.command, Commands::Page { file: true, .. }));
    }
}
