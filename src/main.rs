//! # News Name Scrape
//!
//! Crawls a news index page, follows every article link it finds, strips the
//! markup from each article's paragraphs, and reports the multi-word proper
//! names mentioned in them alongside the article link.
//!
//! ## Usage
//!
//! ```sh
//! news_name_scrape -o ./reports --log-file ./reports/scrape.log
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture:
//! 1. **Setup**: Resolve configuration, check the output directory, make sure
//!    the tagging model is available (fatal if not)
//! 2. **Indexing**: Discover article links inside the index page's containers
//! 3. **Extraction**: Per article, fetch, strip markup, segment, tag, and
//!    group consecutive proper nouns into names (one article at a time; a
//!    failing article is logged and skipped)
//! 4. **Output**: Deduplicate `(name, link)` pairs and write a `Name,Link` CSV

use chrono::Local;
use clap::Parser;
use itertools::Itertools;
use std::error::Error;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing::subscriber::DefaultGuard;
use tracing::{debug, error, info, warn};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod text;
mod utils;

use cli::Cli;
use config::ScrapeConfig;
use outputs::csv::write_report;
use pipeline::Pipeline;
use scrapers::HttpFetcher;
use text::model::ensure_model;
use utils::{ensure_writable_dir, format_elapsed};

/// Install the run's subscriber: stderr always, plus the append-only log
/// file when one is configured. Dropping the guard closes the file.
fn init_tracing(log_file: Option<&Path>) -> Result<DefaultGuard, Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = tfmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(UtcTime::rfc_3339());

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                tfmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false)
                    .with_timer(UtcTime::rfc_3339()),
            )
        }
        None => None,
    };

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer);
    Ok(tracing::subscriber::set_default(subscriber))
}

/// Resolve the configuration and install logging for the run.
///
/// A configuration error is logged to stderr and to the `--log-file` given
/// on the command line before it is returned.
fn start_run(args: &Cli) -> Result<(ScrapeConfig, DefaultGuard), Box<dyn Error>> {
    match ScrapeConfig::from_cli(args) {
        Ok(config) => {
            let guard = init_tracing(config.log_file.as_deref())?;
            Ok((config, guard))
        }
        Err(e) => {
            let _guard = init_tracing(args.log_file.as_deref().map(Path::new))?;
            error!(stage = e.stage(), error = %e, "Invalid configuration");
            Err(e.into())
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    let start_time = std::time::Instant::now();

    let args = Cli::parse();
    let (config, _log_guard) = start_run(&args)?;

    let today = Local::now().date_naive();
    info!(
        "***************************** {} *****************************",
        today.format("%m%d%Y")
    );
    debug!(?config, "Resolved configuration");

    if let Err(e) = ensure_writable_dir(&config.output_dir).await {
        error!(
            path = %config.output_dir.display(),
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let fetcher = HttpFetcher::new(&config.user_agent, config.connect_timeout)?;

    // Tagging is needed for every article, so a missing model stops the run here.
    let tagger = match ensure_model(&fetcher, &config.model_dir, config.model_url.as_deref()).await
    {
        Ok(tagger) => tagger,
        Err(e) => {
            error!(error = %e, "Tagging model unavailable; no articles processed");
            return Err(e.into());
        }
    };

    let report = match Pipeline::new(&fetcher, &tagger, &config).run().await {
        Ok(report) => report,
        Err(e) => {
            error!(stage = e.stage(), error = %e, "Run aborted");
            return Err(e.into());
        }
    };

    if !report.failures.is_empty() {
        let stages = report.failures.iter().map(|f| f.stage).counts();
        warn!(
            failed = report.failures.len(),
            discovered = report.links_discovered,
            ?stages,
            "Report omits articles that failed; see the errors above"
        );
        debug!(
            links = ?report.failures.iter().map(|f| f.url.as_str()).collect::<Vec<_>>(),
            "Failed article links"
        );
    }

    let report_path = config.report_path(today);
    info!(path = %report_path.display(), "Writing to CSV");
    if let Err(e) = write_report(&report_path, &report.rows) {
        error!(path = %report_path.display(), error = %e, "Failed writing CSV report");
        return Err(e.into());
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        rows = report.rows.len(),
        "Program took {} to complete",
        format_elapsed(elapsed)
    );

    Ok(())
}
