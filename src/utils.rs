//! Utility functions for logging, report naming, and file system checks.
//!
//! - String truncation for log previews
//! - Site tags and date-stamped report file names
//! - Elapsed-time formatting for the end-of-run summary
//! - Output directory validation

use chrono::NaiveDate;
use std::error::Error;
use std::fs as stdfs;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes (on a character boundary)
/// with an ellipsis and the number of dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Short uppercase label for the site being scraped, used in report names.
///
/// The leading `www.` is ignored and the first remaining host label is used,
/// so `www.cbsa-asfc.gc.ca` becomes `CBSA-ASFC`.
pub fn site_tag(url: &Url) -> String {
    url.host_str()
        .map(|host| host.trim_start_matches("www."))
        .and_then(|host| host.split('.').find(|label| !label.is_empty()))
        .map(str::to_uppercase)
        .unwrap_or_else(|| "SITE".to_string())
}

/// `MMDDYYYY_SITE_Scrape.csv`
pub fn report_file_name(date: NaiveDate, site: &str) -> String {
    format!("{}_{}_Scrape.csv", date.format("%m%d%Y"), site)
}

/// Render an elapsed duration as `12.345s`.
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{}.{:03}s", elapsed.as_secs(), elapsed.subsec_millis())
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then creates and removes a probe file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let probe_path = path.join("..__probe_write__");
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
