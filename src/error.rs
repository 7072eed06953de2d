//! Error taxonomy for a scrape run.
//!
//! Per-article failures ([`ScrapeError::Fetch`], [`ScrapeError::Parse`]) are
//! logged and skipped by the pipeline. [`ScrapeError::ModelUnavailable`] and
//! [`ScrapeError::Selector`] are fatal and surface before any article is
//! processed.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("fetch failed for {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("could not parse document from {url}: {reason}")]
    Parse { url: String, reason: String },

    #[error(
        "tagging model unavailable at {}: {reason}. Run without --offline to download a fresh copy (unloadable files are replaced), or point --model-dir at a directory holding the averaged perceptron *.weights.json, *.tagdict.json and *.classes.json files",
        path.display()
    )]
    ModelUnavailable { path: PathBuf, reason: String },

    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;

impl ScrapeError {
    /// Short stage label used in log fields.
    pub fn stage(&self) -> &'static str {
        match self {
            ScrapeError::Fetch { .. } => "fetch",
            ScrapeError::Parse { .. } => "parse",
            ScrapeError::ModelUnavailable { .. } => "model",
            ScrapeError::Selector { .. } | ScrapeError::Config { .. } | ScrapeError::Yaml(_) => {
                "config"
            }
            ScrapeError::Csv(_) => "report",
            ScrapeError::Io(_) | ScrapeError::Url(_) | ScrapeError::Zip(_) | ScrapeError::Json(_) => {
                "io"
            }
        }
    }
}
