//! Run configuration.
//!
//! Values are resolved in order of precedence: command line / environment,
//! then the optional YAML file, then built-in defaults targeting the CBSA
//! media page. Selectors are compiled here so a bad expression stops the
//! run before any request is made.

use crate::cli::Cli;
use crate::error::{Result, ScrapeError};
use crate::scrapers::DEFAULT_USER_AGENT;
use crate::text::model::{DEFAULT_MODEL_DIR, DEFAULT_MODEL_URL};
use crate::utils::{report_file_name, site_tag};
use chrono::NaiveDate;
use scraper::Selector;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::instrument;
use url::Url;

pub const DEFAULT_STARTING_URL: &str = "http://www.cbsa-asfc.gc.ca/media/menu-eng.html";
pub const DEFAULT_LINK_CONTAINER_SELECTOR: &str = ".widget-content";
pub const DEFAULT_ARTICLE_TEXT_SELECTOR: &str = "p";

/// Shape of the optional YAML config file. Every key is optional.
///
/// ```yaml
/// starting_url: https://example.org/news
/// link_container_selector: .story-list
/// article_text_selector: article p
/// output_dir: ./reports
/// offline: true
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub starting_url: Option<String>,
    pub link_container_selector: Option<String>,
    pub article_text_selector: Option<String>,
    pub output_dir: Option<String>,
    pub output_file: Option<String>,
    pub log_file: Option<String>,
    pub model_dir: Option<String>,
    pub model_url: Option<String>,
    pub offline: Option<bool>,
    pub user_agent: Option<String>,
    pub connect_timeout_secs: Option<u64>,
}

/// Read and parse a YAML config file.
#[instrument(level = "info")]
pub fn load_config_file(path: &str) -> Result<FileConfig> {
    let raw = std::fs::read_to_string(path).map_err(|e| ScrapeError::Config {
        message: format!("could not read config file {path}: {e}"),
    })?;
    Ok(serde_yaml::from_str(&raw)?)
}

/// A selector expression together with its compiled form.
#[derive(Debug, Clone)]
pub struct CompiledSelector {
    pub expression: String,
    pub selector: Selector,
}

/// Compile a selector expression, reporting the expression on failure.
pub fn compile_selector(expression: &str) -> Result<CompiledSelector> {
    let selector = Selector::parse(expression).map_err(|e| ScrapeError::Selector {
        selector: expression.to_string(),
        reason: e.to_string(),
    })?;
    Ok(CompiledSelector {
        expression: expression.to_string(),
        selector,
    })
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub starting_url: Url,
    pub link_container: CompiledSelector,
    pub article_text: CompiledSelector,
    pub output_dir: PathBuf,
    pub output_file: Option<String>,
    pub log_file: Option<PathBuf>,
    pub model_dir: PathBuf,
    /// `None` when downloading the model is not allowed.
    pub model_url: Option<String>,
    pub user_agent: String,
    pub connect_timeout: Option<Duration>,
}

impl ScrapeConfig {
    /// Merge command-line values over the config file over the defaults.
    pub fn resolve(cli: &Cli, file: FileConfig) -> Result<Self> {
        let starting_url = cli
            .url
            .clone()
            .or(file.starting_url)
            .unwrap_or_else(|| DEFAULT_STARTING_URL.to_string());
        let starting_url = Url::parse(&starting_url)?;
        if !matches!(starting_url.scheme(), "http" | "https") {
            return Err(ScrapeError::Config {
                message: format!("starting URL must be http or https, got {starting_url}"),
            });
        }

        let link_container = compile_selector(
            cli.link_selector
                .as_deref()
                .or(file.link_container_selector.as_deref())
                .unwrap_or(DEFAULT_LINK_CONTAINER_SELECTOR),
        )?;
        let article_text = compile_selector(
            cli.text_selector
                .as_deref()
                .or(file.article_text_selector.as_deref())
                .unwrap_or(DEFAULT_ARTICLE_TEXT_SELECTOR),
        )?;

        let offline = cli.offline || file.offline.unwrap_or(false);
        let model_url = if offline {
            None
        } else {
            Some(
                cli.model_url
                    .clone()
                    .or(file.model_url)
                    .unwrap_or_else(|| DEFAULT_MODEL_URL.to_string()),
            )
        };

        Ok(Self {
            starting_url,
            link_container,
            article_text,
            output_dir: PathBuf::from(
                cli.output_dir
                    .clone()
                    .or(file.output_dir)
                    .unwrap_or_else(|| ".".to_string()),
            ),
            output_file: cli.output_file.clone().or(file.output_file),
            log_file: cli.log_file.clone().or(file.log_file).map(PathBuf::from),
            model_dir: PathBuf::from(
                cli.model_dir
                    .clone()
                    .or(file.model_dir)
                    .unwrap_or_else(|| DEFAULT_MODEL_DIR.to_string()),
            ),
            model_url,
            user_agent: cli
                .user_agent
                .clone()
                .or(file.user_agent)
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            connect_timeout: cli
                .connect_timeout_secs
                .or(file.connect_timeout_secs)
                .map(Duration::from_secs),
        })
    }

    /// Load the config file named on the command line (if any) and resolve.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let file = match cli.config.as_deref() {
            Some(path) => load_config_file(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(cli, file)
    }

    /// Where the report for `date` is written.
    pub fn report_path(&self, date: NaiveDate) -> PathBuf {
        let file_name = self
            .output_file
            .clone()
            .unwrap_or_else(|| report_file_name(date, &site_tag(&self.starting_url)));
        Path::new(&self.output_dir).join(file_name)
    }
}
