//! Command-line interface definitions.
//!
//! Every option can also come from an environment variable or the YAML
//! config file passed with `--config`; command-line values win.

use clap::Parser;

/// Command-line arguments for a scrape run.
///
/// # Examples
///
/// ```sh
/// # Scrape the default index page into ./reports
/// news_name_scrape -o ./reports
///
/// # Target another site without code changes
/// news_name_scrape --url https://example.org/news \
///     --link-selector ".story-list" --text-selector "article p"
///
/// # Fail instead of downloading the tagging model
/// news_name_scrape --offline --model-dir /opt/models/perceptron
/// ```
#[derive(Parser, Debug, Default)]
#[command(author, version, about)]
pub struct Cli {
    /// Index page whose article links are followed
    #[arg(short, long, env = "SCRAPE_URL")]
    pub url: Option<String>,

    /// Selector for the containers holding article links
    #[arg(long, env = "SCRAPE_LINK_SELECTOR")]
    pub link_selector: Option<String>,

    /// Selector for the text elements inside each article
    #[arg(long, env = "SCRAPE_TEXT_SELECTOR")]
    pub text_selector: Option<String>,

    /// Directory the CSV report is written to
    #[arg(short, long, env = "SCRAPE_OUTPUT_DIR")]
    pub output_dir: Option<String>,

    /// Report file name (defaults to `MMDDYYYY_SITE_Scrape.csv`)
    #[arg(long)]
    pub output_file: Option<String>,

    /// Optional path to a YAML config file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Append log lines to this file as well as stderr
    #[arg(long, env = "SCRAPE_LOG_FILE")]
    pub log_file: Option<String>,

    /// Directory holding the perceptron tagger model
    #[arg(long, env = "SCRAPE_MODEL_DIR")]
    pub model_dir: Option<String>,

    /// Where to download the tagger model zip when it is missing
    #[arg(long, env = "SCRAPE_MODEL_URL")]
    pub model_url: Option<String>,

    /// Never download the tagger model; fail if it is missing
    #[arg(long)]
    pub offline: bool,

    /// User-Agent header sent with every request
    #[arg(long, env = "SCRAPE_USER_AGENT")]
    pub user_agent: Option<String>,

    /// TCP connect timeout in seconds (client default when unset)
    #[arg(long)]
    pub connect_timeout_secs: Option<u64>,
}
