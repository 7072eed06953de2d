//! The scrape run: index -> per-article extraction -> dedup.
//!
//! Articles are processed one at a time, in isolation. A fetch or parse
//! failure is logged once with its URL and stage and the run moves on to
//! the next link; only failures before the first article (index page) abort
//! the run.

use crate::config::ScrapeConfig;
use crate::error::Result;
use crate::models::{Link, NameCandidate, ReportRow};
use crate::scrapers::Fetcher;
use crate::scrapers::article::{extract_text, fetch_article};
use crate::scrapers::index::index_articles;
use crate::text::dedup::dedup_candidates;
use crate::text::names::extract_candidates;
use crate::text::tagger::Tagger;
use futures::stream::{self, StreamExt};
use tracing::{error, info, instrument};

/// An article that contributed nothing because of an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleFailure {
    pub url: Link,
    pub stage: &'static str,
}

/// Outcome of one run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub links_discovered: usize,
    pub articles_processed: usize,
    pub failures: Vec<ArticleFailure>,
    /// Deduplicated rows in first-seen order.
    pub rows: Vec<ReportRow>,
}

/// Borrowed collaborators for a run.
pub struct Pipeline<'a, F, T> {
    fetcher: &'a F,
    tagger: &'a T,
    config: &'a ScrapeConfig,
}

impl<'a, F, T> Pipeline<'a, F, T>
where
    F: Fetcher,
    T: Tagger,
{
    pub fn new(fetcher: &'a F, tagger: &'a T, config: &'a ScrapeConfig) -> Self {
        Self {
            fetcher,
            tagger,
            config,
        }
    }

    /// Name candidates from a single article.
    async fn process_article(&self, link: &Link) -> Result<Vec<NameCandidate>> {
        info!("Gathering Names from: {link}");
        let article = fetch_article(self.fetcher, link).await?;
        let text = extract_text(&article, &self.config.article_text.selector);
        Ok(extract_candidates(&text, &article.url, self.tagger))
    }

    /// Run the whole crawl and return the deduplicated rows.
    ///
    /// # Errors
    ///
    /// Only when the index page itself cannot be fetched or decoded.
    #[instrument(level = "info", skip_all, fields(url = %self.config.starting_url))]
    pub async fn run(&self) -> Result<RunReport> {
        info!(
            link_selector = %self.config.link_container.expression,
            text_selector = %self.config.article_text.expression,
            "Scraping URL: {}",
            self.config.starting_url
        );
        let links = index_articles(
            self.fetcher,
            &self.config.starting_url,
            &self.config.link_container.selector,
        )
        .await?;

        info!(links = links.len(), "Extracting Names");
        let mut report = RunReport {
            links_discovered: links.len(),
            ..RunReport::default()
        };

        // Sequential: one article in flight at a time.
        let outcomes: Vec<std::result::Result<Vec<NameCandidate>, ArticleFailure>> =
            stream::iter(links)
                .then(|link| async move {
                    let outcome = self.process_article(&link).await;
                    match outcome {
                        Ok(found) => Ok(found),
                        Err(e) => {
                            error!(url = %link, stage = e.stage(), error = %e, "Article failed; skipping");
                            Err(ArticleFailure {
                                url: link,
                                stage: e.stage(),
                            })
                        }
                    }
                })
                .collect()
                .await;

        let mut candidates = Vec::new();
        for outcome in outcomes {
            match outcome {
                Ok(found) => {
                    report.articles_processed += 1;
                    candidates.extend(found);
                }
                Err(failure) => report.failures.push(failure),
            }
        }

        info!(candidates = candidates.len(), "Removing Duplicates");
        report.rows = dedup_candidates(candidates)
            .into_iter()
            .map(ReportRow::from)
            .collect();
        info!(
            rows = report.rows.len(),
            processed = report.articles_processed,
            failed = report.failures.len(),
            "Run finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::config::FileConfig;
    use crate::error::ScrapeError;
    use crate::scrapers::HttpFetcher;
    use crate::text::tagger::PerceptronTagger;
    use httpmock::prelude::*;
    use std::collections::HashMap;
    use std::io;
    use std::sync::{Arc, Mutex};

    /// Collects formatted log output for assertions.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn test_tagger() -> PerceptronTagger {
        let tagdict: HashMap<String, String> = [
            ("John", "NNP"),
            ("Smith", "NNP"),
            ("Jane", "NNP"),
            ("Doe", "NNP"),
            ("Fort", "NNP"),
            ("Erie", "NNP"),
            ("Ottawa", "NNP"),
            ("Pat", "NNP"),
            ("Lee", "NNP"),
            ("visited", "VBD"),
            ("met", "VBD"),
            ("in", "IN"),
            (".", "."),
        ]
        .iter()
        .map(|(w, t)| (w.to_string(), t.to_string()))
        .collect();
        PerceptronTagger::from_parts(
            HashMap::new(),
            tagdict,
            vec!["NN".into(), "NNP".into(), "VBD".into(), ".".into()],
        )
    }

    fn config_for(server: &MockServer) -> ScrapeConfig {
        let cli = Cli {
            url: Some(server.url("/media/menu-eng.html")),
            ..Cli::default()
        };
        ScrapeConfig::resolve(&cli, FileConfig::default()).unwrap()
    }

    fn index_page(paths: &[&str]) -> String {
        let items: String = paths
            .iter()
            .map(|p| format!(r#"<div class="widget-content"><a href="{p}">story</a></div>"#))
            .collect();
        format!("<html><body>{items}<div class=\"widget-content\">no link</div></body></html>")
    }

    fn article_page(paragraphs: &[&str]) -> String {
        let body: String = paragraphs.iter().map(|p| format!("<p>{p}</p>")).collect();
        format!("<html><body><h1>Ignored Headline</h1>{body}</body></html>")
    }

    #[tokio::test]
    async fn test_failed_article_is_skipped_and_logged_once() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/media/menu-eng.html");
            then.status(200)
                .body(index_page(&["/news/1.html", "/news/2.html", "/news/3.html"]));
        });
        server.mock(|when, then| {
            when.method(GET).path("/news/1.html");
            then.status(200)
                .body(article_page(&["John Smith visited Ottawa. ", "Jane Doe met John Smith."]));
        });
        server.mock(|when, then| {
            when.method(GET).path("/news/2.html");
            then.status(500);
        });
        server.mock(|when, then| {
            when.method(GET).path("/news/3.html");
            then.status(200).body(article_page(&["Pat Lee visited Fort Erie."]));
        });

        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let config = config_for(&server);
        let fetcher = HttpFetcher::new("test-agent", None).unwrap();
        let tagger = test_tagger();
        let report = Pipeline::new(&fetcher, &tagger, &config).run().await.unwrap();

        let link1 = server.url("/news/1.html");
        let link2 = server.url("/news/2.html");
        let link3 = server.url("/news/3.html");

        assert_eq!(report.links_discovered, 3);
        assert_eq!(report.articles_processed, 2);
        assert_eq!(
            report.failures,
            vec![ArticleFailure {
                url: link2.clone(),
                stage: "fetch"
            }]
        );
        assert_eq!(
            report.rows,
            vec![
                ReportRow::from(NameCandidate::new("John Smith", link1.as_str())),
                ReportRow::from(NameCandidate::new("Jane Doe", link1.as_str())),
                ReportRow::from(NameCandidate::new("Pat Lee", link3.as_str())),
                ReportRow::from(NameCandidate::new("Fort Erie", link3.as_str())),
            ]
        );

        let output = logs.contents();
        let failure_lines = output
            .lines()
            .filter(|line| line.contains("ERROR") && line.contains(&link2))
            .count();
        assert_eq!(failure_lines, 1, "log output:\n{output}");
        // The failure is reported before the next article is started.
        let failed_at = output
            .find("Article failed; skipping")
            .unwrap();
        let next_at = output
            .find(&format!("Gathering Names from: {link3}"))
            .unwrap();
        assert!(failed_at < next_at, "log output:\n{output}");
        assert!(output.contains("Scraping URL: "));
        assert!(output.contains(&format!("Gathering Names from: {link1}")));
        assert!(output.contains("Removing Duplicates"));
    }

    #[tokio::test]
    async fn test_duplicate_names_across_articles_are_kept_per_link() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/media/menu-eng.html");
            then.status(200)
                .body(index_page(&["/news/a.html", "/news/b.html", "/news/a.html"]));
        });
        let article_a = server.mock(|when, then| {
            when.method(GET).path("/news/a.html");
            then.status(200)
                .body(article_page(&["Jane Doe visited Ottawa. ", "Jane Doe met Pat Lee."]));
        });
        server.mock(|when, then| {
            when.method(GET).path("/news/b.html");
            then.status(200).body(article_page(&["Jane Doe visited Ottawa."]));
        });

        let config = config_for(&server);
        let fetcher = HttpFetcher::new("test-agent", None).unwrap();
        let tagger = test_tagger();
        let report = Pipeline::new(&fetcher, &tagger, &config).run().await.unwrap();

        // The index lists a.html twice; it is fetched once.
        article_a.assert_hits(1);
        let names: Vec<(&str, &str)> = report
            .rows
            .iter()
            .map(|r| (r.name.as_str(), r.link.rsplit('/').next().unwrap()))
            .collect();
        assert_eq!(
            names,
            vec![("Jane Doe", "a.html"), ("Pat Lee", "a.html"), ("Jane Doe", "b.html")]
        );
    }

    #[tokio::test]
    async fn test_selector_matching_nothing_gives_empty_report() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/media/menu-eng.html");
            then.status(200).body("<html><body><p>No widgets today.</p></body></html>");
        });

        let config = config_for(&server);
        let fetcher = HttpFetcher::new("test-agent", None).unwrap();
        let tagger = test_tagger();
        let report = Pipeline::new(&fetcher, &tagger, &config).run().await.unwrap();

        assert_eq!(report.links_discovered, 0);
        assert!(report.rows.is_empty());
        assert!(report.failures.is_empty());
    }

    #[tokio::test]
    async fn test_latin1_article_is_decoded_with_declared_charset() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/media/menu-eng.html");
            then.status(200).body(index_page(&["/news/fr.html"]));
        });
        server.mock(|when, then| {
            when.method(GET).path("/news/fr.html");
            then.status(200)
                .header("content-type", "text/html; charset=iso-8859-1")
                .body(b"<html><body><p>Jane Doe visited Montr\xE9al.</p></body></html>".to_vec());
        });

        let config = config_for(&server);
        let fetcher = HttpFetcher::new("test-agent", None).unwrap();
        let tagger = test_tagger();
        let report = Pipeline::new(&fetcher, &tagger, &config).run().await.unwrap();

        assert!(report.failures.is_empty());
        assert_eq!(
            report.rows,
            vec![ReportRow::from(NameCandidate::new(
                "Jane Doe",
                server.url("/news/fr.html").as_str()
            ))]
        );
    }

    #[tokio::test]
    async fn test_binary_article_is_parse_failure() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/media/menu-eng.html");
            then.status(200).body(index_page(&["/news/bad.html"]));
        });
        server.mock(|when, then| {
            when.method(GET).path("/news/bad.html");
            then.status(200)
                .header("content-type", "image/png")
                .body(b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR".to_vec());
        });

        let config = config_for(&server);
        let fetcher = HttpFetcher::new("test-agent", None).unwrap();
        let tagger = test_tagger();
        let report = Pipeline::new(&fetcher, &tagger, &config).run().await.unwrap();

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].stage, "parse");
        assert!(report.rows.is_empty());
    }

    #[tokio::test]
    async fn test_index_failure_aborts_run() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/media/menu-eng.html");
            then.status(503);
        });

        let config = config_for(&server);
        let fetcher = HttpFetcher::new("test-agent", None).unwrap();
        let tagger = test_tagger();
        let err = Pipeline::new(&fetcher, &tagger, &config).run().await.unwrap_err();
        assert!(matches!(err, ScrapeError::Fetch { .. }));
    }
}
