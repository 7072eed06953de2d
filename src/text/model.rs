//! Tagging model setup.
//!
//! The perceptron weights are not bundled with the binary. Before the first
//! article is tagged, [`ensure_model`] checks the model directory and, when
//! a download URL is configured, fetches the packaged model zip and unpacks
//! its JSON parts. Any failure here is fatal for the run.

use crate::error::{Result, ScrapeError};
use crate::scrapers::Fetcher;
use crate::text::tagger::{
    CLASSES_SUFFIX, PerceptronTagger, TAGDICT_SUFFIX, WEIGHTS_SUFFIX, model_part,
};
use std::fs::{self, File};
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};
use zip::ZipArchive;

/// Packaged English averaged perceptron model.
pub const DEFAULT_MODEL_URL: &str = "https://raw.githubusercontent.com/nltk/nltk_data/gh-pages/packages/taggers/averaged_perceptron_tagger_eng.zip";

/// Default on-disk location of the unpacked model.
pub const DEFAULT_MODEL_DIR: &str = "models/averaged_perceptron_tagger_eng";

const MODEL_PARTS: [&str; 3] = [WEIGHTS_SUFFIX, TAGDICT_SUFFIX, CLASSES_SUFFIX];

/// True when all three model parts exist in `dir`.
pub fn model_present(dir: &Path) -> bool {
    MODEL_PARTS
        .iter()
        .all(|suffix| model_part(dir, suffix).is_ok())
}

/// Unpack the model JSON files from a zip archive into `dir`, flattening
/// any folder structure inside the archive. Returns the number of files
/// installed.
///
/// Parts are written to `*.part` files first and only renamed into place
/// once the archive has yielded all three, so an interrupted or incomplete
/// unpack never leaves a set of files that looks like a model.
pub fn extract_model_zip(archive_bytes: &[u8], dir: &Path) -> Result<usize> {
    let mut archive = ZipArchive::new(Cursor::new(archive_bytes))?;
    fs::create_dir_all(dir)?;

    let mut staged = Vec::new();
    if let Err(e) = stage_parts(&mut archive, dir, &mut staged) {
        discard(&staged);
        return Err(e);
    }

    let missing: Vec<&str> = MODEL_PARTS
        .iter()
        .copied()
        .filter(|suffix| {
            !staged
                .iter()
                .any(|(_, target)| target.to_string_lossy().ends_with(suffix))
        })
        .collect();
    if !missing.is_empty() {
        discard(&staged);
        return Err(unavailable(
            dir,
            format!("archive is missing model parts: {}", missing.join(", ")),
        ));
    }

    // Stale parts may carry a different file name prefix.
    for suffix in MODEL_PARTS {
        while let Ok(stale) = model_part(dir, suffix) {
            fs::remove_file(stale)?;
        }
    }
    for (part, target) in &staged {
        fs::rename(part, target)?;
    }
    Ok(staged.len())
}

/// Write every model part in the archive to `<name>.part`, recording
/// `(part, target)` pairs as they are created.
fn stage_parts(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    dir: &Path,
    staged: &mut Vec<(PathBuf, PathBuf)>,
) -> Result<()> {
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let Some(file_name) = entry.name().rsplit('/').next().map(str::to_string) else {
            continue;
        };
        if !MODEL_PARTS.iter().any(|suffix| file_name.ends_with(suffix)) {
            continue;
        }
        let part = dir.join(format!("{file_name}.part"));
        staged.push((part.clone(), dir.join(&file_name)));
        let mut out = File::create(&part)?;
        io::copy(&mut entry, &mut out)?;
        out.sync_all()?;
    }
    Ok(())
}

fn discard(staged: &[(PathBuf, PathBuf)]) {
    for (part, _) in staged {
        let _ = fs::remove_file(part);
    }
}

fn unavailable(dir: &Path, reason: String) -> ScrapeError {
    ScrapeError::ModelUnavailable {
        path: dir.to_path_buf(),
        reason,
    }
}

fn load_model(dir: &Path) -> Result<PerceptronTagger> {
    PerceptronTagger::load(dir).map_err(|e| match e {
        ScrapeError::ModelUnavailable { .. } => e,
        other => unavailable(dir, format!("could not load model: {other}")),
    })
}

/// Make sure the tagging model is available and load it.
///
/// * `dir` - Directory holding (or receiving) the model parts
/// * `download_url` - Where to fetch the model zip; `None` forbids fetching
///
/// Files already on disk that fail to load are replaced by a fresh download
/// when downloading is allowed.
///
/// # Errors
///
/// [`ScrapeError::ModelUnavailable`] when no loadable model is on disk and
/// none can be fetched.
#[instrument(level = "info", skip_all, fields(dir = %dir.display(), url = ?download_url))]
pub async fn ensure_model(
    fetcher: &impl Fetcher,
    dir: &Path,
    download_url: Option<&str>,
) -> Result<PerceptronTagger> {
    if model_present(dir) {
        match load_model(dir) {
            Ok(tagger) => return Ok(tagger),
            Err(e) if download_url.is_none() => return Err(e),
            Err(e) => warn!(error = %e, "Tagging model on disk is unusable; downloading a fresh copy"),
        }
    }

    let Some(url) = download_url else {
        return Err(unavailable(
            dir,
            "model files are missing and downloading is disabled".to_string(),
        ));
    };

    info!(%url, "Downloading tagging model");
    let archive = fetcher
        .fetch(url)
        .await
        .map_err(|e| unavailable(dir, format!("download failed: {e}")))?;
    let written = extract_model_zip(&archive, dir).map_err(|e| match e {
        ScrapeError::ModelUnavailable { .. } => e,
        other => unavailable(dir, format!("could not unpack {url}: {other}")),
    })?;
    info!(files = written, "Unpacked tagging model");

    load_model(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::HttpFetcher;
    use crate::text::tagger::Tagger;
    use httpmock::prelude::*;
    use std::io::Write;
    use zip::write::{SimpleFileOptions, ZipWriter};

    fn model_zip(files: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.add_directory("averaged_perceptron_tagger_eng/", SimpleFileOptions::default())
            .unwrap();
        for (name, body) in files {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    fn full_model_zip() -> Vec<u8> {
        model_zip(&[
            (
                "averaged_perceptron_tagger_eng/averaged_perceptron_tagger_eng.weights.json",
                r#"{"bias": {"NN": 1.0}}"#,
            ),
            (
                "averaged_perceptron_tagger_eng/averaged_perceptron_tagger_eng.tagdict.json",
                r#"{"Canada": "NNP"}"#,
            ),
            (
                "averaged_perceptron_tagger_eng/averaged_perceptron_tagger_eng.classes.json",
                r#"["NN", "NNP"]"#,
            ),
            ("averaged_perceptron_tagger_eng/README", "ignored"),
        ])
    }

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new("test-agent", None).unwrap()
    }

    #[test]
    fn test_extract_model_zip_flattens_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        let written = extract_model_zip(&full_model_zip(), dir.path()).unwrap();
        assert_eq!(written, 3);
        assert!(model_present(dir.path()));
        assert!(!dir.path().join("README").exists());
    }

    #[tokio::test]
    async fn test_missing_model_offline_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = ensure_model(&fetcher(), dir.path(), None).await.unwrap_err();
        assert!(matches!(err, ScrapeError::ModelUnavailable { .. }));
        assert!(err.to_string().contains("downloading is disabled"));
    }

    #[tokio::test]
    async fn test_missing_model_is_downloaded_once() {
        let server = MockServer::start();
        let download = server.mock(|when, then| {
            when.method(GET).path("/model.zip");
            then.status(200).body(full_model_zip());
        });
        let dir = tempfile::tempdir().unwrap();
        let model_dir = dir.path().join("tagger");
        let url = server.url("/model.zip");

        let tagger = ensure_model(&fetcher(), &model_dir, Some(&url)).await.unwrap();
        assert_eq!(
            tagger.tag(&["Canada".to_string(), "border".to_string()]),
            vec!["NNP", "NN"]
        );

        // Second call finds the files on disk and does not fetch again.
        ensure_model(&fetcher(), &model_dir, Some(&url)).await.unwrap();
        download.assert_hits(1);
    }

    #[tokio::test]
    async fn test_failed_download_is_unavailable() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/model.zip");
            then.status(503);
        });
        let dir = tempfile::tempdir().unwrap();
        let url = server.url("/model.zip");

        let err = ensure_model(&fetcher(), dir.path(), Some(&url)).await.unwrap_err();
        assert!(matches!(err, ScrapeError::ModelUnavailable { .. }));
        assert!(err.to_string().contains("download failed"));
    }

    #[tokio::test]
    async fn test_incomplete_archive_is_unavailable() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/model.zip");
            then.status(200).body(model_zip(&[("m.weights.json", "{}")]));
        });
        let dir = tempfile::tempdir().unwrap();
        let url = server.url("/model.zip");

        let err = ensure_model(&fetcher(), dir.path(), Some(&url)).await.unwrap_err();
        assert!(err.to_string().contains("missing model parts"));
        // Nothing half-installed is left behind.
        assert!(!model_present(dir.path()));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_corrupt_model_on_disk_is_downloaded_again() {
        let server = MockServer::start();
        let download = server.mock(|when, then| {
            when.method(GET).path("/model.zip");
            then.status(200).body(full_model_zip());
        });
        let dir = tempfile::tempdir().unwrap();
        extract_model_zip(&full_model_zip(), dir.path()).unwrap();
        let weights = model_part(dir.path(), WEIGHTS_SUFFIX).unwrap();
        fs::write(&weights, r#"{"bias": {"NN""#).unwrap();
        let url = server.url("/model.zip");

        let tagger = ensure_model(&fetcher(), dir.path(), Some(&url)).await.unwrap();
        download.assert_hits(1);
        assert_eq!(tagger.tag(&["border".to_string()]), vec!["NN"]);
    }

    #[tokio::test]
    async fn test_corrupt_model_offline_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        extract_model_zip(&full_model_zip(), dir.path()).unwrap();
        let weights = model_part(dir.path(), WEIGHTS_SUFFIX).unwrap();
        fs::write(&weights, r#"{"bias": {"NN""#).unwrap();

        let err = ensure_model(&fetcher(), dir.path(), None).await.unwrap_err();
        assert!(matches!(err, ScrapeError::ModelUnavailable { .. }));
        assert!(err.to_string().contains("could not load model"));
    }

    #[test]
    fn test_reinstall_replaces_parts_with_other_prefix() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("old.weights.json"), "{").unwrap();
        extract_model_zip(&full_model_zip(), dir.path()).unwrap();

        assert!(!dir.path().join("old.weights.json").exists());
        assert!(PerceptronTagger::load(dir.path()).is_ok());
    }
}
