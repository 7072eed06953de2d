//! Part-of-speech tagging.
//!
//! [`PerceptronTagger`] runs inference for an averaged perceptron trained on
//! the Penn Treebank tag set, using the same feature templates and word
//! normalization as the widely distributed NLTK English model, so that
//! model's JSON weights can be loaded unchanged.

use crate::error::{Result, ScrapeError};
use crate::models::TaggedSentence;
use crate::text::segment::{split_sentences, tokenize_words};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument};

/// Assigns one part-of-speech tag to every word of a sentence.
pub trait Tagger {
    /// Returns exactly one tag per input word, in order.
    fn tag(&self, words: &[String]) -> Vec<String>;
}

const START: [&str; 2] = ["-START-", "-START2-"];
const END: [&str; 2] = ["-END-", "-END2-"];

/// File name suffixes of the three model parts inside a model directory.
pub const WEIGHTS_SUFFIX: &str = ".weights.json";
pub const TAGDICT_SUFFIX: &str = ".tagdict.json";
pub const CLASSES_SUFFIX: &str = ".classes.json";

/// Averaged perceptron tagger (inference only).
#[derive(Debug, Default)]
pub struct PerceptronTagger {
    /// feature -> (tag -> weight)
    weights: HashMap<String, HashMap<String, f64>>,
    /// Unambiguous words and their fixed tag.
    tagdict: HashMap<String, String>,
    classes: Vec<String>,
}

impl PerceptronTagger {
    pub fn from_parts(
        weights: HashMap<String, HashMap<String, f64>>,
        tagdict: HashMap<String, String>,
        mut classes: Vec<String>,
    ) -> Self {
        classes.sort();
        classes.dedup();
        Self {
            weights,
            tagdict,
            classes,
        }
    }

    /// Load the three JSON model parts from `dir`.
    ///
    /// Each part is located by its file name suffix, so both
    /// `averaged_perceptron_tagger_eng.weights.json` and any other prefix work.
    #[instrument(level = "info", skip_all, fields(dir = %dir.display()))]
    pub fn load(dir: &Path) -> Result<Self> {
        let weights: HashMap<String, HashMap<String, f64>> =
            serde_json::from_slice(&fs::read(model_part(dir, WEIGHTS_SUFFIX)?)?)?;
        let tagdict: HashMap<String, String> =
            serde_json::from_slice(&fs::read(model_part(dir, TAGDICT_SUFFIX)?)?)?;
        let classes: Vec<String> =
            serde_json::from_slice(&fs::read(model_part(dir, CLASSES_SUFFIX)?)?)?;

        if classes.is_empty() {
            return Err(ScrapeError::ModelUnavailable {
                path: dir.to_path_buf(),
                reason: "model declares no tag classes".to_string(),
            });
        }

        info!(
            features = weights.len(),
            tagdict = tagdict.len(),
            classes = classes.len(),
            "Loaded perceptron tagging model"
        );
        Ok(Self::from_parts(weights, tagdict, classes))
    }

    fn predict(&self, features: &[String]) -> String {
        let mut scores: HashMap<&str, f64> = HashMap::new();
        for feature in features {
            if let Some(label_weights) = self.weights.get(feature) {
                for (label, weight) in label_weights {
                    *scores.entry(label.as_str()).or_insert(0.0) += weight;
                }
            }
        }

        self.classes
            .iter()
            .max_by(|a, b| {
                let sa = scores.get(a.as_str()).copied().unwrap_or(0.0);
                let sb = scores.get(b.as_str()).copied().unwrap_or(0.0);
                sa.total_cmp(&sb).then_with(|| a.cmp(b))
            })
            .cloned()
            .unwrap_or_else(|| "NN".to_string())
    }
}

/// Find the file in `dir` whose name ends with `suffix`.
pub fn model_part(dir: &Path, suffix: &str) -> Result<std::path::PathBuf> {
    let missing = || ScrapeError::ModelUnavailable {
        path: dir.to_path_buf(),
        reason: format!("no *{suffix} file"),
    };
    let entries = fs::read_dir(dir).map_err(|_| missing())?;
    for entry in entries {
        let path = entry?.path();
        let matches = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.ends_with(suffix));
        if matches && path.is_file() {
            return Ok(path);
        }
    }
    Err(missing())
}

/// Map a word onto the vocabulary the model was trained on.
fn normalize(word: &str) -> String {
    let mut chars = word.chars();
    let first = chars.next();
    if word.contains('-') && first != Some('-') {
        "!HYPHEN".to_string()
    } else if word.chars().count() == 4 && word.chars().all(|c| c.is_ascii_digit()) {
        "!YEAR".to_string()
    } else if first.is_some_and(|c| c.is_ascii_digit()) {
        "!DIGITS".to_string()
    } else {
        word.to_lowercase()
    }
}

/// Last three characters of `word`.
fn suffix(word: &str) -> &str {
    match word.char_indices().rev().nth(2) {
        Some((idx, _)) => &word[idx..],
        None => word,
    }
}

fn first_char(word: &str) -> &str {
    match word.char_indices().nth(1) {
        Some((idx, _)) => &word[..idx],
        None => word,
    }
}

fn features(i: usize, word: &str, context: &[String], prev: &str, prev2: &str) -> Vec<String> {
    let i = i + START.len();
    vec![
        "bias".to_string(),
        format!("i suffix {}", suffix(word)),
        format!("i pref1 {}", first_char(word)),
        format!("i-1 tag {prev}"),
        format!("i-2 tag {prev2}"),
        format!("i tag+i-2 tag {prev} {prev2}"),
        format!("i word {}", context[i]),
        format!("i-1 tag+i word {prev} {}", context[i]),
        format!("i-1 word {}", context[i - 1]),
        format!("i-1 suffix {}", suffix(&context[i - 1])),
        format!("i-2 word {}", context[i - 2]),
        format!("i+1 word {}", context[i + 1]),
        format!("i+1 suffix {}", suffix(&context[i + 1])),
        format!("i+2 word {}", context[i + 2]),
    ]
}

impl Tagger for PerceptronTagger {
    fn tag(&self, words: &[String]) -> Vec<String> {
        let context: Vec<String> = START
            .iter()
            .map(|s| s.to_string())
            .chain(words.iter().map(|w| normalize(w)))
            .chain(END.iter().map(|s| s.to_string()))
            .collect();

        let mut prev = START[0].to_string();
        let mut prev2 = START[1].to_string();
        let mut tags = Vec::with_capacity(words.len());

        for (i, word) in words.iter().enumerate() {
            let tag = match self.tagdict.get(word) {
                Some(tag) => tag.clone(),
                None => self.predict(&features(i, word, &context, &prev, &prev2)),
            };
            prev2 = std::mem::replace(&mut prev, tag.clone());
            tags.push(tag);
        }
        tags
    }
}

/// Segment `text` into sentences and tag each one, numbering tokens from 0
/// within every sentence.
pub fn tag_sentences(text: &str, tagger: &impl Tagger) -> Vec<TaggedSentence> {
    let sentences: Vec<TaggedSentence> = split_sentences(text)
        .into_iter()
        .map(|sentence| {
            let words = tokenize_words(sentence);
            let tags = tagger.tag(&words);
            TaggedSentence::from_pairs(words.into_iter().zip(tags))
        })
        .filter(|sentence| !sentence.is_empty())
        .collect();
    debug!(
        sentences = sentences.len(),
        tokens = sentences.iter().map(TaggedSentence::len).sum::<usize>(),
        "Tagged text"
    );
    sentences
}
