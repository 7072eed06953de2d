//! Proper-name grouping.
//!
//! Within one sentence, proper-noun tokens with more than two alphanumeric
//! characters are selected, and runs of selected tokens at consecutive
//! positions are joined with single spaces. Only runs of two or more tokens
//! become [`NameCandidate`]s: lone capitalized words (sentence starts,
//! acronyms) are dropped.

use crate::models::{Link, NameCandidate, TaggedSentence, Token};
use crate::text::tagger::{Tagger, tag_sentences};
use tracing::debug;

/// Tokens shorter than this many alphanumeric characters are never selected.
const MIN_ALNUM_EXCLUSIVE: usize = 2;

fn is_selected(token: &Token) -> bool {
    token.is_proper_noun() && token.alnum_len() > MIN_ALNUM_EXCLUSIVE
}

/// Group one sentence's selected tokens into multi-word names.
pub fn group_names(sentence: &TaggedSentence, link: &Link) -> Vec<NameCandidate> {
    let mut names = Vec::new();
    let mut current = String::new();
    let mut last_position: Option<usize> = None;

    let mut flush = |current: &mut String| {
        if current.contains(' ') {
            names.push(NameCandidate::new(current.as_str(), link.as_str()));
        }
        current.clear();
    };

    for token in sentence.tokens.iter().filter(|t| is_selected(t)) {
        let continues_run = last_position.is_some_and(|p| p + 1 == token.position);
        if !continues_run {
            flush(&mut current);
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&token.text);
        last_position = Some(token.position);
    }
    flush(&mut current);

    names
}

/// Tag `text` and collect the name candidates of every sentence, in order.
pub fn extract_candidates(text: &str, link: &Link, tagger: &impl Tagger) -> Vec<NameCandidate> {
    let candidates: Vec<NameCandidate> = tag_sentences(text, tagger)
        .iter()
        .flat_map(|sentence| group_names(sentence, link))
        .collect();
    debug!(%link, count = candidates.len(), "Grouped name candidates");
    candidates
}
