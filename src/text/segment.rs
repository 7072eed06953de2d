//! Sentence and word segmentation.
//!
//! Sentences come from UAX#29 boundaries with a follow-up pass that rejoins
//! splits made after common abbreviations and initials (`Mr. Smith`,
//! `J. Doe`). Words follow Penn Treebank conventions so the tagger sees the
//! same token shapes it was trained on.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use unicode_segmentation::UnicodeSegmentation;

static ABBREVIATIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "mr", "mrs", "ms", "dr", "prof", "rev", "hon", "st", "jr", "sr", "gen", "gov", "sen",
        "rep", "pres", "lt", "col", "maj", "capt", "cpl", "sgt", "supt", "insp", "cst", "det",
        "inc", "co", "corp", "ltd", "no", "vs", "etc", "ave", "blvd", "rd", "mt", "ft", "jan",
        "feb", "mar", "apr", "jun", "jul", "aug", "sep", "sept", "oct", "nov", "dec", "u.s",
        "u.k", "e.g", "i.e",
    ]
    .into_iter()
    .collect()
});

/// True when `piece` ends in a period that belongs to an abbreviation or an
/// initial rather than closing the sentence.
fn ends_with_abbreviation(piece: &str) -> bool {
    let trimmed = piece.trim_end();
    let Some(without_period) = trimmed.strip_suffix('.') else {
        return false;
    };
    let Some(last_word) = without_period.split_whitespace().last() else {
        return false;
    };
    let last_word = last_word.trim_start_matches(|c: char| !c.is_alphanumeric());
    let mut chars = last_word.chars();
    let is_initial = matches!((chars.next(), chars.next()), (Some(c), None) if c.is_uppercase());
    is_initial || ABBREVIATIONS.contains(last_word.to_lowercase().as_str())
}

/// Split plain text into trimmed, non-empty sentences.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start: Option<usize> = None;

    for (offset, piece) in text.split_sentence_bound_indices() {
        let begin = *start.get_or_insert(offset);
        if ends_with_abbreviation(piece) {
            continue;
        }
        let sentence = text[begin..offset + piece.len()].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
        start = None;
    }

    if let Some(begin) = start {
        let sentence = text[begin..].trim();
        if !sentence.is_empty() {
            sentences.push(sentence);
        }
    }
    sentences
}

struct Rule {
    pattern: Regex,
    replacement: &'static str,
}

fn rules(table: &[(&str, &'static str)]) -> Vec<Rule> {
    table
        .iter()
        .map(|(pattern, replacement)| Rule {
            pattern: Regex::new(pattern).unwrap(),
            replacement,
        })
        .collect()
}

static STARTING_QUOTES: Lazy<Vec<Rule>> = Lazy::new(|| {
    rules(&[
        (r#"^""#, "``"),
        (r"(``)", " ${1} "),
        (r#"([ (\[{<])("|'')"#, "${1} `` "),
    ])
});

static PUNCTUATION: Lazy<Vec<Rule>> = Lazy::new(|| {
    rules(&[
        (r"([:,])([^\d])", " ${1} ${2}"),
        (r"([:,])$", " ${1} "),
        (r"\.\.\.", " ... "),
        (r"[;@#$%&]", " ${0} "),
        (r#"([^.])(\.)([\])}>"']*)\s*$"#, "${1} ${2}${3} "),
        (r"[?!]", " ${0} "),
        (r"([^'])' ", "${1} ' "),
        (r"[\]\[(){}<>]", " ${0} "),
        (r"--", " -- "),
    ])
});

static ENDING_QUOTES: Lazy<Vec<Rule>> = Lazy::new(|| {
    rules(&[
        (r#"""#, " '' "),
        (r"(\S)('')", "${1} ${2} "),
        (r"([^' ])('[sS]|'[mM]|'[dD]|') ", "${1} ${2} "),
        (r"([^' ])('ll|'LL|'re|'RE|'ve|'VE|n't|N'T) ", "${1} ${2} "),
        (r"(?i)\b(can)(not)\b", "${1} ${2}"),
    ])
});

fn apply(rules: &[Rule], text: String) -> String {
    rules.iter().fold(text, |acc, rule| {
        rule.pattern.replace_all(&acc, rule.replacement).into_owned()
    })
}

/// Split one sentence into Treebank-style word tokens.
///
/// Punctuation, brackets and the sentence-final period become their own
/// tokens; double quotes become ` `` ` / `''`; clitics such as `'s` and
/// `n't` are split from their host word.
pub fn tokenize_words(sentence: &str) -> Vec<String> {
    let text = apply(&STARTING_QUOTES, sentence.to_string());
    let text = apply(&PUNCTUATION, text);
    let text = apply(&ENDING_QUOTES, format!(" {text} "));
    text.split_whitespace().map(str::to_string).collect()
}
