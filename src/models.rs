//! Data models flowing through the extraction pipeline.
//!
//! Each stage consumes the previous stage's records:
//! - [`Article`]: raw markup fetched for one discovered link
//! - [`Token`] / [`TaggedSentence`]: segmented, part-of-speech tagged text
//! - [`NameCandidate`]: a multi-word proper name paired with its source link
//! - [`ReportRow`]: the serialized `Name,Link` row

use serde::{Deserialize, Serialize};

/// An absolute article URL discovered on the index page.
pub type Link = String;

/// A fetched article, produced once per discovered link and never reused.
///
/// # Fields
///
/// * `url` - The link the article was fetched from
/// * `raw_markup` - The decoded document body
#[derive(Debug, Clone)]
pub struct Article {
    /// The link the markup was fetched from.
    pub url: Link,
    /// The full document markup.
    pub raw_markup: String,
}

/// A single word-level token with its Penn Treebank tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// The token text as it appeared in the sentence.
    pub text: String,
    /// 0-based rank within the containing sentence.
    pub position: usize,
    /// Part-of-speech tag, e.g. `NNP`, `VBD`.
    pub tag: String,
}

impl Token {
    pub fn new(text: impl Into<String>, position: usize, tag: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            position,
            tag: tag.into(),
        }
    }

    /// `NNP` and `NNPS` both mark proper nouns.
    pub fn is_proper_noun(&self) -> bool {
        self.tag.starts_with("NNP")
    }

    /// Number of alphanumeric characters, punctuation ignored.
    pub fn alnum_len(&self) -> usize {
        self.text.chars().filter(|c| c.is_alphanumeric()).count()
    }
}

/// The tokens of one sentence, ordered by position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaggedSentence {
    pub tokens: Vec<Token>,
}

impl TaggedSentence {
    /// Build a sentence from `(word, tag)` pairs, assigning positions `0..n`.
    pub fn from_pairs<W, T>(pairs: impl IntoIterator<Item = (W, T)>) -> Self
    where
        W: Into<String>,
        T: Into<String>,
    {
        let tokens = pairs
            .into_iter()
            .enumerate()
            .map(|(position, (word, tag))| Token::new(word, position, tag))
            .collect();
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// A run of two or more consecutive proper-noun tokens, joined by spaces.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NameCandidate {
    pub name: String,
    pub link: Link,
}

impl NameCandidate {
    pub fn new(name: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            link: link.into(),
        }
    }
}

/// One row of the `Name,Link` report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Link")]
    pub link: String,
}

impl From<NameCandidate> for ReportRow {
    fn from(candidate: NameCandidate) -> Self {
        Self {
            name: candidate.name,
            link: candidate.link,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_proper_noun_tags() {
        assert!(Token::new("Ottawa", 0, "NNP").is_proper_noun());
        assert!(Token::new("Americans", 0, "NNPS").is_proper_noun());
        assert!(!Token::new("visited", 0, "VBD").is_proper_noun());
        assert!(!Token::new("dog", 0, "NN").is_proper_noun());
    }

    #[test]
    fn test_token_alnum_len_ignores_punctuation() {
        assert_eq!(Token::new("U.S.", 0, "NNP").alnum_len(), 2);
        assert_eq!(Token::new("O'Neil", 0, "NNP").alnum_len(), 5);
        assert_eq!(Token::new("--", 0, ":").alnum_len(), 0);
    }

    #[test]
    fn test_tagged_sentence_assigns_positions() {
        let sentence = TaggedSentence::from_pairs([("John", "NNP"), ("ran", "VBD")]);
        assert_eq!(sentence.len(), 2);
        assert_eq!(sentence.tokens[0].position, 0);
        assert_eq!(sentence.tokens[1].position, 1);
        assert_eq!(sentence.tokens[1].tag, "VBD");
    }

    #[test]
    fn test_report_row_serializes_with_header_names() {
        let row = ReportRow::from(NameCandidate::new("Jane Doe", "http://a"));
        let json = serde_json::to_string(&row).unwrap();
        assert!(json.contains("\"Name\":\"Jane Doe\""));
        assert!(json.contains("\"Link\":\"http://a\""));
    }
}
