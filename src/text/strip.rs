//! Markup stripping.
//!
//! A serialized element is reduced to its text by deleting numeric
//! character-reference codes (`&#128512;`) and then every `<...>` tag. Each
//! distinct match is collected once and all of its occurrences are removed.

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;

static ENTITY_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"&#\d*;").unwrap());
static MARKUP_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Remove every distinct match of `pattern` from `text`.
fn remove_all_matches(text: &str, pattern: &Regex) -> String {
    let distinct = pattern
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .unique()
        .collect::<Vec<_>>();

    distinct
        .iter()
        .fold(text.to_string(), |acc, found| acc.replace(found.as_str(), ""))
}

/// Strip entity codes and tags from a markup fragment.
///
/// Removing a tag can splice a new code together (`&#1<b>2;` leaves `&#12;`), so the
/// passes repeat until neither pattern matches. The result is therefore a
/// fixed point: stripping it again returns it unchanged.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(strip_markup("<p>Hi&#128512;there</p>"), "Hithere");
/// ```
pub fn strip_markup(fragment: &str) -> String {
    let mut text = fragment.to_string();
    loop {
        text = remove_all_matches(&text, &ENTITY_CODE);
        text = remove_all_matches(&text, &MARKUP_TAG);
        if !ENTITY_CODE.is_match(&text) && !MARKUP_TAG.is_match(&text) {
            return text;
        }
    }
}

/// Strip each fragment independently and concatenate the residues in order.
pub fn strip_fragments<I, S>(fragments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fragments
        .into_iter()
        .map(|fragment| strip_markup(fragment.as_ref()))
        .collect()
}
