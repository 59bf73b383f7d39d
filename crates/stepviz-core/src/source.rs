//! Source inspection: the language gate and the panel feature flags.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::run::DocumentSnapshot;

/// Flags derived from the source text that decide which panel controls show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFeatures {
    /// The program reads from stdin, so the input box is shown.
    pub show_input_box: bool,
    /// The program uses the `random` module, so the seed control is shown.
    pub has_randomness: bool,
}

impl SourceFeatures {
    pub fn detect(source: &str) -> Self {
        SourceFeatures {
            show_input_box: reads_input(source),
            has_randomness: uses_randomness(source),
        }
    }
}

/// Refuses documents that are not in the supported language.
pub fn ensure_language(document: &DocumentSnapshot, expected: &str) -> Result<(), CoreError> {
    if document.language_id == expected {
        Ok(())
    } else {
        Err(CoreError::UnsupportedLanguage {
            language: document.language_id.clone(),
            expected: expected.to_string(),
        })
    }
}

/// Lines that are not whole-line `#` comments.
fn code_lines(source: &str) -> impl Iterator<Item = &str> {
    source
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
}

/// True if any code line calls `input(`.
pub fn reads_input(source: &str) -> bool {
    code_lines(source).any(|line| has_call(line, "input"))
}

/// True if any code line imports or references the `random` module.
pub fn uses_randomness(source: &str) -> bool {
    code_lines(source).any(|line| {
        let trimmed = line.trim_start();
        trimmed.starts_with("import random")
            || trimmed.starts_with("from random ")
            || find_word(line, "random").any(|end| line[end..].starts_with('.'))
    })
}

/// True if `name` appears as a whole word followed by optional spaces and `(`.
fn has_call(line: &str, name: &str) -> bool {
    find_word(line, name).any(|end| line[end..].trim_start().starts_with('('))
}

/// Byte offsets just past each whole-word occurrence of `word` in `line`.
fn find_word<'a>(line: &'a str, word: &'a str) -> impl Iterator<Item = usize> + 'a {
    line.match_indices(word).filter_map(move |(start, _)| {
        let before = line[..start].chars().next_back();
        let end = start + word.len();
        let after = line[end..].chars().next();
        let boundary = |c: Option<char>| c.map_or(true, |c| !(c.is_alphanumeric() || c == '_'));
        (boundary(before) && boundary(after)).then_some(end)
    })
}
