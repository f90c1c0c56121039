//! Word extraction shared by pattern building and classification.

use regex::Regex;
use std::sync::LazyLock;

static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9\s]").expect("static pattern compiles"));

/// Tokens shorter than this (in bytes; tokens are ASCII) are dropped.
const MIN_WORD_LEN: usize = 3;

/// Normalized word sequence for one piece of text.
///
/// Holds the normalized text so the sequence can be walked any number of
/// times. Duplicates are kept; downstream counting depends on them.
#[derive(Debug, Clone)]
pub struct Words {
    normalized: String,
}

impl Words {
    pub fn extract(text: &str) -> Self {
        let lower = text.to_lowercase();
        let normalized = NON_WORD.replace_all(&lower, " ").into_owned();
        Self { normalized }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.normalized
            .split_whitespace()
            .filter(|w| w.len() >= MIN_WORD_LEN)
    }
}
