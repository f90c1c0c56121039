//! Training corpus: quoted, comma-separated `query,category,priority` lines.

use crate::TriageError;
use std::path::{Path, PathBuf};

pub const DEFAULT_CORPUS_FILE: &str = "cmsdata.csv";

/// One labelled training row. Labels are kept as written; the pattern builder
/// decides which ones it recognizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingSample {
    pub query: String,
    pub category: String,
    pub priority: String,
}

/// Parsed corpus plus the number of lines that could not be used.
#[derive(Debug, Default)]
pub struct Corpus {
    pub samples: Vec<TrainingSample>,
    pub skipped: usize,
}

/// Parse corpus text. The first line is a header.
pub fn parse_corpus(content: &str) -> Corpus {
    let mut corpus = Corpus::default();

    for (lineno, line) in content.lines().enumerate().skip(1) {
        match parse_line(line) {
            Some(sample) => corpus.samples.push(sample),
            None => {
                log::debug!("corpus line {}: expected 3 fields, skipped", lineno + 1);
                corpus.skipped += 1;
            }
        }
    }

    corpus
}

fn parse_line(line: &str) -> Option<TrainingSample> {
    let mut parts = line.trim().splitn(3, ',');
    let query = parts.next()?;
    let category = parts.next()?;
    let priority = parts.next()?;

    Some(TrainingSample {
        query: unquote(query).to_string(),
        category: unquote(category).to_string(),
        priority: unquote(priority).to_string(),
    })
}

fn unquote(field: &str) -> &str {
    field.trim_matches('"')
}

/// Read and parse a corpus file. Any read failure (missing file, bad UTF-8)
/// is returned to the caller, which decides whether to fall back.
pub fn load_corpus(path: &Path) -> Result<Corpus, TriageError> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_corpus(&content))
}

fn triage_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".triage"))
}

/// Pick the corpus path: explicit (flag/env), then config, then
/// `~/.triage/cmsdata.csv`, then `./cmsdata.csv`.
pub fn resolve_corpus_path(explicit: Option<&Path>, configured: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit.or(configured) {
        return p.to_path_buf();
    }

    let candidates = [
        triage_dir().map(|d| d.join(DEFAULT_CORPUS_FILE)),
        Some(PathBuf::from(DEFAULT_CORPUS_FILE)),
    ];

    for candidate in candidates.into_iter().flatten() {
        if candidate.exists() {
            return candidate;
        }
    }

    // Missing file; loading fails and the classifier uses defaults.
    PathBuf::from(DEFAULT_CORPUS_FILE)
}
