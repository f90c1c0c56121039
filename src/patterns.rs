//! Keyword pattern tables: per-label keyword lists used by the scorer.
//!
//! Built once, either from a training corpus (most frequent words per label)
//! or from the hand-authored defaults, and never mutated afterwards.

use crate::corpus::TrainingSample;
use crate::label::{Category, Label, Priority};
use crate::words::Words;
use std::collections::HashMap;

/// Keywords kept per category when building from a corpus.
pub const CATEGORY_TOP_WORDS: usize = 50;
/// Keywords kept per priority when building from a corpus.
pub const PRIORITY_TOP_WORDS: usize = 30;

const DEFAULT_CATEGORY_PATTERNS: &[(Category, &[&str])] = &[
    (
        Category::Technical,
        &[
            "login", "password", "portal", "wifi", "internet", "network", "computer", "laptop",
            "software", "email", "lms", "system",
        ],
    ),
    (
        Category::Academic,
        &[
            "grade", "marks", "exam", "attendance", "lecture", "class", "assignment",
            "certificate", "transfer", "timetable", "professor",
        ],
    ),
    (
        Category::HostelMess,
        &[
            "hostel", "room", "mess", "food", "meal", "accommodation", "furniture", "allotment",
            "quality", "dining",
        ],
    ),
    (
        Category::Maintenance,
        &[
            "maintenance", "repair", "broken", "electricity", "water", "tap", "elevator",
            "cleaning", "lighting", "conditioning",
        ],
    ),
];

const DEFAULT_PRIORITY_PATTERNS: &[(Priority, &[&str])] = &[
    (
        Priority::Urgent,
        &["urgent", "emergency", "immediately", "broken", "not", "working", "critical"],
    ),
    (
        Priority::High,
        &["important", "soon", "needed", "missing", "exam", "grade", "deteriorated"],
    ),
    (
        Priority::Medium,
        &["moderate", "normal", "permission", "competition", "week"],
    ),
    (
        Priority::Low,
        &["later", "minor", "simple", "routine", "cleaning", "dim"],
    ),
];

/// Label → ordered keyword list. Entries are kept in `L::TABLE_ORDER`.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternTable<L: Label> {
    entries: Vec<(L, Vec<String>)>,
}

impl<L: Label> PatternTable<L> {
    fn from_static(defaults: &[(L, &[&str])]) -> Self {
        let mut entries: Vec<(L, Vec<String>)> = defaults
            .iter()
            .map(|(label, words)| (*label, words.iter().map(|w| (*w).to_string()).collect()))
            .collect();
        sort_by_table_order(&mut entries);
        Self { entries }
    }

    /// Keywords for `label`; empty if the label has no entry.
    #[cfg(test)]
    pub fn patterns(&self, label: L) -> &[String] {
        self.entries
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, words)| words.as_slice())
            .unwrap_or(&[])
    }

    /// Labels with an entry, in table order.
    pub fn labels(&self) -> impl Iterator<Item = L> + '_ {
        self.entries.iter().map(|(l, _)| *l)
    }

    pub fn iter(&self) -> impl Iterator<Item = (L, &[String])> + '_ {
        self.entries.iter().map(|(l, words)| (*l, words.as_slice()))
    }
}

fn sort_by_table_order<L: Label, T>(entries: &mut [(L, T)]) {
    entries.sort_by_key(|(label, _)| {
        L::TABLE_ORDER
            .iter()
            .position(|l| l == label)
            .unwrap_or(usize::MAX)
    });
}

/// Word counts that remember first-seen order, so equal counts sort stably.
#[derive(Default)]
struct WordCounts {
    index: HashMap<String, usize>,
    counts: Vec<(String, u32)>,
}

impl WordCounts {
    fn add(&mut self, word: &str) {
        match self.index.get(word) {
            Some(&i) => self.counts[i].1 += 1,
            None => {
                self.index.insert(word.to_string(), self.counts.len());
                self.counts.push((word.to_string(), 1));
            }
        }
    }

    /// Most frequent words, descending, ties in first-seen order.
    /// Words seen only once never qualify.
    fn top(mut self, limit: usize) -> Vec<String> {
        self.counts.sort_by(|a, b| b.1.cmp(&a.1));
        self.counts
            .into_iter()
            .take(limit)
            .filter(|(_, count)| *count > 1)
            .map(|(word, _)| word)
            .collect()
    }
}

/// Accumulates per-label counts; labels kept in first-seen order until
/// `finish` re-sorts them into table order.
struct TableBuilder<L: Label> {
    labels: Vec<(L, WordCounts)>,
}

impl<L: Label> TableBuilder<L> {
    fn new() -> Self {
        Self { labels: Vec::new() }
    }

    fn counts_for(&mut self, label: L) -> &mut WordCounts {
        let pos = match self.labels.iter().position(|(l, _)| *l == label) {
            Some(pos) => pos,
            None => {
                self.labels.push((label, WordCounts::default()));
                self.labels.len() - 1
            }
        };
        &mut self.labels[pos].1
    }

    fn finish(self, limit: usize) -> PatternTable<L> {
        let mut entries: Vec<(L, Vec<String>)> = self
            .labels
            .into_iter()
            .map(|(label, counts)| (label, counts.top(limit)))
            .collect();
        sort_by_table_order(&mut entries);
        PatternTable { entries }
    }
}

/// The two tables the scorer consults.
#[derive(Debug, Clone, PartialEq)]
pub struct PatternTables {
    pub categories: PatternTable<Category>,
    pub priorities: PatternTable<Priority>,
}

impl PatternTables {
    /// Hand-authored tables used when no corpus is available.
    pub fn defaults() -> Self {
        Self {
            categories: PatternTable::from_static(DEFAULT_CATEGORY_PATTERNS),
            priorities: PatternTable::from_static(DEFAULT_PRIORITY_PATTERNS),
        }
    }

    /// Derive tables from labelled samples; an empty slice yields the defaults.
    ///
    /// A sample whose category (or priority) label is not recognized still
    /// contributes to the other table.
    pub fn build(samples: &[TrainingSample]) -> Self {
        if samples.is_empty() {
            return Self::defaults();
        }

        let mut categories = TableBuilder::<Category>::new();
        let mut priorities = TableBuilder::<Priority>::new();

        for sample in samples {
            let words = Words::extract(&sample.query);
            let category = Category::parse(&sample.category);
            let priority = Priority::parse(&sample.priority);

            if category.is_none() {
                log::debug!("unknown category label {:?}, ignored", sample.category);
            }
            if priority.is_none() {
                log::debug!("unknown priority label {:?}, ignored", sample.priority);
            }

            if let Some(c) = category {
                let counts = categories.counts_for(c);
                for w in words.iter() {
                    counts.add(w);
                }
            }
            if let Some(p) = priority {
                let counts = priorities.counts_for(p);
                for w in words.iter() {
                    counts.add(w);
                }
            }
        }

        Self {
            categories: categories.finish(CATEGORY_TOP_WORDS),
            priorities: priorities.finish(PRIORITY_TOP_WORDS),
        }
    }
}
