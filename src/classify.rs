//! Complaint classifier: text → (category, priority).
//!
//! Pipeline: rule shortcuts on the lower-cased text, then (if no rule fired)
//! keyword scoring against the pattern tables, contextual boosts, and an
//! arg-max over each score map. Classification is pure; the tables are fixed
//! at construction, so one `Classifier` can be shared across threads.

use crate::corpus::{load_corpus, Corpus};
use crate::label::{Category, Label, Priority};
use crate::patterns::{PatternTable, PatternTables};
use crate::words::Words;
use crate::TriageError;
use serde::Serialize;
use std::path::Path;

/// Outcome of classifying one text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub category: Category,
    pub priority: Priority,
}

impl Classification {
    /// Used by callers whose classification step failed outright.
    pub const FALLBACK: Classification = Classification {
        category: Category::Technical,
        priority: Priority::Medium,
    };

    const fn new(category: Category, priority: Priority) -> Self {
        Self { category, priority }
    }
}

/// Which stage produced a classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Stage {
    Rule {
        rule: &'static str,
    },
    Scoring {
        category_scores: Vec<(Category, f64)>,
        priority_scores: Vec<(Priority, f64)>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    #[serde(flatten)]
    pub classification: Classification,
    #[serde(flatten)]
    pub stage: Stage,
}

/// Text prepared once per request.
struct Query {
    lower: String,
    words: Words,
}

impl Query {
    fn new(text: &str) -> Self {
        Self {
            lower: text.to_lowercase(),
            words: Words::extract(text),
        }
    }

    fn mentions_any(&self, needles: &[&str]) -> bool {
        needles.iter().any(|n| self.lower.contains(n))
    }
}

// --- Stage 1: rule shortcuts ---

/// Substring rule: fires when any trigger occurs in the lower-cased text.
/// `refine` overrides the outcome when its own triggers also occur.
struct Rule {
    name: &'static str,
    triggers: &'static [&'static str],
    refine: Option<(&'static [&'static str], Classification)>,
    outcome: Classification,
}

impl Rule {
    fn apply(&self, query: &Query) -> Option<Classification> {
        if !query.mentions_any(self.triggers) {
            return None;
        }
        match self.refine {
            Some((triggers, outcome)) if query.mentions_any(triggers) => Some(outcome),
            _ => Some(self.outcome),
        }
    }
}

/// Evaluated in order; the first match wins.
const RULES: &[Rule] = &[
    Rule {
        name: "water",
        triggers: &["water", "tap", "leak", "plumbing", "pipe", "drainage"],
        refine: Some((
            &["hostel", "room", "mess"],
            Classification::new(Category::HostelMess, Priority::Urgent),
        )),
        outcome: Classification::new(Category::Maintenance, Priority::Urgent),
    },
    Rule {
        name: "electrical",
        triggers: &["electricity", "power", "light", "bulb", "electrical"],
        refine: Some((
            &["hostel", "room"],
            Classification::new(Category::HostelMess, Priority::Urgent),
        )),
        outcome: Classification::new(Category::Maintenance, Priority::High),
    },
    Rule {
        name: "food",
        triggers: &["food", "meal", "mess", "dining", "kitchen", "quality"],
        refine: None,
        outcome: Classification::new(Category::HostelMess, Priority::High),
    },
    Rule {
        name: "accommodation",
        triggers: &["room", "furniture", "bed", "chair", "table"],
        refine: None,
        outcome: Classification::new(Category::HostelMess, Priority::Medium),
    },
    Rule {
        name: "login",
        triggers: &["login", "portal", "password", "access"],
        refine: None,
        outcome: Classification::new(Category::Technical, Priority::Urgent),
    },
    Rule {
        name: "network",
        triggers: &["wifi", "internet", "network", "connection"],
        refine: None,
        outcome: Classification::new(Category::Technical, Priority::Urgent),
    },
    Rule {
        name: "academic",
        triggers: &["grade", "marks", "exam", "certificate", "attendance"],
        refine: None,
        outcome: Classification::new(Category::Academic, Priority::High),
    },
    Rule {
        name: "repair",
        triggers: &["broken", "repair", "fix", "maintenance", "elevator", "lift"],
        refine: None,
        outcome: Classification::new(Category::Maintenance, Priority::Urgent),
    },
];

// --- Stages 2-4: scoring, context, selection ---

const EXACT_MATCH: f64 = 2.0;
const PARTIAL_MATCH: f64 = 0.5;

/// Score added to `label` when any trigger occurs in the text.
struct Boost<L: 'static> {
    triggers: &'static [&'static str],
    label: L,
    amount: f64,
}

const CATEGORY_BOOSTS: &[Boost<Category>] = &[
    Boost { triggers: &["hostel", "room"], label: Category::HostelMess, amount: 3.0 },
    Boost {
        triggers: &["broken", "not working", "repair", "fix"],
        label: Category::Maintenance,
        amount: 2.0,
    },
    Boost {
        triggers: &["portal", "system", "software", "computer"],
        label: Category::Technical,
        amount: 2.0,
    },
    Boost {
        triggers: &["exam", "grade", "class", "lecture"],
        label: Category::Academic,
        amount: 2.0,
    },
];

const PRIORITY_BOOSTS: &[Boost<Priority>] = &[
    Boost {
        triggers: &["urgent", "emergency", "immediately", "asap"],
        label: Priority::Urgent,
        amount: 5.0,
    },
    Boost {
        triggers: &["broken", "not working", "damaged"],
        label: Priority::Urgent,
        amount: 3.0,
    },
    Boost {
        triggers: &["important", "needed", "required", "missing"],
        label: Priority::High,
        amount: 2.0,
    },
    Boost {
        triggers: &["exam", "grade", "certificate"],
        label: Priority::High,
        amount: 2.0,
    },
];

/// Priority boosts that only apply once the category is settled.
const CATEGORY_PRIORITY_BOOSTS: &[(Category, Boost<Priority>)] = &[
    (
        Category::Maintenance,
        Boost {
            triggers: &["water", "electricity", "elevator"],
            label: Priority::Urgent,
            amount: 2.0,
        },
    ),
    (
        Category::Technical,
        Boost { triggers: &["login", "portal", "wifi"], label: Priority::Urgent, amount: 2.0 },
    ),
];

/// Scores for every label, in table order.
struct Scores<L: Label> {
    values: Vec<(L, f64)>,
}

impl<L: Label> Scores<L> {
    fn zeroed() -> Self {
        Self { values: L::TABLE_ORDER.iter().map(|l| (*l, 0.0)).collect() }
    }

    fn add(&mut self, label: L, amount: f64) {
        if let Some(slot) = self.values.iter_mut().find(|(l, _)| *l == label) {
            slot.1 += amount;
        }
    }

    fn apply_boosts(&mut self, query: &Query, boosts: &[Boost<L>]) {
        for boost in boosts {
            if query.mentions_any(boost.triggers) {
                self.add(boost.label, boost.amount);
            }
        }
    }

    /// Highest-scoring label; the earliest in table order wins ties.
    fn best(&self) -> Option<(L, f64)> {
        let mut best: Option<(L, f64)> = None;
        for &(label, score) in &self.values {
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((label, score));
            }
        }
        best
    }
}

fn category_scores(query: &Query, table: &PatternTable<Category>) -> Scores<Category> {
    let mut scores = Scores::zeroed();
    for (label, patterns) in table.iter() {
        let mut score = 0.0;
        for word in query.words.iter() {
            if patterns.iter().any(|p| p == word) {
                score += EXACT_MATCH;
            }
            for pattern in patterns {
                if word.contains(pattern.as_str()) || pattern.contains(word) {
                    score += PARTIAL_MATCH;
                }
            }
        }
        scores.add(label, score);
    }
    scores
}

fn priority_scores(query: &Query, table: &PatternTable<Priority>) -> Scores<Priority> {
    let mut scores = Scores::zeroed();
    for (label, patterns) in table.iter() {
        let hits = query
            .words
            .iter()
            .filter(|w| patterns.iter().any(|p| p == w))
            .count();
        scores.add(label, hits as f64 * EXACT_MATCH);
    }
    scores
}

/// Keyword scoring with contextual boosts. Always produces a result.
fn score(query: &Query, tables: &PatternTables) -> (Classification, Stage) {
    let mut categories = category_scores(query, &tables.categories);
    categories.apply_boosts(query, CATEGORY_BOOSTS);
    let category = categories
        .best()
        .map(|(label, _)| label)
        .unwrap_or(Category::Technical);

    let mut priorities = priority_scores(query, &tables.priorities);
    priorities.apply_boosts(query, PRIORITY_BOOSTS);
    for (only_for, boost) in CATEGORY_PRIORITY_BOOSTS {
        if *only_for == category && query.mentions_any(boost.triggers) {
            priorities.add(boost.label, boost.amount);
        }
    }
    let priority = match priorities.best() {
        Some((label, top)) if top > 0.0 => label,
        _ => Priority::Medium,
    };

    let stage = Stage::Scoring {
        category_scores: categories.values,
        priority_scores: priorities.values,
    };
    (Classification { category, priority }, stage)
}

// --- Strategy list ---

/// One way of deciding a classification. Strategies run in order until one
/// returns a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Hand-authored substring shortcuts.
    Rules,
    /// Pattern-table scoring with contextual boosts; never declines.
    Scoring,
}

impl Strategy {
    fn evaluate(self, query: &Query, tables: &PatternTables) -> Option<(Classification, Stage)> {
        match self {
            Strategy::Rules => RULES.iter().find_map(|rule| {
                rule.apply(query)
                    .map(|c| (c, Stage::Rule { rule: rule.name }))
            }),
            Strategy::Scoring => Some(score(query, tables)),
        }
    }
}

const DEFAULT_STRATEGIES: &[Strategy] = &[Strategy::Rules, Strategy::Scoring];

/// Introspection for status reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifierStatus {
    pub loaded: bool,
    pub categories: Vec<&'static str>,
    pub priorities: Vec<&'static str>,
    pub sample_count: usize,
}

/// Classification seam for callers that must tolerate failure.
pub trait Triage {
    fn triage(&self, text: &str) -> Result<Classification, TriageError>;
}

pub struct Classifier {
    tables: PatternTables,
    strategies: Vec<Strategy>,
    loaded: bool,
    sample_count: usize,
}

impl Classifier {
    /// Classifier over the given tables, with the standard strategy order.
    pub fn new(tables: PatternTables) -> Self {
        Self {
            tables,
            strategies: DEFAULT_STRATEGIES.to_vec(),
            loaded: false,
            sample_count: 0,
        }
    }

    /// Classifier over tables derived from a parsed corpus.
    pub fn from_corpus(corpus: &Corpus) -> Self {
        Self {
            loaded: true,
            sample_count: corpus.samples.len(),
            ..Self::new(PatternTables::build(&corpus.samples))
        }
    }

    /// Load the corpus at `path`; any read failure falls back to the
    /// default tables with `loaded = false`.
    pub fn from_corpus_path(path: &Path) -> Self {
        match load_corpus(path) {
            Ok(corpus) => {
                log::info!(
                    "loaded corpus {} ({} samples, {} lines skipped)",
                    path.display(),
                    corpus.samples.len(),
                    corpus.skipped
                );
                Self::from_corpus(&corpus)
            }
            Err(e) => {
                log::warn!("corpus {} unavailable ({e}), using default patterns", path.display());
                Self::new(PatternTables::defaults())
            }
        }
    }

    /// Replace the strategy list. An empty list or one without
    /// `Strategy::Scoring` still classifies: the default pair is returned
    /// when no strategy decides.
    pub fn with_strategies(mut self, strategies: Vec<Strategy>) -> Self {
        self.strategies = strategies;
        self
    }

    pub fn tables(&self) -> &PatternTables {
        &self.tables
    }

    pub fn classify(&self, text: &str) -> Classification {
        self.explain(text).classification
    }

    pub fn explain(&self, text: &str) -> Explanation {
        let query = Query::new(text);
        let (classification, stage) = self
            .strategies
            .iter()
            .find_map(|s| s.evaluate(&query, &self.tables))
            .unwrap_or((
                Classification::FALLBACK,
                Stage::Scoring { category_scores: Vec::new(), priority_scores: Vec::new() },
            ));
        log::debug!("classified as {}/{} via {stage:?}", classification.category, classification.priority);
        Explanation { classification, stage }
    }

    pub fn status(&self) -> ClassifierStatus {
        ClassifierStatus {
            loaded: self.loaded,
            categories: self.tables.categories.labels().map(Label::as_str).collect(),
            priorities: self.tables.priorities.labels().map(Label::as_str).collect(),
            sample_count: self.sample_count,
        }
    }
}

impl Triage for Classifier {
    fn triage(&self, text: &str) -> Result<Classification, TriageError> {
        Ok(self.classify(text))
    }
}

fn format_scores<L: Label>(scores: &[(L, f64)]) -> String {
    scores
        .iter()
        .map(|(label, score)| format!("{}={score}", label.as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Handle the `classify` subcommand.
pub fn handle_classify(classifier: &Classifier, args: &crate::cli::ClassifyArgs) -> Result<(), TriageError> {
    let text = args.input();
    let explanation = classifier.explain(&text);

    if args.json {
        let out = if args.explain {
            serde_json::to_string_pretty(&explanation)?
        } else {
            serde_json::to_string_pretty(&explanation.classification)?
        };
        println!("{out}");
        return Ok(());
    }

    let Classification { category, priority } = explanation.classification;
    println!("{category}\t{priority}");

    if args.explain {
        match &explanation.stage {
            Stage::Rule { rule } => println!("rule: {rule}"),
            Stage::Scoring { category_scores, priority_scores } => {
                println!("category scores: {}", format_scores(category_scores));
                println!("priority scores: {}", format_scores(priority_scores));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::TrainingSample;

    fn default_classifier() -> Classifier {
        Classifier::new(PatternTables::defaults())
    }

    fn classify(text: &str) -> (Category, Priority) {
        let c = default_classifier().classify(text);
        (c.category, c.priority)
    }

    #[test]
    fn water_rule_in_hostel() {
        assert_eq!(classify("My hostel tap is leaking"), (Category::HostelMess, Priority::Urgent));
    }

    #[test]
    fn water_rule_elsewhere() {
        assert_eq!(
            classify("Drainage overflowing near the library"),
            (Category::Maintenance, Priority::Urgent)
        );
    }

    #[test]
    fn electrical_rule_both_branches() {
        assert_eq!(classify("No power in my room"), (Category::HostelMess, Priority::Urgent));
        assert_eq!(classify("Bulb fused in corridor"), (Category::Maintenance, Priority::High));
    }

    #[test]
    fn repair_rule() {
        assert_eq!(
            classify("The elevator is broken and needs repair"),
            (Category::Maintenance, Priority::Urgent)
        );
    }

    #[test]
    fn login_rule() {
        assert_eq!(classify("forgot my password"), (Category::Technical, Priority::Urgent));
        let e = default_classifier().explain("forgot my password");
        assert_eq!(e.stage, Stage::Rule { rule: "login" });
    }

    #[test]
    fn rules_are_evaluated_in_order() {
        // "mess" (food rule) beats "login" (later rule).
        assert_eq!(classify("mess login problem"), (Category::HostelMess, Priority::High));
        // "grade" (academic) vs "broken": academic comes first.
        assert_eq!(classify("grade sheet broken"), (Category::Academic, Priority::High));
    }

    #[test]
    fn rule_triggers_match_inside_words() {
        // "stable" contains "table".
        assert_eq!(classify("stable"), (Category::HostelMess, Priority::Medium));
    }

    #[test]
    fn explain_names_the_rule() {
        let e = default_classifier().explain("wifi is down");
        assert_eq!(e.stage, Stage::Rule { rule: "network" });
        assert_eq!(e.classification, Classification::new(Category::Technical, Priority::Urgent));
    }

    #[test]
    fn empty_text_defaults() {
        assert_eq!(classify(""), (Category::Technical, Priority::Medium));
        assert_eq!(classify("   "), (Category::Technical, Priority::Medium));
        assert_eq!(classify("?!.,;"), (Category::Technical, Priority::Medium));
    }

    #[test]
    fn scoring_path_urgent_keyword() {
        // No rule trigger; "urgent" is an exact priority pattern (+2) and a
        // context boost (+5); "software" boosts Technical.
        let e = default_classifier().explain("urgent software crash");
        assert_eq!(e.classification, Classification::new(Category::Technical, Priority::Urgent));
        assert!(matches!(e.stage, Stage::Scoring { .. }));
    }

    #[test]
    fn scoring_exact_and_partial_credit() {
        let tables = PatternTables::defaults();
        let query = Query::new("lms");
        let scores = category_scores(&query, &tables.categories);
        // exact +2, "lms" ⊆ "lms" +0.5
        assert_eq!(scores.values[0], (Category::Technical, 2.5));

        let query = Query::new("emails");
        let scores = category_scores(&query, &tables.categories);
        // no exact, "email" ⊆ "emails" +0.5
        assert_eq!(scores.values[0], (Category::Technical, 0.5));
    }

    #[test]
    fn priority_scoring_has_no_partial_credit() {
        let tables = PatternTables::defaults();
        let scores = priority_scores(&Query::new("weekly"), &tables.priorities);
        assert!(scores.values.iter().all(|(_, s)| *s == 0.0));
        let scores = priority_scores(&Query::new("week week"), &tables.priorities);
        assert!(scores.values.contains(&(Priority::Medium, 4.0)));
    }

    #[test]
    fn scoring_without_signal_defaults() {
        assert_eq!(
            classify("something happened yesterday"),
            (Category::Technical, Priority::Medium)
        );
    }

    #[test]
    fn category_context_for_priority() {
        // Only the scoring strategy, so "portal" cannot short-circuit.
        let c = default_classifier().with_strategies(vec![Strategy::Scoring]);
        assert_eq!(
            c.classify("portal outage"),
            Classification::new(Category::Technical, Priority::Urgent)
        );
        // Academic wins the category, so "portal" no longer lifts priority.
        assert_eq!(
            c.classify("lecture lecture portal"),
            Classification::new(Category::Academic, Priority::Medium)
        );
        // Equal category scores resolve to the earlier label.
        assert_eq!(c.classify("lecture portal").category, Category::Technical);
    }

    #[test]
    fn not_working_boost_on_scoring_path() {
        let c = default_classifier().with_strategies(vec![Strategy::Scoring]);
        let e = c.explain("printer not working");
        assert_eq!(e.classification.priority, Priority::Urgent);
        assert_eq!(e.classification.category, Category::Maintenance);
    }

    #[test]
    fn priority_tie_prefers_urgent() {
        // "critical" (urgent) and "cleaning" (low) both score 2.
        let c = default_classifier().with_strategies(vec![Strategy::Scoring]);
        assert_eq!(c.classify("critical cleaning").priority, Priority::Urgent);
    }

    #[test]
    fn empty_strategy_list_still_classifies() {
        let c = default_classifier().with_strategies(Vec::new());
        assert_eq!(c.classify("wifi"), Classification::FALLBACK);
    }

    #[test]
    fn deterministic() {
        let c = default_classifier();
        let text = "Projector in class is not working, urgent";
        assert_eq!(c.classify(text), c.classify(text));
        assert_eq!(c.explain(text), c.explain(text));
    }

    #[test]
    fn total_over_odd_input() {
        let c = default_classifier();
        let long = "lorem ipsum dolor ".repeat(5000);
        for text in ["", " ", "\n\t", "!!!", "日本語のテキスト", long.as_str()] {
            let r = c.classify(text);
            assert!(Category::TABLE_ORDER.contains(&r.category));
            assert!(Priority::TABLE_ORDER.contains(&r.priority));
        }
    }

    #[test]
    fn corpus_tables_drive_scoring() {
        let samples: Vec<TrainingSample> = (0..5)
            .map(|_| TrainingSample {
                query: "printer jammed".into(),
                category: "Academic".into(),
                priority: "low".into(),
            })
            .collect();
        let c = Classifier::from_corpus(&Corpus { samples, skipped: 0 });
        assert_eq!(
            c.classify("printer jammed again"),
            Classification::new(Category::Academic, Priority::Low)
        );
    }

    #[test]
    fn status_for_defaults_and_corpus() {
        let s = default_classifier().status();
        assert!(!s.loaded);
        assert_eq!(s.categories, ["Technical", "Academic", "Hostel/Mess", "Maintenance"]);
        assert_eq!(s.priorities, ["urgent", "high", "medium", "low"]);
        assert_eq!(s.sample_count, 0);

        let empty = Classifier::from_corpus(&Corpus::default());
        let s = empty.status();
        assert!(s.loaded);
        assert_eq!(s.sample_count, 0);
        assert_eq!(s.categories.len(), 4);
    }

    #[test]
    fn status_serializes_camel_case() {
        let json = serde_json::to_value(default_classifier().status()).unwrap();
        assert_eq!(json["sampleCount"], 0);
        assert_eq!(json["loaded"], false);
    }

    #[test]
    fn missing_corpus_path_uses_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let c = Classifier::from_corpus_path(&dir.path().join("missing.csv"));
        assert!(!c.status().loaded);
        assert_eq!(c.tables(), &PatternTables::defaults());
    }

    #[test]
    fn shared_across_threads() {
        let c = default_classifier();
        let texts = ["My hostel tap is leaking", "", "urgent software crash", "exam marks"];
        let expected: Vec<Classification> = texts.iter().map(|t| c.classify(t)).collect();
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    let got: Vec<Classification> = texts.iter().map(|t| c.classify(t)).collect();
                    assert_eq!(got, expected);
                });
            }
        });
    }
}
