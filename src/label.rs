//! Fixed label sets: complaint category and priority.

use serde::{Deserialize, Serialize};

/// A closed set of labels with a fixed iteration order.
///
/// For pattern-table labels `TABLE_ORDER` is also the scoring tie-break order.
pub trait Label: Copy + Eq + std::fmt::Debug + 'static {
    const TABLE_ORDER: &'static [Self];

    fn as_str(self) -> &'static str;

    /// Parse a label as written in the corpus or on the command line.
    fn parse(raw: &str) -> Option<Self>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Technical,
    Academic,
    #[serde(rename = "Hostel/Mess")]
    HostelMess,
    Maintenance,
}

impl Label for Category {
    const TABLE_ORDER: &'static [Self] = &[
        Category::Technical,
        Category::Academic,
        Category::HostelMess,
        Category::Maintenance,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Category::Technical => "Technical",
            Category::Academic => "Academic",
            Category::HostelMess => "Hostel/Mess",
            Category::Maintenance => "Maintenance",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::TABLE_ORDER
            .iter()
            .copied()
            .find(|c| c.as_str().eq_ignore_ascii_case(raw))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Label for Priority {
    // Most urgent first: equal scores resolve toward the more urgent label.
    const TABLE_ORDER: &'static [Self] = &[
        Priority::Urgent,
        Priority::High,
        Priority::Medium,
        Priority::Low,
    ];

    fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::TABLE_ORDER
            .iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(raw))
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Lifecycle state of a stored complaint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintStatus {
    Pending,
    InProgress,
    Resolved,
    Closed,
}

impl Label for ComplaintStatus {
    const TABLE_ORDER: &'static [Self] = &[
        ComplaintStatus::Pending,
        ComplaintStatus::InProgress,
        ComplaintStatus::Resolved,
        ComplaintStatus::Closed,
    ];

    fn as_str(self) -> &'static str {
        match self {
            ComplaintStatus::Pending => "pending",
            ComplaintStatus::InProgress => "in_progress",
            ComplaintStatus::Resolved => "resolved",
            ComplaintStatus::Closed => "closed",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::TABLE_ORDER
            .iter()
            .copied()
            .find(|s| s.as_str().eq_ignore_ascii_case(raw))
    }
}

impl ComplaintStatus {
    /// Whether entering this status stamps `resolved_at`.
    pub fn is_terminal(self) -> bool {
        matches!(self, ComplaintStatus::Resolved | ComplaintStatus::Closed)
    }
}

impl std::fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}
