//! Complaint persistence: the `ComplaintStore` seam and its SQLite backing.

use crate::label::{Category, ComplaintStatus, Label, Priority};
use crate::TriageError;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;

pub const DEFAULT_LIST_LIMIT: i64 = 20;
pub const MAX_LIST_LIMIT: i64 = 100;

/// Where a stored classification came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifiedBy {
    Classifier,
    Fallback,
}

impl ClassifiedBy {
    pub fn as_str(self) -> &'static str {
        match self {
            ClassifiedBy::Classifier => "classifier",
            ClassifiedBy::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Complaint {
    pub id: i64,
    pub ticket_id: String,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub priority: Priority,
    pub status: ComplaintStatus,
    pub classified_by: ClassifiedBy,
    pub created_at: i64,
    pub updated_at: i64,
    pub resolved_at: Option<i64>,
    pub admin_response: Option<String>,
}

/// A classified complaint ready to persist.
#[derive(Debug, Clone)]
pub struct NewComplaint {
    pub ticket_id: String,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub priority: Priority,
    pub classified_by: ClassifiedBy,
    pub created_at: i64,
}

#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    pub status: Option<ComplaintStatus>,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub user_id: Option<i64>,
    /// Case-insensitive substring of title, description, or ticket id.
    pub search: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelCount {
    pub label: &'static str,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub total: i64,
    pub status: Vec<LabelCount>,
    pub category: Vec<LabelCount>,
    pub priority: Vec<LabelCount>,
}

/// Ratings accepted on feedback, in stars.
pub const RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// Submitter's rating of how a resolved complaint was handled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feedback {
    pub ticket_id: String,
    pub rating: u8,
    pub feedback_text: Option<String>,
    pub submitted_at: i64,
}

#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub ticket_id: String,
    pub rating: u8,
    pub feedback_text: Option<String>,
    pub submitted_at: i64,
}

pub trait ComplaintStore {
    /// Persist a new complaint. A duplicate ticket id is `TriageError::Conflict`.
    fn insert(&self, new: &NewComplaint) -> Result<Complaint, TriageError>;

    fn get(&self, ticket_id: &str) -> Result<Option<Complaint>, TriageError>;

    /// Matching complaints, newest first.
    fn list(&self, filter: &ListFilter) -> Result<Vec<Complaint>, TriageError>;

    fn update_status(
        &self,
        ticket_id: &str,
        status: ComplaintStatus,
        admin_response: Option<&str>,
        now: i64,
    ) -> Result<Complaint, TriageError>;

    /// Counts over every complaint, or only those of `user_id`.
    fn stats(&self, user_id: Option<i64>) -> Result<Stats, TriageError>;

    /// Record feedback on a resolved or closed complaint, at most once.
    /// A second submission is `TriageError::Conflict`.
    fn add_feedback(&self, feedback: &NewFeedback) -> Result<Feedback, TriageError>;

    /// Feedback for a complaint; `None` if none was given. An unknown ticket
    /// is `TriageError::NotFound`.
    fn feedback(&self, ticket_id: &str) -> Result<Option<Feedback>, TriageError>;
}

// --- SQL column conversions ---

fn unknown(kind: &str, raw: &str) -> FromSqlError {
    FromSqlError::Other(format!("unknown {kind} {raw:?}").into())
}

impl ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Category {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_str()?;
        Category::parse(raw).ok_or_else(|| unknown("category", raw))
    }
}

impl ToSql for Priority {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Priority {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_str()?;
        Priority::parse(raw).ok_or_else(|| unknown("priority", raw))
    }
}

impl ToSql for ComplaintStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ComplaintStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_str()?;
        ComplaintStatus::parse(raw).ok_or_else(|| unknown("status", raw))
    }
}

impl ToSql for ClassifiedBy {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ClassifiedBy {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "classifier" => Ok(ClassifiedBy::Classifier),
            "fallback" => Ok(ClassifiedBy::Fallback),
            other => Err(unknown("classification source", other)),
        }
    }
}

// --- SQLite implementation ---

const COLUMNS: &str = "id, ticket_id, user_id, title, description, category, priority, status,
     classified_by, created_at, updated_at, resolved_at, admin_response";

fn complaint_from_row(r: &Row<'_>) -> rusqlite::Result<Complaint> {
    Ok(Complaint {
        id: r.get(0)?,
        ticket_id: r.get(1)?,
        user_id: r.get(2)?,
        title: r.get(3)?,
        description: r.get(4)?,
        category: r.get(5)?,
        priority: r.get(6)?,
        status: r.get(7)?,
        classified_by: r.get(8)?,
        created_at: r.get(9)?,
        updated_at: r.get(10)?,
        resolved_at: r.get(11)?,
        admin_response: r.get(12)?,
    })
}

/// Escape LIKE wildcards so the search term matches literally.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    fn count_by<L: Label + ToSql>(
        &self,
        column: &str,
        labels: &[L],
        user_id: Option<i64>,
    ) -> Result<Vec<LabelCount>, TriageError> {
        let sql = format!(
            "SELECT COUNT(*) FROM complaints WHERE {column} = ?1 AND (?2 IS NULL OR user_id = ?2)"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        labels
            .iter()
            .map(|label| -> Result<LabelCount, TriageError> {
                let count: i64 = stmt.query_row(params![label, user_id], |r| r.get(0))?;
                Ok(LabelCount { label: label.as_str(), count })
            })
            .collect()
    }
}

impl ComplaintStore for SqliteStore {
    fn insert(&self, new: &NewComplaint) -> Result<Complaint, TriageError> {
        let inserted = self.conn.execute(
            "INSERT INTO complaints
                (ticket_id, user_id, title, description, category, priority, status,
                 classified_by, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
            params![
                new.ticket_id,
                new.user_id,
                new.title,
                new.description,
                new.category,
                new.priority,
                ComplaintStatus::Pending,
                new.classified_by,
                new.created_at,
            ],
        );

        match inserted {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(TriageError::Conflict(format!("ticket {} already exists", new.ticket_id)));
            }
            Err(e) => return Err(e.into()),
        }

        let id = self.conn.last_insert_rowid();
        Ok(Complaint {
            id,
            ticket_id: new.ticket_id.clone(),
            user_id: new.user_id,
            title: new.title.clone(),
            description: new.description.clone(),
            category: new.category,
            priority: new.priority,
            status: ComplaintStatus::Pending,
            classified_by: new.classified_by,
            created_at: new.created_at,
            updated_at: new.created_at,
            resolved_at: None,
            admin_response: None,
        })
    }

    fn get(&self, ticket_id: &str) -> Result<Option<Complaint>, TriageError> {
        let sql = format!("SELECT {COLUMNS} FROM complaints WHERE ticket_id = ?1");
        let found = self
            .conn
            .query_row(&sql, [ticket_id], complaint_from_row)
            .optional()?;
        Ok(found)
    }

    fn list(&self, filter: &ListFilter) -> Result<Vec<Complaint>, TriageError> {
        let limit = filter
            .limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT);
        let search = filter.search.as_deref().map(like_pattern);

        let sql = format!(
            "SELECT {COLUMNS} FROM complaints
             WHERE (?1 IS NULL OR status = ?1)
               AND (?2 IS NULL OR category = ?2)
               AND (?3 IS NULL OR priority = ?3)
               AND (?6 IS NULL OR user_id = ?6)
               AND (?4 IS NULL
                    OR title LIKE ?4 ESCAPE '\\'
                    OR description LIKE ?4 ESCAPE '\\'
                    OR ticket_id LIKE ?4 ESCAPE '\\')
             ORDER BY created_at DESC, id DESC
             LIMIT ?5"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                params![filter.status, filter.category, filter.priority, search, limit, filter.user_id],
                complaint_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn update_status(
        &self,
        ticket_id: &str,
        status: ComplaintStatus,
        admin_response: Option<&str>,
        now: i64,
    ) -> Result<Complaint, TriageError> {
        let response = admin_response.map(str::trim).filter(|r| !r.is_empty());
        let resolved_at = status.is_terminal().then_some(now);

        let changed = self.conn.execute(
            "UPDATE complaints
             SET status = ?1,
                 updated_at = ?2,
                 admin_response = COALESCE(?3, admin_response),
                 resolved_at = COALESCE(?4, resolved_at)
             WHERE ticket_id = ?5",
            params![status, now, response, resolved_at, ticket_id],
        )?;
        if changed == 0 {
            return Err(TriageError::NotFound(format!("ticket {ticket_id}")));
        }

        self.get(ticket_id)?
            .ok_or_else(|| TriageError::NotFound(format!("ticket {ticket_id}")))
    }

    fn stats(&self, user_id: Option<i64>) -> Result<Stats, TriageError> {
        let total: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM complaints WHERE ?1 IS NULL OR user_id = ?1",
            [user_id],
            |r| r.get(0),
        )?;
        Ok(Stats {
            total,
            status: self.count_by("status", ComplaintStatus::TABLE_ORDER, user_id)?,
            category: self.count_by("category", Category::TABLE_ORDER, user_id)?,
            priority: self.count_by("priority", Priority::TABLE_ORDER, user_id)?,
        })
    }

    fn add_feedback(&self, new: &NewFeedback) -> Result<Feedback, TriageError> {
        if !RATING_RANGE.contains(&new.rating) {
            return Err(TriageError::Config(format!(
                "rating must be between {} and {}",
                RATING_RANGE.start(),
                RATING_RANGE.end()
            )));
        }
        let complaint = self
            .get(&new.ticket_id)?
            .ok_or_else(|| TriageError::NotFound(format!("ticket {}", new.ticket_id)))?;
        if !complaint.status.is_terminal() {
            return Err(TriageError::Config(format!(
                "feedback can only be given on resolved or closed complaints ({} is {})",
                complaint.ticket_id, complaint.status
            )));
        }

        let text = new
            .feedback_text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty());
        let inserted = self.conn.execute(
            "INSERT INTO complaint_feedback (complaint_id, rating, feedback_text, submitted_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![complaint.id, new.rating, text, new.submitted_at],
        );
        match inserted {
            Ok(_) => Ok(Feedback {
                ticket_id: complaint.ticket_id,
                rating: new.rating,
                feedback_text: text.map(String::from),
                submitted_at: new.submitted_at,
            }),
            Err(e) if is_unique_violation(&e) => Err(TriageError::Conflict(format!(
                "feedback already submitted for {}",
                complaint.ticket_id
            ))),
            Err(e) => Err(e.into()),
        }
    }

    fn feedback(&self, ticket_id: &str) -> Result<Option<Feedback>, TriageError> {
        if self.get(ticket_id)?.is_none() {
            return Err(TriageError::NotFound(format!("ticket {ticket_id}")));
        }
        let found = self
            .conn
            .query_row(
                "SELECT c.ticket_id, f.rating, f.feedback_text, f.submitted_at
                 FROM complaint_feedback f
                 JOIN complaints c ON c.id = f.complaint_id
                 WHERE c.ticket_id = ?1",
                [ticket_id],
                |r| {
                    Ok(Feedback {
                        ticket_id: r.get(0)?,
                        rating: r.get(1)?,
                        feedback_text: r.get(2)?,
                        submitted_at: r.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(found)
    }
}
