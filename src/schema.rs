use rusqlite_migration::{M, Migrations};
use std::sync::LazyLock;

pub static MIGRATIONS: LazyLock<Migrations<'static>> = LazyLock::new(|| {
    Migrations::new(vec![
        M::up(
            "
CREATE TABLE complaints (
    id              INTEGER PRIMARY KEY,
    ticket_id       TEXT NOT NULL UNIQUE,
    user_id         INTEGER NOT NULL,
    title           TEXT NOT NULL,
    description     TEXT NOT NULL,
    category        TEXT NOT NULL,
    priority        TEXT NOT NULL,
    status          TEXT NOT NULL DEFAULT 'pending',
    created_at      INTEGER NOT NULL,
    updated_at      INTEGER NOT NULL,
    resolved_at     INTEGER,
    admin_response  TEXT
);

CREATE INDEX idx_complaints_created ON complaints(created_at);
CREATE INDEX idx_complaints_status ON complaints(status);
CREATE INDEX idx_complaints_user ON complaints(user_id, created_at);
",
        ),
        M::up(
            "
ALTER TABLE complaints ADD COLUMN classified_by TEXT NOT NULL DEFAULT 'classifier';
",
        ),
        M::up(
            "
CREATE TABLE complaint_feedback (
    id              INTEGER PRIMARY KEY,
    complaint_id    INTEGER NOT NULL UNIQUE REFERENCES complaints(id) ON DELETE CASCADE,
    rating          INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
    feedback_text   TEXT,
    submitted_at    INTEGER NOT NULL
);
",
        ),
    ])
});
