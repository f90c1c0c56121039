pub mod classify;
pub mod cli;
pub mod complaints;
pub mod config;
pub mod corpus;
pub mod db;
pub mod intake;
pub mod label;
pub mod patterns;
pub mod schema;
pub mod status;
pub mod store;
pub mod words;

#[derive(Debug)]
pub enum TriageError {
    Database(rusqlite::Error),
    Io(std::io::Error),
    Json(serde_json::Error),
    Config(String),
    NotFound(String),
    Conflict(String),
}

impl std::fmt::Display for TriageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TriageError::Database(e) => write!(f, "database: {e}"),
            TriageError::Io(e) => write!(f, "io: {e}"),
            TriageError::Json(e) => write!(f, "json: {e}"),
            TriageError::Config(msg) => write!(f, "config: {msg}"),
            TriageError::NotFound(msg) => write!(f, "not found: {msg}"),
            TriageError::Conflict(msg) => write!(f, "conflict: {msg}"),
        }
    }
}

impl std::error::Error for TriageError {}

impl From<rusqlite::Error> for TriageError {
    fn from(e: rusqlite::Error) -> Self {
        TriageError::Database(e)
    }
}

impl From<std::io::Error> for TriageError {
    fn from(e: std::io::Error) -> Self {
        TriageError::Io(e)
    }
}

impl From<serde_json::Error> for TriageError {
    fn from(e: serde_json::Error) -> Self {
        TriageError::Json(e)
    }
}

impl From<rusqlite_migration::Error> for TriageError {
    fn from(e: rusqlite_migration::Error) -> Self {
        match e {
            rusqlite_migration::Error::RusqliteError { query: _, err } => TriageError::Database(err),
            other => TriageError::Config(format!("migration: {other}")),
        }
    }
}
