use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use triage::TriageError;
use triage::classify::{Classifier, handle_classify};
use triage::cli::{Cli, Command};
use triage::complaints::{handle_feedback, handle_list, handle_show, handle_stats, handle_update};
use triage::config::load_config;
use triage::corpus::resolve_corpus_path;
use triage::db::{default_db_path, open_db, open_db_readonly};
use triage::intake::handle_submit;
use triage::status::handle_status;
use triage::store::SqliteStore;

fn readonly_store(db_path: &Path) -> Result<Option<SqliteStore>, TriageError> {
    if !db_path.exists() {
        eprintln!("triage: no database at {}", db_path.display());
        return Ok(None);
    }
    Ok(Some(SqliteStore::new(open_db_readonly(db_path)?)))
}

/// Read-write store for commands addressing one ticket; no database means
/// no such ticket.
fn existing_store(db_path: &Path, ticket: &str) -> Result<SqliteStore, TriageError> {
    if !db_path.exists() {
        return Err(TriageError::NotFound(format!("ticket {}", ticket.trim())));
    }
    Ok(SqliteStore::new(open_db(db_path)?))
}

fn run() -> Result<(), TriageError> {
    let cli = Cli::parse();
    let config = load_config()?;

    let db_path: PathBuf = cli
        .db
        .or(config.store.path)
        .unwrap_or_else(default_db_path);
    let corpus_path = resolve_corpus_path(cli.corpus.as_deref(), config.corpus.path.as_deref());

    match cli.command {
        Command::Classify(args) => {
            let classifier = Classifier::from_corpus_path(&corpus_path);
            handle_classify(&classifier, &args)
        }
        Command::Status(args) => {
            let classifier = Classifier::from_corpus_path(&corpus_path);
            handle_status(&classifier, &corpus_path, args.json)
        }
        Command::Submit(args) => {
            let classifier = Classifier::from_corpus_path(&corpus_path);
            let store = SqliteStore::new(open_db(&db_path)?);
            handle_submit(&classifier, &store, &args)
        }
        Command::List(args) => match readonly_store(&db_path)? {
            Some(store) => handle_list(&store, &args),
            None => Ok(()),
        },
        // Read-write: older databases pick up the feedback table here.
        Command::Show(args) => {
            let store = existing_store(&db_path, &args.ticket)?;
            handle_show(&store, &args)
        }
        Command::Update(args) => {
            let store = existing_store(&db_path, &args.ticket)?;
            handle_update(&store, &args)
        }
        Command::Feedback(args) => {
            let store = existing_store(&db_path, &args.ticket)?;
            handle_feedback(&store, &args)
        }
        Command::Stats(args) => match readonly_store(&db_path)? {
            Some(store) => handle_stats(&store, &args),
            None => Ok(()),
        },
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("TRIAGE_LOG", "warn"))
        .format_timestamp(None)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("triage: {e}");
            ExitCode::from(1)
        }
    }
}
