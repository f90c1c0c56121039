//! Complaint intake: classify, assign a ticket, persist.

use crate::classify::{Classification, Triage};
use crate::store::{ClassifiedBy, Complaint, ComplaintStore, NewComplaint};
use crate::TriageError;
use std::time::{SystemTime, UNIX_EPOCH};

const TICKET_PREFIX: &str = "CMP";
const TICKET_SUFFIX_LEN: usize = 4;
const TICKET_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const MAX_TICKET_ATTEMPTS: usize = 5;
const MIN_TITLE_CHARS: usize = 5;
const MIN_DESCRIPTION_CHARS: usize = 10;

/// A complaint as submitted, before classification.
#[derive(Debug, Clone)]
pub struct Submission {
    pub user_id: i64,
    pub title: String,
    pub description: String,
}

pub fn now_epoch() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Convert days since 1970-01-01 to (year, month, day).
/// Algorithm from Howard Hinnant's chrono-compatible date library.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = (z - era * 146097) as u32;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { y + 1 } else { y };
    (y, m, d)
}

/// `YYYY-MM-DD` (UTC) for an epoch timestamp.
pub fn format_epoch_date(epoch_secs: i64) -> String {
    let (y, m, d) = civil_from_days(epoch_secs.div_euclid(86400));
    format!("{y:04}-{m:02}-{d:02}")
}

/// `len` random `[A-Z0-9]` characters from /dev/urandom.
fn random_suffix(len: usize) -> Result<String, TriageError> {
    let mut buf = vec![0u8; len];
    let mut file = std::fs::File::open("/dev/urandom")?;
    std::io::Read::read_exact(&mut file, &mut buf)?;
    Ok(buf
        .iter()
        .map(|b| TICKET_ALPHABET[*b as usize % TICKET_ALPHABET.len()] as char)
        .collect())
}

/// `CMP` + `YYYYMMDD` + 4 random characters.
pub fn generate_ticket_id(epoch_secs: i64) -> Result<String, TriageError> {
    let date = format_epoch_date(epoch_secs).replace('-', "");
    Ok(format!("{TICKET_PREFIX}{date}{}", random_suffix(TICKET_SUFFIX_LEN)?))
}

/// Classify through the seam, substituting the fallback pair on error.
pub fn classify_or_fallback(triage: &dyn Triage, text: &str) -> (Classification, ClassifiedBy) {
    match triage.triage(text) {
        Ok(c) => (c, ClassifiedBy::Classifier),
        Err(e) => {
            log::warn!(
                "classification failed ({e}), using {}/{}",
                Classification::FALLBACK.category,
                Classification::FALLBACK.priority
            );
            (Classification::FALLBACK, ClassifiedBy::Fallback)
        }
    }
}

/// Classify and store a submission. Returns the stored complaint.
pub fn submit(
    triage: &dyn Triage,
    store: &dyn ComplaintStore,
    submission: &Submission,
    now: i64,
) -> Result<Complaint, TriageError> {
    let title = submission.title.trim();
    let description = submission.description.trim();
    if title.is_empty() || description.is_empty() {
        return Err(TriageError::Config("title and description are required".into()));
    }
    if title.chars().count() < MIN_TITLE_CHARS
        || description.chars().count() < MIN_DESCRIPTION_CHARS
    {
        return Err(TriageError::Config(format!(
            "title must be at least {MIN_TITLE_CHARS} characters and description at least {MIN_DESCRIPTION_CHARS}"
        )));
    }

    let (classification, classified_by) =
        classify_or_fallback(triage, &format!("{title} {description}"));

    let mut new = NewComplaint {
        ticket_id: String::new(),
        user_id: submission.user_id,
        title: title.to_string(),
        description: description.to_string(),
        category: classification.category,
        priority: classification.priority,
        classified_by,
        created_at: now,
    };

    let mut last_err = None;
    for _ in 0..MAX_TICKET_ATTEMPTS {
        new.ticket_id = generate_ticket_id(now)?;
        match store.insert(&new) {
            Ok(c) => {
                log::info!(
                    "stored {} as {}/{}",
                    c.ticket_id,
                    c.category,
                    c.priority
                );
                return Ok(c);
            }
            Err(TriageError::Conflict(msg)) => {
                log::debug!("{msg}, retrying with a new ticket id");
                last_err = Some(TriageError::Conflict(msg));
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_err.unwrap_or_else(|| TriageError::Conflict("no ticket id available".into())))
}

/// Handle the `submit` subcommand.
pub fn handle_submit(
    triage: &dyn Triage,
    store: &dyn ComplaintStore,
    args: &crate::cli::SubmitArgs,
) -> Result<(), TriageError> {
    let submission = Submission {
        user_id: args.user_id,
        title: args.title.clone(),
        description: args.description.clone(),
    };
    let complaint = submit(triage, store, &submission, now_epoch())?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&complaint)?);
    } else {
        println!(
            "{}\t{}\t{}\t{}",
            complaint.ticket_id, complaint.category, complaint.priority, complaint.status
        );
    }
    Ok(())
}
