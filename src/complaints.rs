//! `list`, `show`, `update`, `stats`, `feedback` subcommands over a `ComplaintStore`.

use crate::cli::{FeedbackArgs, ListArgs, ShowArgs, StatsArgs, UpdateArgs};
use crate::intake::{format_epoch_date, now_epoch};
use crate::label::{Category, ComplaintStatus, Label, Priority};
use crate::store::{Complaint, ComplaintStore, Feedback, LabelCount, ListFilter, NewFeedback};
use crate::TriageError;
use serde::Serialize;

fn parse_label<L: Label>(kind: &str, raw: Option<&str>) -> Result<Option<L>, TriageError> {
    match raw {
        None => Ok(None),
        Some(raw) => L::parse(raw).map(Some).ok_or_else(|| {
            let expected: Vec<&str> = L::TABLE_ORDER.iter().map(|l| l.as_str()).collect();
            TriageError::Config(format!(
                "invalid --{kind}: {raw:?} (expected one of {})",
                expected.join(", ")
            ))
        }),
    }
}

pub fn filter_from_args(args: &ListArgs) -> Result<ListFilter, TriageError> {
    Ok(ListFilter {
        status: parse_label::<ComplaintStatus>("status", args.status.as_deref())?,
        category: parse_label::<Category>("category", args.category.as_deref())?,
        priority: parse_label::<Priority>("priority", args.priority.as_deref())?,
        user_id: args.user_id,
        search: args.search.clone().filter(|s| !s.trim().is_empty()),
        limit: Some(args.limit),
    })
}

fn print_row(c: &Complaint) {
    println!(
        "{}  {}  {:<11}  {:<6}  {:<11}  {}",
        c.ticket_id,
        format_epoch_date(c.created_at),
        c.category,
        c.priority,
        c.status,
        truncate(&c.title, 60)
    );
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

fn print_detail(c: &Complaint) {
    println!("ticket       {}", c.ticket_id);
    println!("title        {}", c.title);
    println!("category     {} (by {})", c.category, c.classified_by.as_str());
    println!("priority     {}", c.priority);
    println!("status       {}", c.status);
    println!("user         {}", c.user_id);
    println!("created      {}", format_epoch_date(c.created_at));
    println!("updated      {}", format_epoch_date(c.updated_at));
    if let Some(ts) = c.resolved_at {
        println!("resolved     {}", format_epoch_date(ts));
    }
    if let Some(resp) = &c.admin_response {
        println!("response     {resp}");
    }
    println!();
    println!("{}", c.description);
}

fn print_feedback(f: &Feedback) {
    println!("rating       {}/5 ({})", f.rating, format_epoch_date(f.submitted_at));
    if let Some(text) = &f.feedback_text {
        println!("feedback     {text}");
    }
}

/// `show --json` output: the complaint plus any feedback on it.
#[derive(Serialize)]
struct ComplaintDetail {
    #[serde(flatten)]
    complaint: Complaint,
    feedback: Option<Feedback>,
}

pub fn handle_list(store: &dyn ComplaintStore, args: &ListArgs) -> Result<(), TriageError> {
    let filter = filter_from_args(args)?;
    let complaints = store.list(&filter)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&complaints)?);
        return Ok(());
    }

    if complaints.is_empty() {
        eprintln!("triage: no complaints match");
        return Ok(());
    }
    for c in &complaints {
        print_row(c);
    }
    Ok(())
}

pub fn handle_show(store: &dyn ComplaintStore, args: &ShowArgs) -> Result<(), TriageError> {
    let complaint = store
        .get(args.ticket.trim())?
        .ok_or_else(|| TriageError::NotFound(format!("ticket {}", args.ticket.trim())))?;
    let feedback = store.feedback(&complaint.ticket_id)?;

    if args.json {
        let detail = ComplaintDetail { complaint, feedback };
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }

    print_detail(&complaint);
    if let Some(f) = &feedback {
        println!();
        print_feedback(f);
    }
    Ok(())
}

pub fn handle_update(store: &dyn ComplaintStore, args: &UpdateArgs) -> Result<(), TriageError> {
    let status = parse_label::<ComplaintStatus>("status", Some(args.status.as_str()))?
        .ok_or_else(|| TriageError::Config("--status is required".into()))?;
    let complaint = store.update_status(
        args.ticket.trim(),
        status,
        args.response.as_deref(),
        now_epoch(),
    )?;
    log::info!("{} is now {}", complaint.ticket_id, complaint.status);
    println!("{}\t{}", complaint.ticket_id, complaint.status);
    Ok(())
}

fn format_counts(counts: &[LabelCount]) -> String {
    counts
        .iter()
        .map(|c| format!("{}: {}", c.label, c.count))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn handle_stats(store: &dyn ComplaintStore, args: &StatsArgs) -> Result<(), TriageError> {
    let stats = store.stats(args.user_id)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("complaints  {}", stats.total);
    println!("status      {}", format_counts(&stats.status));
    println!("category    {}", format_counts(&stats.category));
    println!("priority    {}", format_counts(&stats.priority));
    Ok(())
}

/// Record feedback when `--rating` is given, otherwise print what is stored.
pub fn handle_feedback(store: &dyn ComplaintStore, args: &FeedbackArgs) -> Result<(), TriageError> {
    let ticket = args.ticket.trim();
    let feedback = match args.rating {
        Some(rating) => {
            let f = store.add_feedback(&NewFeedback {
                ticket_id: ticket.to_string(),
                rating,
                feedback_text: args.text.clone(),
                submitted_at: now_epoch(),
            })?;
            log::info!("{} rated {}/5", f.ticket_id, f.rating);
            Some(f)
        }
        None => store.feedback(ticket)?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&feedback)?);
        return Ok(());
    }
    match &feedback {
        Some(f) => print_feedback(f),
        None => eprintln!("triage: no feedback for {ticket}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list_args() -> ListArgs {
        ListArgs {
            status: None,
            category: None,
            priority: None,
            user_id: None,
            search: None,
            limit: 20,
            json: false,
        }
    }

    #[test]
    fn filter_parses_labels() {
        let args = ListArgs {
            status: Some("in_progress".into()),
            category: Some("hostel/mess".into()),
            priority: Some("High".into()),
            ..list_args()
        };
        let f = filter_from_args(&args).unwrap();
        assert_eq!(f.status, Some(ComplaintStatus::InProgress));
        assert_eq!(f.category, Some(Category::HostelMess));
        assert_eq!(f.priority, Some(Priority::High));
    }

    #[test]
    fn filter_carries_user() {
        let args = ListArgs { user_id: Some(42), ..list_args() };
        assert_eq!(filter_from_args(&args).unwrap().user_id, Some(42));
    }

    #[test]
    fn filter_rejects_unknown_label() {
        let args = ListArgs { category: Some("Sports".into()), ..list_args() };
        let err = filter_from_args(&args).unwrap_err();
        assert!(err.to_string().contains("Hostel/Mess"));
    }

    #[test]
    fn blank_search_is_ignored() {
        let args = ListArgs { search: Some("  ".into()), ..list_args() };
        assert!(filter_from_args(&args).unwrap().search.is_none());
    }

    #[test]
    fn truncate_on_char_boundary() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééé", 2), "éé...");
    }
}
