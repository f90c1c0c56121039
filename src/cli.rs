use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "triage", version, about = "Complaint intake with category/priority classification")]
pub struct Cli {
    /// Database path
    #[arg(long, env = "TRIAGE_DB", global = true)]
    pub db: Option<PathBuf>,

    /// Training corpus path (quoted CSV: query, category, priority)
    #[arg(long, env = "TRIAGE_CORPUS", global = true)]
    pub corpus: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Classify text into a category and priority
    Classify(ClassifyArgs),
    /// Show classifier status: corpus, labels, sample count
    Status(StatusArgs),
    /// Classify and store a new complaint
    Submit(SubmitArgs),
    /// List stored complaints, newest first
    List(ListArgs),
    /// Show one complaint by ticket id
    Show(ShowArgs),
    /// Change a complaint's status
    Update(UpdateArgs),
    /// Complaint counts by status, category, and priority
    Stats(StatsArgs),
    /// Rate a resolved complaint, or show its rating
    Feedback(FeedbackArgs),
}

#[derive(Parser)]
pub struct ClassifyArgs {
    /// Complaint text (joined with spaces)
    pub text: Vec<String>,

    /// Complaint title (prepended to the text)
    #[arg(long)]
    pub title: Option<String>,

    /// Complaint description (appended after the title)
    #[arg(long)]
    pub description: Option<String>,

    /// Include the deciding stage and scores
    #[arg(long)]
    pub explain: bool,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

impl ClassifyArgs {
    /// Text to classify: title, description, then positional words.
    pub fn input(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(t) = &self.title {
            parts.push(t);
        }
        if let Some(d) = &self.description {
            parts.push(d);
        }
        parts.extend(self.text.iter().map(String::as_str));
        parts.join(" ")
    }
}

#[derive(Parser)]
pub struct StatusArgs {
    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct SubmitArgs {
    /// Short summary of the complaint
    #[arg(long)]
    pub title: String,

    /// Full description
    #[arg(long)]
    pub description: String,

    /// Submitting user's id
    #[arg(long, default_value = "0")]
    pub user_id: i64,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct ListArgs {
    /// Filter by status: pending, in_progress, resolved, closed
    #[arg(long)]
    pub status: Option<String>,

    /// Filter by category: Technical, Academic, Hostel/Mess, Maintenance
    #[arg(long)]
    pub category: Option<String>,

    /// Filter by priority: low, medium, high, urgent
    #[arg(long)]
    pub priority: Option<String>,

    /// Only complaints submitted by this user
    #[arg(long)]
    pub user_id: Option<i64>,

    /// Substring search over title, description, and ticket id
    #[arg(long)]
    pub search: Option<String>,

    /// Maximum results (default 20, max 100)
    #[arg(long, default_value = "20")]
    pub limit: i64,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct ShowArgs {
    /// Ticket id (e.g. CMP20261019AB12)
    pub ticket: String,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct UpdateArgs {
    /// Ticket id
    pub ticket: String,

    /// New status: pending, in_progress, resolved, closed
    #[arg(long)]
    pub status: String,

    /// Response recorded on the complaint
    #[arg(long)]
    pub response: Option<String>,
}

#[derive(Parser)]
pub struct StatsArgs {
    /// Only count complaints submitted by this user
    #[arg(long)]
    pub user_id: Option<i64>,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser)]
pub struct FeedbackArgs {
    /// Ticket id
    pub ticket: String,

    /// Rating from 1 to 5; omit to show existing feedback
    #[arg(long)]
    pub rating: Option<u8>,

    /// Comment stored with the rating
    #[arg(long, requires = "rating")]
    pub text: Option<String>,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_input_joins_parts() {
        let cli = Cli::parse_from([
            "triage", "classify", "--title", "Wifi", "--description", "down", "since", "noon",
        ]);
        let Command::Classify(args) = cli.command else {
            panic!("expected classify");
        };
        assert_eq!(args.input(), "Wifi down since noon");
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["triage", "status", "--corpus", "/tmp/c.csv"]);
        assert_eq!(cli.corpus, Some(PathBuf::from("/tmp/c.csv")));
    }

    #[test]
    fn feedback_text_requires_rating() {
        assert!(Cli::try_parse_from(["triage", "feedback", "T1", "--text", "thanks"]).is_err());
        let cli = Cli::parse_from(["triage", "feedback", "T1", "--rating", "4", "--text", "thanks"]);
        let Command::Feedback(args) = cli.command else {
            panic!("expected feedback");
        };
        assert_eq!(args.rating, Some(4));
        assert_eq!(args.text.as_deref(), Some("thanks"));
    }

    #[test]
    fn cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
