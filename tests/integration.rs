use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Env {
    dir: TempDir,
}

impl Env {
    fn new() -> Self {
        Self { dir: TempDir::new().unwrap() }
    }

    fn db(&self) -> PathBuf {
        self.dir.path().join("complaints.db")
    }

    fn corpus(&self) -> PathBuf {
        self.dir.path().join("cmsdata.csv")
    }

    #[allow(deprecated)]
    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("triage").unwrap();
        cmd.env("HOME", self.dir.path())
            .env("TRIAGE_CONFIG", self.dir.path().join("config.toml"))
            .env("TRIAGE_DB", self.db())
            .env("TRIAGE_CORPUS", self.corpus())
            .env_remove("TRIAGE_LOG");
        cmd
    }

    fn stdout(&self, args: &[&str]) -> String {
        let out = self.cmd().args(args).assert().success().get_output().stdout.clone();
        String::from_utf8(out).unwrap()
    }

    fn json(&self, args: &[&str]) -> serde_json::Value {
        serde_json::from_str(&self.stdout(args)).unwrap()
    }

    fn submit(&self, title: &str, description: &str) -> String {
        let out = self.stdout(&["submit", "--title", title, "--description", description, "--user-id", "7"]);
        out.split('\t').next().unwrap().to_string()
    }
}

fn write_corpus(path: &Path) {
    std::fs::write(
        path,
        "query,category,priority\n\
         \"router router reset\",\"Technical\",\"high\"\n\
         \"router keeps dropping\",\"Technical\",\"low\"\n\
         malformed line without fields\n",
    )
    .unwrap();
}

#[test]
fn classify_rule_shortcut() {
    let env = Env::new();
    let out = env.stdout(&["classify", "My", "hostel", "tap", "is", "leaking"]);
    assert_eq!(out, "Hostel/Mess\turgent\n");
}

#[test]
fn classify_title_and_description() {
    let env = Env::new();
    let out = env.stdout(&["classify", "--title", "Wifi down", "--description", "No signal in the library"]);
    assert_eq!(out, "Technical\turgent\n");
}

#[test]
fn classify_empty_text_uses_defaults() {
    let env = Env::new();
    let out = env.stdout(&["classify"]);
    assert_eq!(out, "Technical\tmedium\n");
}

#[test]
fn classify_explain_json() {
    let env = Env::new();
    let v = env.json(&["classify", "--explain", "--json", "Wifi", "is", "down"]);
    assert_eq!(v["category"], "Technical");
    assert_eq!(v["priority"], "urgent");
    assert_eq!(v["stage"], "rule");
    assert_eq!(v["rule"], "network");
}

#[test]
fn status_without_corpus() {
    let env = Env::new();
    let v = env.json(&["status", "--json"]);
    assert_eq!(v["loaded"], false);
    assert_eq!(v["sampleCount"], 0);
    assert_eq!(
        v["categories"],
        serde_json::json!(["Technical", "Academic", "Hostel/Mess", "Maintenance"])
    );
    assert_eq!(v["priorities"], serde_json::json!(["urgent", "high", "medium", "low"]));
}

#[test]
fn status_with_corpus() {
    let env = Env::new();
    write_corpus(&env.corpus());
    let v = env.json(&["status", "--json"]);
    assert_eq!(v["loaded"], true);
    assert_eq!(v["sampleCount"], 2);
    assert_eq!(v["categories"], serde_json::json!(["Technical"]));
    assert_eq!(v["priorities"], serde_json::json!(["high", "low"]));
}

#[test]
fn corpus_flag_overrides_env() {
    let env = Env::new();
    let other = env.dir.path().join("other.csv");
    write_corpus(&other);
    let v = env.json(&["status", "--json", "--corpus", other.to_str().unwrap()]);
    assert_eq!(v["loaded"], true);
}

#[test]
fn submit_list_show_update_stats() {
    let env = Env::new();
    let wifi = env.submit("Wifi down", "No internet in the library");
    let exam = env.submit("Exam grade", "My marks for the exam are wrong");
    assert!(wifi.starts_with("CMP"));
    assert_eq!(wifi.len(), 15);
    assert_ne!(wifi, exam);

    let all = env.json(&["list", "--json"]);
    assert_eq!(all.as_array().unwrap().len(), 2);

    let academic = env.json(&["list", "--json", "--category", "Academic"]);
    let academic = academic.as_array().unwrap();
    assert_eq!(academic.len(), 1);
    assert_eq!(academic[0]["ticket_id"], exam.as_str());
    assert_eq!(academic[0]["priority"], "high");
    assert_eq!(academic[0]["status"], "pending");
    assert_eq!(academic[0]["user_id"], 7);

    let found = env.json(&["list", "--json", "--search", "INTERNET"]);
    assert_eq!(found.as_array().unwrap().len(), 1);

    let shown = env.json(&["show", &wifi, "--json"]);
    assert_eq!(shown["category"], "Technical");
    assert_eq!(shown["priority"], "urgent");
    assert_eq!(shown["classified_by"], "classifier");
    assert!(shown["resolved_at"].is_null());

    let out = env.stdout(&["update", &wifi, "--status", "resolved", "--response", "Router replaced"]);
    assert_eq!(out, format!("{wifi}\tresolved\n"));

    let shown = env.json(&["show", &wifi, "--json"]);
    assert_eq!(shown["status"], "resolved");
    assert_eq!(shown["admin_response"], "Router replaced");
    assert!(shown["resolved_at"].is_i64());

    let stats = env.json(&["stats", "--json"]);
    assert_eq!(stats["total"], 2);
    let status = stats["status"].as_array().unwrap();
    assert_eq!(status.len(), 4);
    assert_eq!(status[0], serde_json::json!({"label": "pending", "count": 1}));
    assert_eq!(status[2], serde_json::json!({"label": "resolved", "count": 1}));
}

#[test]
fn show_unknown_ticket_fails() {
    let env = Env::new();
    env.submit("Broken chair", "Chair in lab 2 is broken");
    let out = env
        .cmd()
        .args(["show", "CMP20260101ZZZZ"])
        .assert()
        .failure()
        .code(1)
        .get_output()
        .stderr
        .clone();
    assert!(String::from_utf8_lossy(&out).contains("not found"));
}

#[test]
fn update_rejects_unknown_status() {
    let env = Env::new();
    let ticket = env.submit("Broken chair", "Chair in lab 2 is broken");
    env.cmd()
        .args(["update", &ticket, "--status", "reopened"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn list_without_database_is_empty() {
    let env = Env::new();
    env.cmd().args(["list"]).assert().success().stdout("");
    assert!(!env.db().exists());
}

#[test]
fn submit_rejects_blank_title() {
    let env = Env::new();
    env.cmd()
        .args(["submit", "--title", "   ", "--description", "something"])
        .assert()
        .failure()
        .code(1);
    assert!(!env.db().exists() || env.json(&["list", "--json"]).as_array().unwrap().is_empty());
}

#[test]
fn submit_rejects_short_fields() {
    let env = Env::new();
    let out = env
        .cmd()
        .args(["submit", "--title", "Wifi", "--description", "down"])
        .assert()
        .failure()
        .code(1)
        .get_output()
        .stderr
        .clone();
    assert!(String::from_utf8_lossy(&out).contains("at least 5"));
}

#[test]
fn list_and_stats_per_user() {
    let env = Env::new();
    env.submit("Wifi down", "No internet in the library");
    env.stdout(&["submit", "--title", "Exam grade", "--description", "Marks are missing", "--user-id", "9"]);

    let mine = env.json(&["list", "--json", "--user-id", "9"]);
    let mine = mine.as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["user_id"], 9);

    let stats = env.json(&["stats", "--json", "--user-id", "7"]);
    assert_eq!(stats["total"], 1);
    let stats = env.json(&["stats", "--json"]);
    assert_eq!(stats["total"], 2);
}

#[test]
fn feedback_after_resolution() {
    let env = Env::new();
    let ticket = env.submit("Broken chair", "Chair in lab 2 is broken");

    env.cmd()
        .args(["feedback", &ticket, "--rating", "4"])
        .assert()
        .failure()
        .code(1);

    env.stdout(&["update", &ticket, "--status", "closed"]);
    env.cmd()
        .args(["feedback", &ticket, "--rating", "9"])
        .assert()
        .failure()
        .code(1);

    let f = env.json(&["feedback", &ticket, "--rating", "4", "--text", "Fixed in a day", "--json"]);
    assert_eq!(f["rating"], 4);
    assert_eq!(f["feedback_text"], "Fixed in a day");

    env.cmd()
        .args(["feedback", &ticket, "--rating", "2"])
        .assert()
        .failure()
        .code(1);

    let stored = env.json(&["feedback", &ticket, "--json"]);
    assert_eq!(stored["rating"], 4);
    let shown = env.json(&["show", &ticket, "--json"]);
    assert_eq!(shown["status"], "closed");
    assert_eq!(shown["feedback"]["rating"], 4);
}

#[test]
fn feedback_absent_is_null() {
    let env = Env::new();
    let ticket = env.submit("Broken chair", "Chair in lab 2 is broken");
    assert!(env.json(&["feedback", &ticket, "--json"]).is_null());
    assert!(env.json(&["show", &ticket, "--json"])["feedback"].is_null());
}
