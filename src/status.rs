use crate::classify::Classifier;
use crate::TriageError;
use std::path::Path;

pub fn handle_status(classifier: &Classifier, corpus_path: &Path, json: bool) -> Result<(), TriageError> {
    let status = classifier.status();

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    if status.loaded {
        println!("corpus      {} ({} samples)", corpus_path.display(), status.sample_count);
    } else {
        println!("corpus      not loaded, default patterns");
    }

    let tables = classifier.tables();
    println!("categories  {}", status.categories.join(", "));
    for (label, words) in tables.categories.iter() {
        println!("  {label:<12} {} keywords", words.len());
    }
    println!("priorities  {}", status.priorities.join(", "));
    for (label, words) in tables.priorities.iter() {
        println!("  {label:<12} {} keywords", words.len());
    }

    Ok(())
}
