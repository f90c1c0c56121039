use crate::TriageError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Default)]
pub struct TriageConfig {
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Deserialize, Default)]
pub struct CorpusConfig {
    /// Training corpus file (quoted CSV: query, category, priority).
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
pub struct StoreConfig {
    /// SQLite database holding submitted complaints.
    pub path: Option<PathBuf>,
}

/// Load config from TRIAGE_CONFIG env var, ~/.triage/config.toml, or defaults.
pub fn load_config() -> Result<TriageConfig, TriageError> {
    match config_path() {
        Some(p) if p.exists() => load_config_from(&p),
        _ => Ok(TriageConfig::default()),
    }
}

pub fn load_config_from(path: &Path) -> Result<TriageConfig, TriageError> {
    let content = std::fs::read_to_string(path)?;
    let config: TriageConfig = toml::from_str(&content)
        .map_err(|e| TriageError::Config(format!("{}: {e}", path.display())))?;
    validate_config(&config)?;
    Ok(config)
}

fn config_path() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("TRIAGE_CONFIG") {
        return Some(PathBuf::from(p));
    }
    let home = std::env::var("HOME").ok()?;
    Some(Path::new(&home).join(".triage").join("config.toml"))
}

fn validate_config(config: &TriageConfig) -> Result<(), TriageError> {
    if config
        .corpus
        .path
        .as_ref()
        .is_some_and(|p| p.as_os_str().is_empty())
    {
        return Err(TriageError::Config("corpus.path is empty".into()));
    }
    if config
        .store
        .path
        .as_ref()
        .is_some_and(|p| p.as_os_str().is_empty())
    {
        return Err(TriageError::Config("store.path is empty".into()));
    }
    Ok(())
}
