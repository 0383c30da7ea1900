use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Legacy migration that truncates click tracking data before rebuilding it.
pub const LEGACY_DESTRUCTIVE_MIGRATION: &str = "005_reset_offer_clicks.sql";

/// How migration files are cut into statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMode {
    /// Strip `--` comments, split on `;` followed by a line break or end of input.
    #[default]
    Heuristic,
    /// Quote, dollar-quote and comment aware scanner splitting on every top-level `;`.
    Tokenizer,
}

impl fmt::Display for SplitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SplitMode::Heuristic => write!(f, "heuristic"),
            SplitMode::Tokenizer => write!(f, "tokenizer"),
        }
    }
}

impl FromStr for SplitMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "heuristic" => Ok(SplitMode::Heuristic),
            "tokenizer" => Ok(SplitMode::Tokenizer),
            other => Err(format!(
                "unknown splitter '{}', expected 'heuristic' or 'tokenizer'",
                other
            )),
        }
    }
}

/// Migration discovery and execution configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationsConfig {
    /// Directory holding the migration files.
    #[serde(default = "default_dir")]
    pub dir: PathBuf,

    /// File extension recognized as a migration (without the dot).
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Statement splitter.
    #[serde(default)]
    pub splitter: SplitMode,

    /// Characters of a failing statement echoed in the error report.
    #[serde(default = "default_preview_chars")]
    pub preview_chars: usize,

    /// File names that get a destructive-operation warning before they run.
    #[serde(default = "default_destructive")]
    pub destructive: Vec<String>,
}

impl Default for MigrationsConfig {
    fn default() -> Self {
        Self {
            dir: default_dir(),
            extension: default_extension(),
            splitter: SplitMode::default(),
            preview_chars: default_preview_chars(),
            destructive: default_destructive(),
        }
    }
}

fn default_dir() -> PathBuf {
    PathBuf::from("db/migrations")
}

fn default_extension() -> String {
    "sql".to_string()
}

fn default_preview_chars() -> usize {
    200
}

fn default_destructive() -> Vec<String> {
    vec![LEGACY_DESTRUCTIVE_MIGRATION.to_string()]
}
