//! Deciding which statement failures mean "already applied".

use serde::Serialize;

use crate::db::ExecutionError;

/// SQLSTATE codes for objects that already exist.
const DUPLICATE_OBJECT_CODES: &[&str] = &[
    "42P07", // duplicate_table (tables, indexes, sequences, views)
    "42710", // duplicate_object (constraints, types, extensions, roles)
    "42701", // duplicate_column
    "42P06", // duplicate_schema
    "42P04", // duplicate_database
    "42723", // duplicate_function
];

/// SQLSTATE codes for objects that are already gone.
const UNDEFINED_OBJECT_CODES: &[&str] = &[
    "42P01", // undefined_table
    "42703", // undefined_column
    "42704", // undefined_object
    "42883", // undefined_function
    "3F000", // invalid_schema_name
];

/// Why a failed statement was treated as already applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The object the statement creates is already there.
    AlreadyExists,
    /// The object the statement alters or drops is already gone.
    DoesNotExist,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::AlreadyExists => write!(f, "already exists"),
            SkipReason::DoesNotExist => write!(f, "does not exist"),
        }
    }
}

/// Result of running one statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Succeeded,
    SkippedAlreadyApplied(SkipReason),
    Failed(String),
}

impl ExecutionOutcome {
    pub fn from_result(result: &Result<(), ExecutionError>) -> Self {
        match result {
            Ok(()) => ExecutionOutcome::Succeeded,
            Err(err) => match classify(err) {
                Some(reason) => ExecutionOutcome::SkippedAlreadyApplied(reason),
                None => ExecutionOutcome::Failed(err.message.clone()),
            },
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, ExecutionOutcome::Failed(_))
    }
}

/// Classify a statement failure.
///
/// SQLSTATE codes are checked first; message text is the fallback for
/// drivers or servers that give no code or a code outside the lists above.
/// `None` means the failure is fatal.
pub fn classify(err: &ExecutionError) -> Option<SkipReason> {
    if let Some(code) = err.code.as_deref() {
        if DUPLICATE_OBJECT_CODES.contains(&code) {
            return Some(SkipReason::AlreadyExists);
        }
        if UNDEFINED_OBJECT_CODES.contains(&code) {
            return Some(SkipReason::DoesNotExist);
        }
    }

    if err.message.contains("already exists") {
        Some(SkipReason::AlreadyExists)
    } else if err.message.contains("does not exist") {
        Some(SkipReason::DoesNotExist)
    } else {
        None
    }
}

/// First `max_chars` characters of `sql`, with `...` appended when cut.
pub fn preview(sql: &str, max_chars: usize) -> String {
    match sql.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &sql[..idx]),
        None => sql.to_string(),
    }
}
