mod connection;

pub use connection::Database;

use std::future::Future;

use thiserror::Error;

/// Failure reported by the database for a single statement.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ExecutionError {
    /// SQLSTATE code, when the driver exposes one.
    pub code: Option<String>,
    /// Human-readable server message.
    pub message: String,
}

impl ExecutionError {
    /// Error carrying only a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// Error carrying a SQLSTATE code and message.
    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

impl From<sqlx::Error> for ExecutionError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) => Self {
                code: db.code().map(|c| c.into_owned()),
                message: db.message().to_string(),
            },
            other => Self::new(other.to_string()),
        }
    }
}

/// Something that can run one raw SQL statement.
///
/// Statements are awaited one at a time; implementations never see two
/// statements in flight.
pub trait StatementExecutor: Send {
    /// Execute a single statement.
    fn execute(&mut self, sql: &str) -> impl Future<Output = Result<(), ExecutionError>> + Send;
}
