use thiserror::Error;

/// Core error type for migrator operations.
#[derive(Error, Debug)]
pub enum MigratorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Discovery error: {0}")]
    Discovery(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Statement {ordinal} of {file} failed: {message}")]
    StatementFailed {
        file: String,
        ordinal: usize,
        message: String,
    },
}

impl MigratorError {
    /// Whether this error stopped a run part-way through its statements.
    pub fn is_statement_failure(&self) -> bool {
        matches!(self, MigratorError::StatementFailed { .. })
    }
}

/// Result type alias using MigratorError.
pub type Result<T> = std::result::Result<T, MigratorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_failed_display() {
        let err = MigratorError::StatementFailed {
            file: "001_init.sql".into(),
            ordinal: 3,
            message: "syntax error at or near \"TABLEE\"".into(),
        };
        assert_eq!(
            err.to_string(),
            "Statement 3 of 001_init.sql failed: syntax error at or near \"TABLEE\""
        );
        assert!(err.is_statement_failure());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: MigratorError = io.into();
        assert!(matches!(err, MigratorError::Io(_)));
        assert!(!err.is_statement_failure());
    }
}
