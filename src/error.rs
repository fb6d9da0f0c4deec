use thiserror::Error;

/// Errors surfaced by the persistence adapter.
///
/// Driver-level failures are wrapped exactly one level and never retried or
/// swallowed. Pagination validation failures are not errors; they degrade to
/// no-op pagination instead.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error(transparent)]
    MssqlError(#[from] tiberius::error::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Transaction state error: {0}")]
    TransactionError(String),

    #[error("Other database error: {0}")]
    Other(String),
}
