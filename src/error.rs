use thiserror::Error;

/// Errors produced by the ODBC middleware.
///
/// Every variant carries a formatted message that already includes the
/// aggregated driver diagnostics when the failure came from a call-level
/// function, so callers can log the error as-is.
#[derive(Debug, Error)]
pub enum OdbcMiddlewareError {
    /// Handle allocation or release failed.
    #[error("Handle error: {0}")]
    HandleError(String),

    /// Connecting to the data source failed.
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Invalid connection options.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Statement preparation failed.
    #[error("Prepare error: {0}")]
    PrepareError(String),

    /// Supplied parameter count does not match the statement's markers.
    #[error("Arity error: {0}")]
    ArityError(String),

    /// Binding a parameter buffer failed.
    #[error("Bind error: {0}")]
    BindError(String),

    /// Statement execution failed.
    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// Fetching or decoding a row failed.
    #[error("Fetch error: {0}")]
    FetchError(String),

    /// Beginning, committing, or rolling back a transaction failed.
    #[error("Transaction error: {0}")]
    TransactionError(String),

    /// Operation invoked in a statement state that does not allow it.
    #[error("State error: {0}")]
    StateError(String),
}
