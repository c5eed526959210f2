use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::OdbcMiddlewareError;
use crate::odbc::diagnostics::check;
use crate::odbc::interface::{
    Completion, ConnectAttr, HandleKind, OdbcDriver, OdbcVersion, RawHandle, SqlCode,
};
use crate::odbc::statement::OdbcStatement;

/// A live connection to an ODBC data source.
///
/// Owns the environment and connection handles for its whole lifetime and
/// releases both on [`disconnect`](Self::disconnect) or drop. Statements are
/// created through [`prepare`](Self::prepare) and borrow the same driver.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use odbc_middleware::prelude::*;
///
/// # fn demo(driver: Arc<dyn OdbcDriver>) -> Result<(), OdbcMiddlewareError> {
/// let conn = OdbcOptions::new("records")
///     .username("app")
///     .password("secret")
///     .connect(driver)?;
/// conn.execute("DELETE FROM sessions")?;
/// # Ok(())
/// # }
/// ```
pub struct OdbcConnection {
    driver: Arc<dyn OdbcDriver>,
    environment: RawHandle,
    connection: RawHandle,
    log_queries: bool,
    open: bool,
}

impl std::fmt::Debug for OdbcConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OdbcConnection")
            .field("environment", &self.environment)
            .field("connection", &self.connection)
            .field("open", &self.open)
            .finish()
    }
}

impl OdbcConnection {
    /// Connect to `dsn` with the given credentials.
    ///
    /// Allocates the environment, declares ODBC 3.x behavior, allocates the
    /// connection handle, and connects. Handles allocated before a failure
    /// are released before the error is returned.
    ///
    /// # Errors
    /// Returns `ConfigError` for an empty DSN, `HandleError` if allocation
    /// fails, and `ConnectionError` if the driver refuses the connection.
    pub fn connect(
        driver: Arc<dyn OdbcDriver>,
        dsn: &str,
        username: &str,
        password: &str,
    ) -> Result<Self, OdbcMiddlewareError> {
        if dsn.is_empty() {
            return Err(OdbcMiddlewareError::ConfigError(
                "DSN must not be empty".into(),
            ));
        }

        let (code, environment) = driver.alloc_handle(HandleKind::Environment, None);
        check(&*driver, code, HandleKind::Environment, environment, "allocate environment handle")
            .map_err(|e| OdbcMiddlewareError::HandleError(e.to_string()))?;
        let environment = environment.ok_or_else(|| {
            OdbcMiddlewareError::HandleError(
                "driver reported success but returned no environment handle".into(),
            )
        })?;

        match Self::open_connection(&driver, environment, dsn, username, password) {
            Ok(connection) => {
                debug!(dsn, "connected");
                Ok(Self {
                    driver,
                    environment,
                    connection,
                    log_queries: false,
                    open: true,
                })
            }
            Err(err) => {
                let code = driver.free_handle(HandleKind::Environment, environment);
                if !code.is_success() {
                    warn!(?code, "failed to free environment handle after connect error");
                }
                Err(err)
            }
        }
    }

    fn open_connection(
        driver: &Arc<dyn OdbcDriver>,
        environment: RawHandle,
        dsn: &str,
        username: &str,
        password: &str,
    ) -> Result<RawHandle, OdbcMiddlewareError> {
        let code = driver.set_env_version(environment, OdbcVersion::V3);
        check(&**driver, code, HandleKind::Environment, Some(environment), "declare ODBC version")
            .map_err(|e| OdbcMiddlewareError::HandleError(e.to_string()))?;

        let (code, connection) = driver.alloc_handle(HandleKind::Connection, Some(environment));
        check(&**driver, code, HandleKind::Environment, Some(environment), "allocate connection handle")
            .map_err(|e| OdbcMiddlewareError::HandleError(e.to_string()))?;
        let connection = connection.ok_or_else(|| {
            OdbcMiddlewareError::HandleError(
                "driver reported success but returned no connection handle".into(),
            )
        })?;

        let code = driver.connect(connection, dsn, username, password);
        if let Err(e) = check(&**driver, code, HandleKind::Connection, Some(connection), "connect to data source")
        {
            let code = driver.free_handle(HandleKind::Connection, connection);
            if !code.is_success() {
                warn!(?code, "failed to free connection handle after connect error");
            }
            return Err(OdbcMiddlewareError::ConnectionError(e.to_string()));
        }
        Ok(connection)
    }

    /// Prepare `query`, declaring how many `?` markers it contains.
    ///
    /// # Errors
    /// See [`OdbcStatement`] for the failure modes of preparation.
    pub fn prepare(
        &self,
        query: &str,
        declared_params: usize,
    ) -> Result<OdbcStatement, OdbcMiddlewareError> {
        OdbcStatement::new(
            Arc::clone(&self.driver),
            self.connection,
            query,
            declared_params,
            self.log_queries,
        )
    }

    /// Prepare and execute a parameterless command, discarding any rows.
    ///
    /// # Errors
    /// Propagates the preparation and execution failures of the underlying
    /// statement.
    pub fn execute(&self, command: &str) -> Result<(), OdbcMiddlewareError> {
        let mut statement = self.prepare(command, 0)?;
        statement.execute()?;
        statement.reset();
        Ok(())
    }

    /// Start a transaction by disabling autocommit.
    ///
    /// # Errors
    /// Returns `TransactionError` if the driver rejects the attribute change.
    pub fn begin_transaction(&mut self) -> Result<(), OdbcMiddlewareError> {
        let code = self
            .driver
            .set_connect_attr(self.connection, ConnectAttr::Autocommit(false));
        self.check_dbc(code, "disable autocommit")
            .map_err(OdbcMiddlewareError::TransactionError)
    }

    /// Commit the open transaction.
    ///
    /// # Errors
    /// Returns `TransactionError` if the driver fails the commit.
    pub fn commit(&mut self) -> Result<(), OdbcMiddlewareError> {
        self.end_transaction(Completion::Commit)
    }

    /// Roll back the open transaction.
    ///
    /// # Errors
    /// Returns `TransactionError` if the driver fails the rollback.
    pub fn rollback(&mut self) -> Result<(), OdbcMiddlewareError> {
        self.end_transaction(Completion::Rollback)
    }

    fn end_transaction(&mut self, completion: Completion) -> Result<(), OdbcMiddlewareError> {
        let code = self.driver.end_transaction(self.connection, completion);
        self.check_dbc(code, "end transaction")
            .map_err(OdbcMiddlewareError::TransactionError)?;

        // Autocommit stays off afterwards: every completed transaction
        // implicitly opens the next one.
        let code = self
            .driver
            .set_connect_attr(self.connection, ConnectAttr::Autocommit(false));
        self.check_dbc(code, "disable autocommit")
            .map_err(OdbcMiddlewareError::TransactionError)
    }

    /// Enable or disable statement logging for statements prepared after
    /// this call.
    pub fn set_log(&mut self, log_queries: bool) {
        self.log_queries = log_queries;
    }

    /// Disconnect and release both handles. Never fails; release problems
    /// are logged and swallowed. Calling this twice is a no-op.
    pub fn disconnect(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;

        let code = self.driver.disconnect(self.connection);
        if !code.is_success() {
            warn!(?code, "disconnect did not succeed");
        }
        let code = self.driver.free_handle(HandleKind::Connection, self.connection);
        if !code.is_success() {
            warn!(?code, "failed to free connection handle");
        }
        let code = self.driver.free_handle(HandleKind::Environment, self.environment);
        if !code.is_success() {
            warn!(?code, "failed to free environment handle");
        }
    }

    fn check_dbc(&self, code: SqlCode, context: &'static str) -> Result<(), String> {
        check(
            &*self.driver,
            code,
            HandleKind::Connection,
            Some(self.connection),
            context,
        )
        .map_err(|e| e.to_string())
    }
}

impl Drop for OdbcConnection {
    fn drop(&mut self) {
        self.disconnect();
    }
}
