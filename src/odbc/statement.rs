use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::OdbcMiddlewareError;
use crate::odbc::diagnostics::check;
use crate::odbc::interface::{HandleKind, Indicator, OdbcDriver, RawHandle, SqlCode};
use crate::odbc::params::ParamBinding;
use crate::types::{ParamValue, Row};

/// Size of the per-statement buffer used to retrieve column data as
/// character text. Cells whose reported length does not fit raise a fetch
/// error instead of being silently cut short.
const CONVERSION_BUFFER_SIZE: usize = 128 * 1024;

/// Lifecycle phase of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatementState {
    /// Prepared; parameters may still be bound.
    Prepared,
    /// Executed with no result columns to fetch.
    Executed,
    /// Executed with a row available to read.
    Fetching,
    /// All result sets consumed.
    Exhausted,
}

/// A prepared statement bound to one connection.
///
/// Created through [`OdbcConnection::prepare`](crate::OdbcConnection::prepare).
/// The handle moves through prepare, bind, execute, and fetch in order, and
/// [`reset`](Self::reset) returns it to the bindable state for re-execution.
/// The driver-side statement handle is released when the value is dropped.
pub struct OdbcStatement {
    driver: Arc<dyn OdbcDriver>,
    handle: RawHandle,
    query: Arc<String>,
    log_queries: bool,
    declared_params: usize,
    bindings: Vec<Box<ParamBinding>>,
    row_index: usize,
    fetch_status: SqlCode,
    column_count: u16,
    state: StatementState,
    conversion_buffer: Vec<u8>,
}

impl std::fmt::Debug for OdbcStatement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OdbcStatement")
            .field("handle", &self.handle)
            .field("query", &self.query)
            .field("declared_params", &self.declared_params)
            .field("bound", &self.bindings.len())
            .field("state", &self.state)
            .finish()
    }
}

impl OdbcStatement {
    /// Allocate and prepare a statement on `connection`, then verify that the
    /// driver's parameter count matches `declared_params`.
    ///
    /// # Errors
    /// Returns `HandleError` if allocation fails, `PrepareError` if the
    /// driver rejects the query, and `ArityError` if the driver reports a
    /// marker count different from `declared_params`.
    pub(crate) fn new(
        driver: Arc<dyn OdbcDriver>,
        connection: RawHandle,
        query: &str,
        declared_params: usize,
        log_queries: bool,
    ) -> Result<Self, OdbcMiddlewareError> {
        let (code, handle) = driver.alloc_handle(HandleKind::Statement, Some(connection));
        check(&*driver, code, HandleKind::Connection, Some(connection), "allocate statement handle")
            .map_err(|e| OdbcMiddlewareError::HandleError(e.to_string()))?;
        let handle = handle.ok_or_else(|| {
            OdbcMiddlewareError::HandleError(
                "driver reported success but returned no statement handle".into(),
            )
        })?;

        // Built before prepare so the handle is released on every error path.
        let mut statement = Self {
            driver,
            handle,
            query: Arc::new(query.to_owned()),
            log_queries,
            declared_params,
            bindings: Vec::with_capacity(declared_params),
            row_index: 0,
            fetch_status: SqlCode::NoData,
            column_count: 0,
            state: StatementState::Prepared,
            conversion_buffer: vec![0_u8; CONVERSION_BUFFER_SIZE],
        };

        let code = statement.driver.prepare(statement.handle, query);
        statement
            .check_stmt(code, "prepare statement")
            .map_err(OdbcMiddlewareError::PrepareError)?;

        let (code, reported) = statement.driver.num_params(statement.handle);
        statement
            .check_stmt(code, "count parameter markers")
            .map_err(OdbcMiddlewareError::PrepareError)?;
        if usize::from(reported) != declared_params {
            return Err(OdbcMiddlewareError::ArityError(format!(
                "statement declares {declared_params} parameter(s) but the driver reports {reported}: {query}"
            )));
        }

        Ok(statement)
    }

    /// Bind the next parameter in positional order.
    ///
    /// The `name` is accepted for call-site readability only; binding is
    /// strictly positional, left to right.
    ///
    /// # Errors
    /// Returns `StateError` if the statement has already been executed,
    /// `ArityError` if more values are supplied than the statement declares,
    /// and `BindError` if the driver rejects the buffer.
    pub fn bind(
        &mut self,
        _name: &str,
        value: impl Into<ParamValue>,
    ) -> Result<&mut Self, OdbcMiddlewareError> {
        let value = value.into();
        self.bind_value(&value)?;
        Ok(self)
    }

    /// Bind NULL as the next parameter.
    ///
    /// # Errors
    /// Same failure modes as [`bind`](Self::bind).
    pub fn bind_null(&mut self, _name: &str) -> Result<&mut Self, OdbcMiddlewareError> {
        self.bind_value(&ParamValue::Null)?;
        Ok(self)
    }

    fn bind_value(&mut self, value: &ParamValue) -> Result<(), OdbcMiddlewareError> {
        if self.state != StatementState::Prepared {
            return Err(OdbcMiddlewareError::StateError(format!(
                "cannot bind in state {:?}; reset the statement first",
                self.state
            )));
        }
        // The bind list may exceed the declared arity by at most one; past
        // that the value is rejected before any native call.
        if self.bindings.len() > self.declared_params {
            return Err(OdbcMiddlewareError::ArityError(format!(
                "statement declares {} parameter(s) but {} values have already been bound",
                self.declared_params,
                self.bindings.len()
            )));
        }

        let binding = Box::new(ParamBinding::from_value(value));
        let number = u16::try_from(self.bindings.len() + 1).map_err(|e| {
            OdbcMiddlewareError::BindError(format!("parameter number out of range: {e}"))
        })?;
        let code = self.driver.bind_parameter(self.handle, number, &binding);
        self.check_stmt(code, "bind parameter")
            .map_err(OdbcMiddlewareError::BindError)?;
        self.bindings.push(binding);
        Ok(())
    }

    /// Execute the statement and position on the first result set.
    ///
    /// A driver that reports no result data (a DML statement touching zero
    /// rows, for instance) is not an error; the statement simply has no rows.
    ///
    /// # Errors
    /// Returns `StateError` if the statement was already executed and
    /// `ExecutionError` or `FetchError` if the driver fails.
    pub fn execute(&mut self) -> Result<&mut Self, OdbcMiddlewareError> {
        if self.state != StatementState::Prepared {
            return Err(OdbcMiddlewareError::StateError(format!(
                "cannot execute in state {:?}; reset the statement first",
                self.state
            )));
        }
        if self.log_queries {
            debug!(query = %self.query, "executing statement");
        }

        let code = self.driver.execute(self.handle);
        if code != SqlCode::NoData {
            self.check_stmt(code, "execute statement")
                .map_err(OdbcMiddlewareError::ExecutionError)?;
        }

        let (code, columns) = self.driver.num_result_cols(self.handle);
        self.check_stmt(code, "count result columns")
            .map_err(OdbcMiddlewareError::ExecutionError)?;
        self.column_count = columns;

        // A statement with no result columns has no cursor to position.
        if columns == 0 {
            self.fetch_status = SqlCode::NoData;
            self.state = StatementState::Executed;
            return Ok(self);
        }

        self.fetch_status = self.driver.fetch(self.handle);
        if self.fetch_status == SqlCode::NoData {
            self.state = StatementState::Exhausted;
        } else {
            self.check_stmt(self.fetch_status, "fetch first row")
                .map_err(OdbcMiddlewareError::FetchError)?;
            self.state = StatementState::Fetching;
        }
        Ok(self)
    }

    /// Whether a row is available to read with [`next_row`](Self::next_row).
    #[must_use]
    pub fn has_next_row(&self) -> bool {
        self.fetch_status != SqlCode::NoData
    }

    /// Read the current row and advance the cursor, crossing into the next
    /// result set when the current one is exhausted.
    ///
    /// # Errors
    /// Returns `StateError` if no row is available (the open cursor is closed
    /// first so the statement stays usable after [`reset`](Self::reset)), and
    /// `FetchError` if column retrieval fails or a cell does not fit the
    /// conversion buffer.
    pub fn next_row(&mut self) -> Result<Row, OdbcMiddlewareError> {
        if self.state != StatementState::Fetching || !self.has_next_row() {
            let code = self.driver.close_cursor(self.handle);
            if !code.is_success() {
                warn!(?code, "closing cursor after out-of-order row read");
            }
            return Err(OdbcMiddlewareError::StateError(
                "no row is available; check has_next_row before reading".into(),
            ));
        }

        let driver = Arc::clone(&self.driver);
        let mut row = Row::with_capacity(usize::from(self.column_count));
        for column in 1..=self.column_count {
            let (code, indicator) =
                driver.get_data(self.handle, column, &mut self.conversion_buffer);
            self.check_stmt(code, "retrieve column data")
                .map_err(OdbcMiddlewareError::FetchError)?;
            row.push(self.decode_cell(column, indicator)?);
        }
        self.row_index += 1;

        self.advance()?;
        Ok(row)
    }

    /// Drain every remaining row into a vector.
    ///
    /// # Errors
    /// Same failure modes as [`next_row`](Self::next_row).
    pub fn get_result(&mut self) -> Result<Vec<Row>, OdbcMiddlewareError> {
        let mut rows = Vec::new();
        while self.has_next_row() {
            rows.push(self.next_row()?);
        }
        Ok(rows)
    }

    /// Return the statement to the bindable state, discarding bound
    /// parameters and any unread rows. Safe to call in any state.
    pub fn reset(&mut self) -> &mut Self {
        let code = self.driver.close_cursor(self.handle);
        if !code.is_success() && code != SqlCode::Error {
            warn!(?code, "close cursor during reset");
        }
        self.bindings.clear();
        self.row_index = 0;
        self.fetch_status = SqlCode::NoData;
        self.column_count = 0;
        self.state = StatementState::Prepared;
        self
    }

    /// The prepared query text.
    #[must_use]
    pub fn query(&self) -> &str {
        self.query.as_str()
    }

    /// Number of rows read since execution (or the last reset).
    #[must_use]
    pub fn row_index(&self) -> usize {
        self.row_index
    }

    /// Number of parameters currently bound.
    #[must_use]
    pub fn bound_params(&self) -> usize {
        self.bindings.len()
    }

    fn decode_cell(
        &self,
        column: u16,
        indicator: Indicator,
    ) -> Result<String, OdbcMiddlewareError> {
        match indicator {
            Indicator::Null => Ok(String::new()),
            Indicator::Length(total) => {
                if total >= self.conversion_buffer.len() {
                    return Err(OdbcMiddlewareError::FetchError(format!(
                        "column {column} holds {total} byte(s), larger than the {} byte conversion buffer",
                        self.conversion_buffer.len()
                    )));
                }
                let text = String::from_utf8_lossy(&self.conversion_buffer[..total]);
                Ok(text.into_owned())
            }
            Indicator::NoTotal => Err(OdbcMiddlewareError::FetchError(format!(
                "driver reported no total length for column {column}"
            ))),
        }
    }

    /// Advance the cursor: fetch within the current result set, and when it
    /// is exhausted, move to the next result set and fetch its first row.
    fn advance(&mut self) -> Result<(), OdbcMiddlewareError> {
        self.fetch_status = self.driver.fetch(self.handle);
        match self.fetch_status {
            SqlCode::Success => Ok(()),
            SqlCode::NoData => {
                let code = self.driver.more_results(self.handle);
                match code {
                    SqlCode::NoData => {
                        self.state = StatementState::Exhausted;
                        self.fetch_status = SqlCode::NoData;
                        Ok(())
                    }
                    SqlCode::Success => {
                        let (code, columns) = self.driver.num_result_cols(self.handle);
                        self.check_stmt(code, "count result columns")
                            .map_err(OdbcMiddlewareError::FetchError)?;
                        self.column_count = columns;
                        self.fetch_status = self.driver.fetch(self.handle);
                        if self.fetch_status == SqlCode::NoData {
                            self.state = StatementState::Exhausted;
                        } else {
                            self.check_stmt(self.fetch_status, "fetch first row of next result set")
                                .map_err(OdbcMiddlewareError::FetchError)?;
                        }
                        Ok(())
                    }
                    other => {
                        self.fetch_status = SqlCode::NoData;
                        self.state = StatementState::Exhausted;
                        self.check_stmt(other, "advance to next result set")
                            .map_err(OdbcMiddlewareError::FetchError)?;
                        Ok(())
                    }
                }
            }
            other => {
                self.fetch_status = SqlCode::NoData;
                self.check_stmt(other, "fetch next row")
                    .map_err(OdbcMiddlewareError::FetchError)?;
                Ok(())
            }
        }
    }

    fn check_stmt(&self, code: SqlCode, context: &'static str) -> Result<(), String> {
        check(
            &*self.driver,
            code,
            HandleKind::Statement,
            Some(self.handle),
            context,
        )
        .map_err(|e| e.to_string())
    }
}

impl Drop for OdbcStatement {
    fn drop(&mut self) {
        let code = self.driver.free_handle(HandleKind::Statement, self.handle);
        if !code.is_success() {
            warn!(?code, handle = ?self.handle, "failed to free statement handle");
        }
    }
}
