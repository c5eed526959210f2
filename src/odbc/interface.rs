// Call-level driver interface - the downward boundary of the crate
//
// Everything above this module speaks in terms of `OdbcDriver` and the small
// vocabulary types defined here. A production implementation wraps a native
// driver manager; tests substitute an in-memory fake.

use crate::odbc::params::ParamBinding;

/// Return code of a call-level interface function.
///
/// The numeric values follow the ODBC convention, so a driver implementation
/// can convert a raw `SQLRETURN` with [`SqlCode::from_raw`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlCode {
    Success,
    SuccessWithInfo,
    Error,
    InvalidHandle,
    NoData,
    NeedData,
    StillExecuting,
    Other(i32),
}

impl SqlCode {
    /// Convert a raw ODBC return code.
    #[must_use]
    pub fn from_raw(code: i32) -> Self {
        match code {
            0 => SqlCode::Success,
            1 => SqlCode::SuccessWithInfo,
            -1 => SqlCode::Error,
            -2 => SqlCode::InvalidHandle,
            100 => SqlCode::NoData,
            99 => SqlCode::NeedData,
            2 => SqlCode::StillExecuting,
            other => SqlCode::Other(other),
        }
    }

    /// `true` only for unqualified success. `SuccessWithInfo` carries
    /// diagnostics and is treated as a failure by the error gate.
    #[must_use]
    pub fn is_success(self) -> bool {
        matches!(self, SqlCode::Success)
    }
}

/// Opaque driver-owned handle value.
///
/// The crate never dereferences this; it only passes it back to the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawHandle(pub u64);

/// The three handle kinds the crate allocates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleKind {
    Environment,
    Connection,
    Statement,
}

/// Length-or-null indicator reported alongside fetched column data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    /// The cell is SQL NULL.
    Null,
    /// The driver cannot report the total length of the value.
    NoTotal,
    /// Total length of the value in bytes, before any truncation.
    Length(usize),
}

/// One diagnostic record as returned by the driver's diagnostic area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagRecord {
    /// Five-character SQLSTATE.
    pub state: String,
    /// Driver-native error code.
    pub native_code: i32,
    /// Human-readable message text.
    pub message: String,
}

/// C-side data type of a bound parameter buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CDataType {
    /// 64-bit signed integer.
    SBigInt,
    /// NUL-terminated character buffer.
    Char,
}

/// SQL-side data type of a bound parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDataType {
    BigInt,
    Varchar,
}

/// ODBC behavior version requested on the environment handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OdbcVersion {
    V3,
    V3_80,
}

/// Connection attribute settable through [`OdbcDriver::set_connect_attr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectAttr {
    /// Enable or disable autocommit on the connection.
    Autocommit(bool),
}

/// Transaction completion type for [`OdbcDriver::end_transaction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Commit,
    Rollback,
}

/// Call-level driver interface.
///
/// Mirrors the subset of the ODBC CLI the middleware needs: handle
/// management, connection setup, statement preparation and execution,
/// row fetch, and diagnostics. Every method returns a [`SqlCode`] that the
/// caller routes through the diagnostic gate; no method panics.
///
/// Implementations are free to be stateful behind `&self` (the middleware is
/// single-threaded and never shares a driver across threads while a call is
/// in flight).
pub trait OdbcDriver {
    /// Allocate a handle of `kind` under `parent`.
    ///
    /// Environment handles take no parent; connection handles take the
    /// environment; statement handles take the connection.
    fn alloc_handle(&self, kind: HandleKind, parent: Option<RawHandle>)
    -> (SqlCode, Option<RawHandle>);

    /// Free a previously allocated handle.
    fn free_handle(&self, kind: HandleKind, handle: RawHandle) -> SqlCode;

    /// Declare the ODBC behavior version on an environment handle.
    fn set_env_version(&self, environment: RawHandle, version: OdbcVersion) -> SqlCode;

    /// Connect a connection handle to a data source.
    fn connect(
        &self,
        connection: RawHandle,
        dsn: &str,
        username: &str,
        password: &str,
    ) -> SqlCode;

    /// Disconnect a connected connection handle.
    fn disconnect(&self, connection: RawHandle) -> SqlCode;

    /// Set a connection attribute.
    fn set_connect_attr(&self, connection: RawHandle, attr: ConnectAttr) -> SqlCode;

    /// Commit or roll back the transaction open on `connection`.
    fn end_transaction(&self, connection: RawHandle, completion: Completion) -> SqlCode;

    /// Prepare `query` on a statement handle.
    fn prepare(&self, statement: RawHandle, query: &str) -> SqlCode;

    /// Number of parameter markers in the prepared statement.
    fn num_params(&self, statement: RawHandle) -> (SqlCode, u16);

    /// Bind one parameter buffer to marker `number` (1-based).
    fn bind_parameter(&self, statement: RawHandle, number: u16, binding: &ParamBinding)
    -> SqlCode;

    /// Execute the prepared statement.
    fn execute(&self, statement: RawHandle) -> SqlCode;

    /// Number of columns in the current result set.
    fn num_result_cols(&self, statement: RawHandle) -> (SqlCode, u16);

    /// Advance the cursor to the next row. `NoData` means the current result
    /// set is exhausted.
    fn fetch(&self, statement: RawHandle) -> SqlCode;

    /// Retrieve column `column` (1-based) of the current row as character
    /// data into `buffer`.
    fn get_data(&self, statement: RawHandle, column: u16, buffer: &mut [u8])
    -> (SqlCode, Indicator);

    /// Advance to the next result set. `NoData` means there are no more.
    fn more_results(&self, statement: RawHandle) -> SqlCode;

    /// Close the open cursor, discarding pending rows.
    fn close_cursor(&self, statement: RawHandle) -> SqlCode;

    /// Read diagnostic record `record` (1-based) for `handle`.
    ///
    /// Returns `NoData` with `None` once the diagnostic area is exhausted.
    fn diag_record(
        &self,
        kind: HandleKind,
        handle: RawHandle,
        record: i16,
    ) -> (SqlCode, Option<DiagRecord>);
}
