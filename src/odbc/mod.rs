// ODBC backend - adapts a call-level driver interface to the middleware API
//
// This module is split into several sub-modules for better organization:
// - interface: the driver trait and its vocabulary types
// - diagnostics: uniform error gate over call-level return codes
// - config: connection options and builder
// - connection: connection lifecycle and transactions
// - params: parameter conversion between middleware and driver buffers
// - statement: statement lifecycle, fetch, and row decoding

pub mod config;
pub mod connection;
mod diagnostics;
pub mod interface;
pub mod params;
pub mod statement;

// Re-export the public API
pub use config::{OdbcOptions, OdbcOptionsBuilder};
pub use connection::OdbcConnection;
pub use interface::{
    CDataType, Completion, ConnectAttr, DiagRecord, HandleKind, Indicator, OdbcDriver,
    OdbcVersion, RawHandle, SqlCode, SqlDataType,
};
pub use params::{ParamBinding, ParamData};
pub use statement::OdbcStatement;
