//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::error::OdbcMiddlewareError;
pub use crate::types::{ParamValue, Row};

pub use crate::odbc::config::{OdbcOptions, OdbcOptionsBuilder};
pub use crate::odbc::connection::OdbcConnection;
pub use crate::odbc::interface::{
    CDataType, Completion, ConnectAttr, DiagRecord, HandleKind, Indicator, OdbcDriver,
    OdbcVersion, RawHandle, SqlCode, SqlDataType,
};
pub use crate::odbc::params::{ParamBinding, ParamData};
pub use crate::odbc::statement::OdbcStatement;
