mod error;
mod types;

pub mod odbc;
pub mod prelude;

pub use error::OdbcMiddlewareError;
pub use types::{ParamValue, Row};

pub use odbc::config::{OdbcOptions, OdbcOptionsBuilder};
pub use odbc::connection::OdbcConnection;
pub use odbc::interface::OdbcDriver;
pub use odbc::statement::OdbcStatement;
