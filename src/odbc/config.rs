use std::sync::Arc;

use crate::error::OdbcMiddlewareError;
use crate::odbc::connection::OdbcConnection;
use crate::odbc::interface::OdbcDriver;

/// Options for opening an ODBC connection.
///
/// The DSN names a data source registered with the driver manager; the
/// credentials default to empty strings, which many drivers accept for
/// sources that authenticate another way.
#[derive(Clone)]
pub struct OdbcOptions {
    pub dsn: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for OdbcOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OdbcOptions")
            .field("dsn", &self.dsn)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl OdbcOptions {
    #[must_use]
    pub fn new(dsn: impl Into<String>) -> Self {
        Self {
            dsn: dsn.into(),
            username: String::new(),
            password: String::new(),
        }
    }

    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Open a connection with these options.
    ///
    /// # Errors
    /// Returns `ConfigError` for an empty DSN, and `HandleError` or
    /// `ConnectionError` when the driver refuses the handshake.
    pub fn connect(self, driver: Arc<dyn OdbcDriver>) -> Result<OdbcConnection, OdbcMiddlewareError> {
        OdbcConnection::connect(driver, &self.dsn, &self.username, &self.password)
    }
}

/// Fluent builder for ODBC options.
#[derive(Debug, Clone)]
pub struct OdbcOptionsBuilder {
    opts: OdbcOptions,
}

impl OdbcOptionsBuilder {
    #[must_use]
    pub fn new(dsn: impl Into<String>) -> Self {
        Self {
            opts: OdbcOptions::new(dsn),
        }
    }

    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.opts.username = username.into();
        self
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.opts.password = password.into();
        self
    }

    #[must_use]
    pub fn finish(self) -> OdbcOptions {
        self.opts
    }

    /// Build the options and open a connection.
    ///
    /// # Errors
    /// Same failure modes as [`OdbcOptions::connect`].
    pub fn connect(self, driver: Arc<dyn OdbcDriver>) -> Result<OdbcConnection, OdbcMiddlewareError> {
        self.finish().connect(driver)
    }
}
