//! Generic SQL driver.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{Connection, Driver};
use crate::params::ParamStyle;

/// Settings of a [`GenericDriver`], usually loaded from a configuration file.
///
/// Missing fields take their ANSI defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Driver name, also part of the cache key.
    pub name: String,
    /// Opening identifier quote.
    pub quote_left: char,
    /// Closing identifier quote.
    pub quote_right: char,
    /// Marker style.
    pub param_style: ParamStyle,
    /// Whether `LIMIT .. OFFSET ..` is understood.
    pub limit_offset: bool,
    /// Whether `VALUES (..), (..)` is understood.
    pub multi_row_insert: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            name: String::from("ansi"),
            quote_left: '"',
            quote_right: '"',
            param_style: ParamStyle::Named,
            limit_offset: true,
            multi_row_insert: true,
        }
    }
}

/// A configurable driver following ANSI SQL.
#[derive(Debug, Clone, Default)]
pub struct GenericDriver {
    config: DriverConfig,
    connection: Option<Arc<dyn Connection>>,
}

impl GenericDriver {
    /// The ANSI driver: double-quoted identifiers and named markers.
    #[must_use]
    pub fn ansi() -> Self {
        Self::default()
    }

    /// Creates a driver from explicit settings.
    #[must_use]
    pub fn from_config(config: DriverConfig) -> Self {
        Self {
            config,
            connection: None,
        }
    }

    /// Attaches a connection used to quote strings.
    #[must_use]
    pub fn with_connection(mut self, connection: Arc<dyn Connection>) -> Self {
        self.connection = Some(connection);
        self
    }

    /// The driver settings.
    #[must_use]
    pub const fn config(&self) -> &DriverConfig {
        &self.config
    }
}

impl Driver for GenericDriver {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn identifier_quotes(&self) -> (char, char) {
        (self.config.quote_left, self.config.quote_right)
    }

    fn param_style(&self) -> ParamStyle {
        self.config.param_style
    }

    fn connection(&self) -> Option<&dyn Connection> {
        self.connection.as_deref()
    }

    fn supports_limit_offset(&self) -> bool {
        self.config.limit_offset
    }

    fn supports_multi_row_insert(&self) -> bool {
        self.config.multi_row_insert
    }
}
