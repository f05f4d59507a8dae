//! Error types for statement building and compilation.

use thiserror::Error;

/// The two families of failure a statement tree can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input rejected while building the tree.
    InvalidArgument,
    /// The assembled tree or the driver cannot produce a statement.
    Runtime,
}

/// Errors raised while building or compiling statements.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// An identifier does not match the identifier pattern.
    #[error("invalid identifier `{0}`")]
    InvalidIdentifier(String),

    /// An alias does not match the alias pattern.
    #[error("invalid alias `{0}`")]
    InvalidAlias(String),

    /// A literal is empty.
    #[error("invalid literal: {0}")]
    InvalidLiteral(String),

    /// An operator is unknown or not allowed in this position.
    #[error("invalid operator `{0}`")]
    InvalidOperator(String),

    /// A value cannot be used in this position.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// An expression template and its substitutions disagree.
    #[error("invalid expression `{template}`: {message}")]
    InvalidExpression {
        /// The offending template.
        template: String,
        /// What is wrong with it.
        message: String,
    },

    /// A declarative predicate specification has no recognised shape.
    #[error("invalid predicate spec {spec}: {message}")]
    InvalidSpec {
        /// The offending specification, rendered as JSON.
        spec: String,
        /// What is wrong with it.
        message: String,
    },

    /// The statement has no target table.
    #[error("{statement} statement has no table")]
    MissingTable {
        /// Statement keyword (`SELECT`, `INSERT`, ...).
        statement: &'static str,
    },

    /// UPDATE or DELETE without a WHERE clause.
    #[error("{statement} statement requires a non-empty WHERE clause")]
    MissingWhere {
        /// Statement keyword.
        statement: &'static str,
    },

    /// INSERT without rows or source select, or UPDATE without assignments.
    #[error("{statement} statement has nothing to write")]
    MissingValues {
        /// Statement keyword.
        statement: &'static str,
    },

    /// The target table was already set.
    #[error("table is already set to `{0}`")]
    TableAlreadySet(String),

    /// UNION and INTERSECT were combined on the same select.
    #[error("cannot use {requested} while {existing} is set")]
    CombineConflict {
        /// The operator already present.
        existing: &'static str,
        /// The operator the caller tried to add.
        requested: &'static str,
    },

    /// An insert row does not line up with the column list.
    #[error("row does not match the insert columns: {0}")]
    ColumnMismatch(String),

    /// Explicit rows and a source select on the same insert.
    #[error("insert cannot have both explicit rows and a source select")]
    SourceConflict,

    /// The driver cannot express a feature the statement uses.
    #[error("driver `{driver}` does not support {feature}")]
    Unsupported {
        /// Driver name.
        driver: String,
        /// The missing capability.
        feature: &'static str,
    },

    /// String values cannot be quoted without a live connection.
    #[error("driver `{0}` cannot quote string values without a connection")]
    NoConnection(String),
}

impl Error {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidIdentifier(_)
            | Self::InvalidAlias(_)
            | Self::InvalidLiteral(_)
            | Self::InvalidOperator(_)
            | Self::InvalidValue(_)
            | Self::InvalidExpression { .. }
            | Self::InvalidSpec { .. } => ErrorKind::InvalidArgument,
            Self::MissingTable { .. }
            | Self::MissingWhere { .. }
            | Self::MissingValues { .. }
            | Self::TableAlreadySet(_)
            | Self::CombineConflict { .. }
            | Self::ColumnMismatch(_)
            | Self::SourceConflict
            | Self::Unsupported { .. }
            | Self::NoConnection(_) => ErrorKind::Runtime,
        }
    }

    /// Returns true for errors raised while building the tree.
    #[must_use]
    pub const fn is_invalid_argument(&self) -> bool {
        matches!(self.kind(), ErrorKind::InvalidArgument)
    }

    /// Returns true for errors raised by the assembled tree or the driver.
    #[must_use]
    pub const fn is_runtime(&self) -> bool {
        matches!(self.kind(), ErrorKind::Runtime)
    }

    pub(crate) fn spec(spec: &serde_json::Value, message: impl Into<String>) -> Self {
        Self::InvalidSpec {
            spec: spec.to_string(),
            message: message.into(),
        }
    }
}

/// Result type for statement building and compilation.
pub type Result<T> = std::result::Result<T, Error>;
