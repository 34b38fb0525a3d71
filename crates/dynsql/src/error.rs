//! Error types for dynsql

use thiserror::Error;

/// Result type alias for dynsql operations
pub type SqlResult<T> = Result<T, SqlError>;

/// Errors raised while validating, building, or executing statements.
///
/// The first five variants are raised before any SQL is built or any I/O
/// happens. Everything else comes from an [`Executor`](crate::Executor) and is
/// passed through unchanged.
#[derive(Debug, Error)]
pub enum SqlError {
    /// A column name does not match `[A-Za-z_][A-Za-z0-9_]*`, or no
    /// column can be resolved for the requested role
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// A table name is malformed or collides with a reserved command keyword
    #[error("Invalid or reserved table name: {0}")]
    ReservedOrInvalidTable(String),

    /// An operator outside the supported set
    #[error("Invalid operator: {0}")]
    InvalidOperator(String),

    /// A text literal containing `'`, `"` or `;`
    #[error("Invalid value: {0}")]
    UnsafeLiteral(String),

    /// Structurally invalid payload (empty data, empty WHERE, zero batch size, ...)
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Unique constraint violation
    #[error("Unique constraint violation: {message}")]
    UniqueViolation {
        message: String,
        #[source]
        source: tokio_postgres::Error,
    },

    /// Foreign key constraint violation
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation {
        message: String,
        #[source]
        source: tokio_postgres::Error,
    },

    /// Check constraint violation
    #[error("Check constraint violation: {message}")]
    CheckViolation {
        message: String,
        #[source]
        source: tokio_postgres::Error,
    },

    /// Error reported by a non-PostgreSQL executor
    #[error("Execution error: {0}")]
    Execution(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Record decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl SqlError {
    /// Create an invalid identifier error
    pub fn invalid_identifier(name: impl Into<String>) -> Self {
        Self::InvalidIdentifier(name.into())
    }

    /// Create a malformed payload error
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedPayload(message.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Wrap an error raised by a foreign executor.
    pub fn execution<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Execution(err.into())
    }

    /// Whether this error was raised by validation (before any I/O).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidIdentifier(_)
                | Self::ReservedOrInvalidTable(_)
                | Self::InvalidOperator(_)
                | Self::UnsafeLiteral(_)
                | Self::MalformedPayload(_)
        )
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Parse a tokio_postgres error into a more specific SqlError
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        let Some(db_err) = err.as_db_error() else {
            return Self::Query(err);
        };
        let message = format!(
            "{}: {}",
            db_err.constraint().unwrap_or("unknown"),
            db_err.message()
        );
        let code = db_err.code().code().to_string();

        match code.as_str() {
            "23505" => Self::UniqueViolation {
                message,
                source: err,
            },
            "23503" => Self::ForeignKeyViolation {
                message,
                source: err,
            },
            "23514" => Self::CheckViolation {
                message,
                source: err,
            },
            _ => Self::Query(err),
        }
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for SqlError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
