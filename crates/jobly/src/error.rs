//! Error types for jobly

use crate::changeset::ValidationErrors;
use thiserror::Error;

/// Result type alias for jobly operations
pub type JoblyResult<T> = Result<T, JoblyError>;

/// Error types for jobly operations
#[derive(Debug, Error)]
pub enum JoblyError {
    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Malformed input to a statement builder or entity operation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Request body failed field validation
    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    /// Missing, invalid or insufficient credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),

    /// Query timeout error
    #[error("Query timeout after {0:?}")]
    Timeout(std::time::Duration),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl JoblyError {
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

    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Create an unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is an invalid argument error
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// HTTP-equivalent status code for an outer request layer.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidArgument(_)
            | Self::Validation(_)
            | Self::UniqueViolation(_)
            | Self::ForeignKeyViolation(_)
            | Self::CheckViolation(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::NotFound(_) => 404,
            Self::Timeout(_) => 504,
            _ => 500,
        }
    }

    /// Parse a tokio_postgres error into a more specific JoblyError
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => return Self::UniqueViolation(format!("{}: {}", constraint, message)),
                "23503" => {
                    return Self::ForeignKeyViolation(format!("{}: {}", constraint, message));
                }
                "23514" => return Self::CheckViolation(format!("{}: {}", constraint, message)),
                _ => {}
            }
        }
        Self::Query(err)
    }
}

impl From<ValidationErrors> for JoblyError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for JoblyError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changeset::{ValidationCode, ValidationError};

    #[test]
    fn status_codes_follow_error_kind() {
        assert_eq!(JoblyError::invalid_argument("x").status_code(), 400);
        assert_eq!(JoblyError::unauthorized("x").status_code(), 401);
        assert_eq!(JoblyError::not_found("x").status_code(), 404);
        assert_eq!(JoblyError::UniqueViolation("x".into()).status_code(), 400);
        assert_eq!(JoblyError::Other("x".into()).status_code(), 500);
    }

    #[test]
    fn validation_errors_convert() {
        let mut errors = ValidationErrors::default();
        errors.push(ValidationError::new(
            "name",
            ValidationCode::Required,
            "name is required",
        ));
        let err: JoblyError = errors.into();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.to_string(), "Validation error: name: name is required");
    }
}
