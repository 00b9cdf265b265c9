use thiserror::Error;

/// Convenience alias for results produced by socialgeo.
pub type Result<T> = std::result::Result<T, DemoError>;

/// Top-level error type returned by the storage backends and the tour.
///
/// One variant per step of the tour, so a failure names the step it came from.
#[derive(Debug, Error)]
pub enum DemoError {
    /// The storage service could not be reached.
    #[error("connection to {endpoint} failed: {message}")]
    Connection { endpoint: String, message: String },

    /// Namespace/database selection was refused.
    #[error("namespace/database selection failed: {message}")]
    Usage { message: String },

    /// Credentials were rejected.
    #[error("authentication failed: {message}")]
    Auth { message: String },

    /// The session token could not be applied.
    #[error("token rejected: {message}")]
    Token { message: String },

    /// A record could not be created.
    #[error("write to `{table}` failed: {message}")]
    Write { table: String, message: String },

    /// A query (relate, select, update or live select) failed.
    #[error("query failed: {message}")]
    Query { message: String },

    /// Session invalidation failed.
    #[error("session invalidation failed: {message}")]
    Cleanup { message: String },

    /// Client-side validation rejected a record before it was sent.
    #[error("validation failed")]
    Validation(#[from] ValidationError),

    /// A record identifier did not have the `table:key` form.
    #[error("invalid record id `{value}`")]
    InvalidRecordId { value: String },

    /// The configuration could not be loaded or is inconsistent.
    #[error("invalid configuration: {message}")]
    Config { message: String },
}

impl DemoError {
    pub fn connection(endpoint: impl Into<String>, message: impl ToString) -> Self {
        Self::Connection {
            endpoint: endpoint.into(),
            message: message.to_string(),
        }
    }

    pub fn usage(message: impl ToString) -> Self {
        Self::Usage { message: message.to_string() }
    }

    pub fn auth(message: impl ToString) -> Self {
        Self::Auth { message: message.to_string() }
    }

    pub fn token(message: impl ToString) -> Self {
        Self::Token { message: message.to_string() }
    }

    pub fn write(table: impl Into<String>, message: impl ToString) -> Self {
        Self::Write {
            table: table.into(),
            message: message.to_string(),
        }
    }

    pub fn query(message: impl ToString) -> Self {
        Self::Query { message: message.to_string() }
    }

    pub fn cleanup(message: impl ToString) -> Self {
        Self::Cleanup { message: message.to_string() }
    }

    pub fn config(message: impl ToString) -> Self {
        Self::Config { message: message.to_string() }
    }
}

/// Collection of validation issues encountered while preparing a record.
#[derive(Debug, Error)]
#[error("validation errors: {issues:?}")]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationError {
    pub fn new<I>(issues: I) -> Self
    where
        I: IntoIterator<Item = ValidationIssue>,
    {
        Self {
            issues: issues.into_iter().collect(),
        }
    }
}

/// Detailed validation failure for a single field.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub field: String,
    pub code: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(field: impl Into<String>, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            code: code.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failing_step() {
        let err = DemoError::write("posts", "author persons:ghost does not exist");
        assert_eq!(err.to_string(), "write to `posts` failed: author persons:ghost does not exist");

        let err = DemoError::connection("ws://nowhere:1", "refused");
        assert!(err.to_string().contains("ws://nowhere:1"));
    }

    #[test]
    fn validation_error_converts() {
        let err: DemoError = ValidationError::new([ValidationIssue::new("email", "email", "not an email")]).into();
        match err {
            DemoError::Validation(inner) => {
                assert_eq!(inner.issues.len(), 1);
                assert_eq!(inner.issues[0].field, "email");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
