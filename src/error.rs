//! Error taxonomy shared by every store backend.

/// Result alias for store operations.
pub type ForumResult<T> = Result<T, ForumError>;

/// Typed outcome of a failed store operation.
///
/// The variants are coarse on purpose: the HTTP layer needs to tell "absent"
/// from "nothing changed" from "inconsistent request", not the underlying
/// SQL detail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForumError {
    /// Referenced entity is absent, or deleted where deletion hides it.
    #[error("not found")]
    NotFound,
    /// A targeted update/delete/insert touched zero rows.
    #[error("no rows affected")]
    NoRowsAffected,
    /// Cross-entity consistency violation caught before mutation.
    #[error("validation failed: {0}")]
    Validation(String),
    /// Uniqueness violation (username, email, topic name).
    #[error("conflict: {0}")]
    Conflict(String),
    /// Backing store connectivity or protocol failure.
    #[error("unexpected store error: {0}")]
    Unexpected(String),
}

impl ForumError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an unexpected error from any error type.
    pub fn unexpected<E: std::fmt::Display>(e: E) -> Self {
        Self::Unexpected(e.to_string())
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::NoRowsAffected => "NO_ROWS_AFFECTED",
            Self::Validation(_) => "VALIDATION",
            Self::Conflict(_) => "CONFLICT",
            Self::Unexpected(_) => "UNEXPECTED",
        }
    }
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for ForumError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => Self::NotFound,
            sqlx::Error::Database(ref db) if db.code().as_deref() == Some("23505") => {
                Self::Conflict(db.constraint().unwrap_or("unique constraint").to_string())
            }
            other => Self::Unexpected(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_distinct() {
        let codes = [
            ForumError::NotFound.code(),
            ForumError::NoRowsAffected.code(),
            ForumError::validation("x").code(),
            ForumError::Conflict("x".into()).code(),
            ForumError::unexpected("x").code(),
        ];
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }

    #[test]
    fn test_display() {
        assert_eq!(ForumError::NoRowsAffected.to_string(), "no rows affected");
        assert_eq!(
            ForumError::validation("parent comment belongs to another post").to_string(),
            "validation failed: parent comment belongs to another post"
        );
    }
}
