use thiserror::Error;

/// Result type for calculator operations
pub type Result<T> = std::result::Result<T, GpaError>;

/// Errors surfaced by the grade core and its collaborators.
///
/// Every variant is reported before any session state is touched, so a caller
/// holding an `Err` can assume the session is exactly as it was.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GpaError {
    /// Malformed submission (missing part/semester, empty grade list, unknown grade token)
    #[error("invalid submission: {0}")]
    Validation(String),

    /// A submitted course code is not in the catalog
    #[error("Course code not found: {0}")]
    CourseNotFound(String),

    /// An operation needing recorded semesters ran against an empty session
    #[error("No calculation data to save.")]
    EmptyState,

    /// Record store failure (I/O, encoding)
    #[error("record store error: {0}")]
    Store(String),

    /// Course catalog failure (unreadable or inconsistent seed data)
    #[error("course catalog error: {0}")]
    Catalog(String),

    /// Page template failed to render
    #[error("render error: {0}")]
    Render(String),

    /// Invalid environment configuration
    #[error("configuration error: {0}")]
    Config(String),
}

impl GpaError {
    /// True for errors caused by the caller's input rather than infrastructure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            GpaError::Validation(_) | GpaError::CourseNotFound(_) | GpaError::EmptyState
        )
    }
}

impl From<std::io::Error> for GpaError {
    fn from(err: std::io::Error) -> Self {
        GpaError::Store(err.to_string())
    }
}

impl From<bincode::Error> for GpaError {
    fn from(err: bincode::Error) -> Self {
        GpaError::Store(err.to_string())
    }
}
