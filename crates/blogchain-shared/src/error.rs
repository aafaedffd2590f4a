use thiserror::Error;

/// Rejected-operation outcomes shared by every Blogchain service.
///
/// Messages are descriptive and name the violated precondition; none of
/// these are fatal to the host process.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlogError {
    /// Entity, profile or username absent.
    #[error("{0}")]
    NotFound(String),

    /// Malformed identity string, oversized field or self-reference.
    #[error("{0}")]
    InvalidArgument(String),

    /// Actor is not the owning creator.
    #[error("{0}")]
    Unauthorized(String),

    /// Operation on a soft-deleted or otherwise terminal entity.
    #[error("{0}")]
    InvalidState(String),

    /// Duplicate username, profile, follow edge or like.
    #[error("{0}")]
    AlreadyExists(String),

    /// Underlying storage failed.
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Coarse classification of a [`BlogError`], used for status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    Unauthorized,
    InvalidState,
    AlreadyExists,
    Storage,
}

impl BlogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BlogError::NotFound(_) => ErrorKind::NotFound,
            BlogError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            BlogError::Unauthorized(_) => ErrorKind::Unauthorized,
            BlogError::InvalidState(_) => ErrorKind::InvalidState,
            BlogError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            BlogError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Prefix the message with context while keeping the kind.
    pub fn context(self, ctx: &str) -> Self {
        match self {
            BlogError::NotFound(m) => BlogError::NotFound(format!("{ctx}: {m}")),
            BlogError::InvalidArgument(m) => BlogError::InvalidArgument(format!("{ctx}: {m}")),
            BlogError::Unauthorized(m) => BlogError::Unauthorized(format!("{ctx}: {m}")),
            BlogError::InvalidState(m) => BlogError::InvalidState(format!("{ctx}: {m}")),
            BlogError::AlreadyExists(m) => BlogError::AlreadyExists(format!("{ctx}: {m}")),
            BlogError::Storage(m) => BlogError::Storage(format!("{ctx}: {m}")),
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, BlogError>;
