use crate::context::ContextError;

/// Infrastructure error reported by the transactional store itself.
///
/// Never produced by a unit of work; see [`crate::TransactionFailure`] for how
/// it is paired with a business error.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    #[error("Transaction begin failed: {0}")]
    BeginFailed(#[source] sqlx::Error),

    #[error("Transaction commit failed: {0}")]
    CommitFailed(#[source] sqlx::Error),

    #[error("Transaction rollback failed: {0}")]
    RollbackFailed(#[source] sqlx::Error),

    /// The store rolled back on request; carries the rollback cause.
    #[error("Transaction rolled back: {0}")]
    RolledBack(String),

    #[error(transparent)]
    Context(#[from] ContextError),

    #[error("Transaction already committed or rolled back")]
    AlreadyCompleted,

    #[error("Transaction options not supported by {backend}: {detail}")]
    UnsupportedOptions { backend: String, detail: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl TransactionError {
    /// True when the store gave up because the context was cancelled or expired.
    pub fn is_context(&self) -> bool {
        matches!(self, TransactionError::Context(_))
    }

    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, TransactionError::Context(ContextError::DeadlineExceeded))
    }
}

/// Result type for transactional store operations
pub type TransactionResult<T> = Result<T, TransactionError>;
