use std::borrow::Cow;
use std::error::Error as StdError;
use std::sync::Arc;

use crate::error::TransactionError;

/// Reason attached by [`BusinessError::transaction_failed`].
pub const REASON_TRANSACTION_FAILED: &str = "SERVER_DB_TRANSACTION_ERROR";

/// Application-level error with a machine-readable reason and status code.
///
/// Any `Display` type can serve as the business error of a transaction; this
/// one is provided for callers without their own error taxonomy.
#[derive(Debug, Clone, thiserror::Error)]
#[error("error: code = {code} reason = {reason} message = {message}")]
pub struct BusinessError {
    code: u16,
    reason: Cow<'static, str>,
    message: String,
    #[source]
    source: Option<Arc<dyn StdError + Send + Sync>>,
}

impl BusinessError {
    pub fn new(code: u16, reason: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
        Self {
            code,
            reason: reason.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Wrap a low-level error under a business reason.
    pub fn wrap<E>(code: u16, reason: impl Into<Cow<'static, str>>, err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::new(code, reason, err.to_string()).with_source(err)
    }

    /// Stock conversion for transactions that failed without a business error.
    pub fn transaction_failed(err: TransactionError) -> Self {
        Self::wrap(500, REASON_TRANSACTION_FAILED, err)
    }

    pub fn with_source<E>(mut self, err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.source = Some(Arc::new(err));
        self
    }

    pub fn code(&self) -> u16 {
        self.code
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Matches on both reason and code, like a generated `IsXxx` helper would.
    pub fn is(&self, code: u16, reason: &str) -> bool {
        self.code == code && self.reason == reason
    }
}

impl PartialEq for BusinessError {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code && self.reason == other.reason && self.message == other.message
    }
}
