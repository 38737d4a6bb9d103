use sqlx::{Any, Transaction};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::{TransactionError, TransactionResult};

/// Executor wraps a database transaction for use by repositories.
///
/// This is the transaction-scoped handle a unit of work receives. Clones share
/// the same underlying transaction, so several repositories can work inside
/// one transaction. Beginning a transaction on an `Executor` opens a savepoint
/// at the next nesting depth.
#[derive(Clone, Debug)]
pub struct Executor {
    pub tx: Arc<Mutex<Option<Transaction<'static, Any>>>>,
    depth: usize,
}

/// Statements used to scope a nested transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Savepoint {
    Create,
    Release,
    RollbackTo,
}

impl Savepoint {
    fn statement(self, name: &str) -> String {
        match self {
            Savepoint::Create => format!("SAVEPOINT {name}"),
            Savepoint::Release => format!("RELEASE SAVEPOINT {name}"),
            Savepoint::RollbackTo => format!("ROLLBACK TO SAVEPOINT {name}"),
        }
    }

    fn failure(self, err: sqlx::Error) -> TransactionError {
        match self {
            Savepoint::Create => TransactionError::BeginFailed(err),
            Savepoint::Release => TransactionError::CommitFailed(err),
            Savepoint::RollbackTo => TransactionError::RollbackFailed(err),
        }
    }
}

impl Executor {
    /// Creates a new Executor from a database transaction.
    pub fn new(tx: Transaction<'static, Any>) -> Self {
        Self {
            tx: Arc::new(Mutex::new(Some(tx))),
            depth: 0,
        }
    }

    /// Nesting depth: 0 for the outermost transaction, n for the n-th savepoint.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether the underlying transaction has been committed or rolled back.
    pub async fn is_completed(&self) -> bool {
        self.tx.lock().await.is_none()
    }

    pub(crate) fn nested(&self) -> Self {
        Self {
            tx: Arc::clone(&self.tx),
            depth: self.depth + 1,
        }
    }

    pub(crate) fn savepoint_name(&self) -> String {
        format!("uow_savepoint_{}", self.depth)
    }

    /// Takes ownership of the transaction, leaving None in its place.
    /// This should only be called when committing or rolling back.
    pub(crate) async fn take_transaction(&self) -> TransactionResult<Transaction<'static, Any>> {
        self.tx.lock().await.take().ok_or(TransactionError::AlreadyCompleted)
    }

    pub(crate) async fn execute_raw(&self, sql: &str) -> TransactionResult<()> {
        let mut tx_guard = self.tx.lock().await;
        let tx = tx_guard.as_mut().ok_or(TransactionError::AlreadyCompleted)?;
        sqlx::query(sql).execute(&mut **tx).await?;
        Ok(())
    }

    pub(crate) async fn savepoint(&self, op: Savepoint) -> TransactionResult<()> {
        let statement = op.statement(&self.savepoint_name());
        self.execute_raw(&statement).await.map_err(|err| match err {
            TransactionError::Database(err) => op.failure(err),
            other => other,
        })
    }

    /// Name of the database backend, e.g. `PostgreSQL` or `SQLite`.
    pub(crate) async fn backend_name(&self) -> TransactionResult<String> {
        let tx_guard = self.tx.lock().await;
        let tx = tx_guard.as_ref().ok_or(TransactionError::AlreadyCompleted)?;
        Ok(tx.backend_name().to_string())
    }
}
