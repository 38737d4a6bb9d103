use async_trait::async_trait;
use sqlx::AnyPool;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::executor::Savepoint;
use crate::{
    Context, Executor, IsolationLevel, TransactionError, TransactionOptions, TransactionResult,
};

/// A transactional store: something a transaction can be started against.
///
/// The store owns the meaning of begin, commit and rollback, including how
/// nesting behaves and how options are applied. Implementations must honor
/// the context they are given.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    type Session: UnitOfWorkSession;

    /// Begin a new transaction session.
    async fn begin(
        &self,
        ctx: &Context,
        options: &TransactionOptions,
    ) -> TransactionResult<Self::Session>;
}

/// Represents a single open transaction.
///
/// Exactly one of `commit` or `rollback` ends the session.
#[async_trait]
pub trait UnitOfWorkSession: Send + Sync {
    /// Transaction-scoped handle passed to the unit of work.
    type Handle: Clone + Send + Sync + 'static;

    fn handle(&self) -> Self::Handle;

    /// Commit the transaction. A finished context turns the commit into a
    /// rollback and reports the context error.
    async fn commit(self, ctx: &Context) -> TransactionResult<()>;

    /// Roll the transaction back.
    async fn rollback(self) -> TransactionResult<()>;
}

/// Handle type a store hands to its units of work.
pub type HandleOf<S> = <<S as UnitOfWork>::Session as UnitOfWorkSession>::Handle;

/// SQL store over a shared `sqlx` connection pool (PostgreSQL or SQLite).
///
/// The pool is borrowed, never opened or closed here.
pub struct SqlxUnitOfWork {
    pool: Arc<AnyPool>,
}

impl SqlxUnitOfWork {
    /// Create a new SqlxUnitOfWork with the given connection pool.
    pub fn new(pool: Arc<AnyPool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }
}

#[async_trait]
impl UnitOfWork for SqlxUnitOfWork {
    type Session = SqlxSession;

    async fn begin(
        &self,
        ctx: &Context,
        options: &TransactionOptions,
    ) -> TransactionResult<Self::Session> {
        let tx = ctx
            .run(self.pool.begin())
            .await?
            .map_err(TransactionError::BeginFailed)?;
        let executor = Executor::new(tx);
        apply_options(&executor, options).await?;
        debug!(?options, "transaction began");
        Ok(SqlxSession::new(executor))
    }
}

/// Nested transactions: beginning on an open transaction creates a savepoint.
/// Options only apply to the outermost transaction and are ignored here.
#[async_trait]
impl UnitOfWork for Executor {
    type Session = SqlxSession;

    async fn begin(
        &self,
        ctx: &Context,
        _options: &TransactionOptions,
    ) -> TransactionResult<Self::Session> {
        let nested = self.nested();
        ctx.run(nested.savepoint(Savepoint::Create)).await??;
        debug!(depth = nested.depth(), "savepoint created");
        Ok(SqlxSession::new(nested))
    }
}

/// Session over an [`Executor`]; commits or releases depending on depth.
#[derive(Debug)]
pub struct SqlxSession {
    executor: Executor,
}

impl SqlxSession {
    /// Create a new session around an executor.
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    async fn undo(&self) -> TransactionResult<()> {
        if self.executor.depth() == 0 {
            let tx = self.executor.take_transaction().await?;
            tx.rollback().await.map_err(TransactionError::RollbackFailed)?;
        } else {
            self.executor.savepoint(Savepoint::RollbackTo).await?;
        }
        debug!(depth = self.executor.depth(), "transaction rolled back");
        Ok(())
    }
}

#[async_trait]
impl UnitOfWorkSession for SqlxSession {
    type Handle = Executor;

    fn handle(&self) -> Executor {
        self.executor.clone()
    }

    async fn commit(self, ctx: &Context) -> TransactionResult<()> {
        if let Some(err) = ctx.err() {
            trace!(depth = self.executor.depth(), %err, "context finished before commit");
            if let Err(undo_err) = self.undo().await {
                trace!(depth = self.executor.depth(), %undo_err, "rollback after finished context failed");
            }
            return Err(err.into());
        }

        if self.executor.depth() == 0 {
            // Take ownership of the transaction
            let tx = self.executor.take_transaction().await?;
            tx.commit().await.map_err(TransactionError::CommitFailed)?;
        } else {
            self.executor.savepoint(Savepoint::Release).await?;
        }
        debug!(depth = self.executor.depth(), "transaction committed");
        Ok(())
    }

    async fn rollback(self) -> TransactionResult<()> {
        self.undo().await
    }
}

/// Applies options to a freshly begun transaction.
///
/// PostgreSQL takes a `SET TRANSACTION` statement. SQLite transactions are
/// always serializable, so only that level is accepted there.
async fn apply_options(executor: &Executor, options: &TransactionOptions) -> TransactionResult<()> {
    let Some(statement) = options.set_transaction_sql() else {
        return Ok(());
    };
    let backend = executor.backend_name().await?;
    match backend.as_str() {
        "PostgreSQL" => executor.execute_raw(&statement).await,
        "SQLite"
            if !options.read_only
                && matches!(options.isolation, None | Some(IsolationLevel::Serializable)) =>
        {
            Ok(())
        }
        _ => Err(TransactionError::UnsupportedOptions {
            backend,
            detail: statement,
        }),
    }
}
