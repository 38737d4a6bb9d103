use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use transactional_executor::{
    Context, TransactionError, TransactionOptions, TransactionResult, UnitOfWork,
    UnitOfWorkSession,
};

/// What the store was asked to do, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Begin,
    Commit,
    Rollback,
}

/// Which store operations fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct Faults {
    pub begin: bool,
    pub commit: bool,
    pub rollback: bool,
}

/// In-memory store with injectable failures. Writes become visible in
/// `committed()` only after a successful commit.
#[derive(Default)]
pub struct ScriptedStore {
    faults: Faults,
    steps: Arc<Mutex<Vec<Step>>>,
    committed: Arc<Mutex<Vec<String>>>,
    last_options: Mutex<Option<TransactionOptions>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_faults(faults: Faults) -> Self {
        Self {
            faults,
            ..Self::default()
        }
    }

    pub fn steps(&self) -> Vec<Step> {
        self.steps.lock().clone()
    }

    pub fn committed(&self) -> Vec<String> {
        self.committed.lock().clone()
    }

    pub fn last_options(&self) -> Option<TransactionOptions> {
        *self.last_options.lock()
    }
}

/// Transaction handle of the scripted store.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTx {
    writes: Arc<Mutex<Vec<String>>>,
}

impl ScriptedTx {
    pub fn write(&self, value: &str) {
        self.writes.lock().push(value.to_string());
    }
}

pub struct ScriptedSession {
    tx: ScriptedTx,
    faults: Faults,
    steps: Arc<Mutex<Vec<Step>>>,
    committed: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl UnitOfWork for ScriptedStore {
    type Session = ScriptedSession;

    async fn begin(
        &self,
        ctx: &Context,
        options: &TransactionOptions,
    ) -> TransactionResult<Self::Session> {
        if let Some(err) = ctx.err() {
            return Err(err.into());
        }
        *self.last_options.lock() = Some(*options);
        if self.faults.begin {
            return Err(TransactionError::BeginFailed(sqlx::Error::PoolTimedOut));
        }
        self.steps.lock().push(Step::Begin);
        Ok(ScriptedSession {
            tx: ScriptedTx::default(),
            faults: self.faults,
            steps: Arc::clone(&self.steps),
            committed: Arc::clone(&self.committed),
        })
    }
}

#[async_trait]
impl UnitOfWorkSession for ScriptedSession {
    type Handle = ScriptedTx;

    fn handle(&self) -> ScriptedTx {
        self.tx.clone()
    }

    async fn commit(self, ctx: &Context) -> TransactionResult<()> {
        self.steps.lock().push(Step::Commit);
        if let Some(err) = ctx.err() {
            return Err(err.into());
        }
        if self.faults.commit {
            return Err(TransactionError::CommitFailed(sqlx::Error::Protocol(
                "could not serialize access due to concurrent update".to_string(),
            )));
        }
        let writes = std::mem::take(&mut *self.tx.writes.lock());
        self.committed.lock().extend(writes);
        Ok(())
    }

    async fn rollback(self) -> TransactionResult<()> {
        self.steps.lock().push(Step::Rollback);
        if self.faults.rollback {
            return Err(TransactionError::RollbackFailed(sqlx::Error::PoolClosed));
        }
        Ok(())
    }
}
