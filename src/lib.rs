//! Transactional Executor
//!
//! Runs a unit of work inside a database transaction and reports failures in
//! two categories: business errors returned by the unit of work, and
//! infrastructure errors raised by the transaction itself (begin or commit
//! failures, context cancellation or deadline).
//!
//! The store is borrowed and treated as a black box behind [`UnitOfWork`];
//! [`SqlxUnitOfWork`] provides one over a `sqlx` pool, and an [`Executor`] is
//! itself a store for nested transactions.

pub mod business;
pub mod context;
pub mod error;
pub mod executor;
pub mod options;
pub mod transaction;
pub mod unit_of_work;

pub use business::{BusinessError, REASON_TRANSACTION_FAILED};
pub use context::{Context, ContextError};
pub use error::{TransactionError, TransactionResult};
pub use executor::Executor;
pub use options::{IsolationLevel, TransactionOptions};
pub use transaction::{
    transaction, transaction_converted, transaction_with, TransactionFailure,
    TransactionOutcomeExt,
};
pub use unit_of_work::{HandleOf, SqlxSession, SqlxUnitOfWork, UnitOfWork, UnitOfWorkSession};
