//! Runs a unit of work inside a transaction and tells business failures apart
//! from failures of the transaction itself.

use std::error::Error as StdError;
use std::fmt;
use std::future::Future;

use crate::unit_of_work::{HandleOf, UnitOfWork, UnitOfWorkSession};
use crate::{Context, TransactionError, TransactionOptions};

/// A transaction that did not commit.
///
/// The infrastructure error is always present. The business error is present
/// only when the unit of work itself returned one, and in that case it is the
/// authoritative cause: exactly the value the unit of work returned.
#[derive(Debug)]
pub struct TransactionFailure<E> {
    business: Option<E>,
    infra: TransactionError,
}

impl<E> TransactionFailure<E> {
    /// Rollback caused by business logic.
    pub fn business(business: E, infra: TransactionError) -> Self {
        Self {
            business: Some(business),
            infra,
        }
    }

    /// Failure of the store alone: begin, commit, or context expiry.
    pub fn infrastructure(infra: TransactionError) -> Self {
        Self {
            business: None,
            infra,
        }
    }

    /// The business error, if the unit of work returned one.
    pub fn business_error(&self) -> Option<&E> {
        self.business.as_ref()
    }

    /// The store's own error; always present.
    pub fn infra_error(&self) -> &TransactionError {
        &self.infra
    }

    /// True when the unit of work caused the rollback.
    pub fn is_business(&self) -> bool {
        self.business.is_some()
    }

    /// Takes the business error, dropping the infrastructure error.
    pub fn into_business(self) -> Option<E> {
        self.business
    }

    /// Splits into the business error (if any) and the infrastructure error.
    pub fn into_parts(self) -> (Option<E>, TransactionError) {
        (self.business, self.infra)
    }

    /// Collapse into a single business-typed error. The business error wins
    /// untouched; `convert` only sees infrastructure-only failures.
    pub fn merge<C>(self, convert: C) -> E
    where
        C: FnOnce(TransactionError) -> E,
    {
        match self.business {
            Some(business) => business,
            None => convert(self.infra),
        }
    }
}

impl<E: fmt::Display> fmt::Display for TransactionFailure<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.business {
            Some(business) => business.fmt(f),
            None => self.infra.fmt(f),
        }
    }
}

impl<E> StdError for TransactionFailure<E>
where
    E: StdError + 'static,
{
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match &self.business {
            Some(_) => Some(&self.infra),
            None => self.infra.source(),
        }
    }
}

/// Adapters from the transaction outcome to the other reporting shapes.
pub trait TransactionOutcomeExt<T, E> {
    /// The (business, infrastructure) pair. Both are `None` on success.
    fn into_errors(self) -> (Option<E>, Option<TransactionError>);

    /// Single-error shape: infrastructure-only failures pass through `convert`.
    fn or_convert<C>(self, convert: C) -> Result<T, E>
    where
        C: FnOnce(TransactionError) -> E;
}

impl<T, E> TransactionOutcomeExt<T, E> for Result<T, TransactionFailure<E>> {
    fn into_errors(self) -> (Option<E>, Option<TransactionError>) {
        match self {
            Ok(_) => (None, None),
            Err(failure) => {
                let (business, infra) = failure.into_parts();
                (business, Some(infra))
            }
        }
    }

    fn or_convert<C>(self, convert: C) -> Result<T, E>
    where
        C: FnOnce(TransactionError) -> E,
    {
        self.map_err(|failure| failure.merge(convert))
    }
}

/// Runs `unit_of_work` in a transaction on `store` with default options.
pub async fn transaction<S, F, Fut, T, E>(
    ctx: &Context,
    store: &S,
    unit_of_work: F,
) -> Result<T, TransactionFailure<E>>
where
    S: UnitOfWork,
    F: FnOnce(HandleOf<S>) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    transaction_with(ctx, store, &TransactionOptions::default(), unit_of_work).await
}

/// Runs `unit_of_work` in a transaction on `store`.
///
/// One begin, one invocation of `unit_of_work`, then one commit (on `Ok`) or
/// one rollback (on `Err`). `options` go to the store untouched. The store is
/// borrowed; nesting works by passing the handle back in as the store.
///
/// The unit of work always runs to completion and its result is captured;
/// `ctx` is honored by the store (begin, commit, database I/O). A unit of work
/// that returns `Ok` after the deadline fails infrastructure-only at commit,
/// while one that returns a business error keeps it.
pub async fn transaction_with<S, F, Fut, T, E>(
    ctx: &Context,
    store: &S,
    options: &TransactionOptions,
    unit_of_work: F,
) -> Result<T, TransactionFailure<E>>
where
    S: UnitOfWork,
    F: FnOnce(HandleOf<S>) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
{
    let session = store
        .begin(ctx, options)
        .await
        .map_err(TransactionFailure::infrastructure)?;

    match unit_of_work(session.handle()).await {
        Ok(value) => match session.commit(ctx).await {
            Ok(()) => Ok(value),
            Err(infra) => Err(TransactionFailure::infrastructure(infra)),
        },
        Err(business) => {
            let infra = match session.rollback().await {
                Ok(()) => TransactionError::RolledBack(business.to_string()),
                Err(err) => err,
            };
            Err(TransactionFailure::business(business, infra))
        }
    }
}

/// Single-error shape of [`transaction`].
pub async fn transaction_converted<S, F, Fut, T, E, C>(
    ctx: &Context,
    store: &S,
    unit_of_work: F,
    convert: C,
) -> Result<T, E>
where
    S: UnitOfWork,
    F: FnOnce(HandleOf<S>) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: fmt::Display,
    C: FnOnce(TransactionError) -> E,
{
    transaction(ctx, store, unit_of_work).await.or_convert(convert)
}
