//! Walks through the transaction outcomes against an in-memory SQLite store.
//!
//! `RUST_LOG=debug cargo run --example transaction_demo`

use sqlx::any::AnyPoolOptions;
use sqlx::{AnyPool, Row};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use transactional_executor::{
    transaction, BusinessError, Context, Executor, SqlxUnitOfWork, TransactionError,
    TransactionOutcomeExt,
};

fn database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string())
}

fn db_error(err: TransactionError) -> BusinessError {
    BusinessError::wrap(500, "SERVER_DB_ERROR", err)
}

async fn insert_user(tx: &Executor, name: &str, age: i64) -> Result<(), BusinessError> {
    let mut tx_guard = tx.tx.lock().await;
    let conn = tx_guard
        .as_mut()
        .ok_or_else(|| db_error(TransactionError::AlreadyCompleted))?;
    sqlx::query("INSERT INTO demo_users (name, age) VALUES ($1, $2)")
        .bind(name.to_string())
        .bind(age)
        .execute(&mut **conn)
        .await
        .map_err(|err| db_error(err.into()))?;
    Ok(())
}

async fn count_users(pool: &AnyPool) -> Result<i64, sqlx::Error> {
    let row = sqlx::query("SELECT COUNT(*) AS count FROM demo_users")
        .fetch_one(pool)
        .await?;
    row.try_get("count")
}

async fn run(pool: &AnyPool) -> Result<(), sqlx::Error> {
    let store = SqlxUnitOfWork::new(Arc::new(pool.clone()));
    let background = Context::background();
    let ctx = &background;

    let outcome = transaction(ctx, &store, |tx| async move {
        insert_user(&tx, "alice", 30).await
    })
    .await
    .or_convert(BusinessError::transaction_failed);
    match outcome {
        Ok(()) => info!(users = count_users(pool).await?, "success transaction committed"),
        Err(erk) => error!(%erk, "success transaction failed"),
    }

    let (erk, err) = transaction(ctx, &store, |tx| async move {
        insert_user(&tx, "bob", 17).await?;
        Err::<(), _>(BusinessError::new(400, "BAD_REQUEST", "bob is under age"))
    })
    .await
    .into_errors();
    info!(
        business = ?erk.map(|e| e.reason().to_string()),
        infra = ?err.map(|e| e.to_string()),
        users = count_users(pool).await?,
        "business error rolled back"
    );

    let outcome = transaction(ctx, &store, |tx| async move {
        insert_user(&tx, "carol", 41).await?;
        let inner = transaction(ctx, &tx, |inner| async move {
            insert_user(&inner, "dave", 12).await?;
            Err::<(), _>(BusinessError::new(400, "BAD_REQUEST", "dave is under age"))
        })
        .await;
        if let Err(failure) = inner {
            info!(%failure, "nested transaction rolled back, keeping outer work");
        }
        Ok::<_, BusinessError>(())
    })
    .await;
    info!(
        committed = outcome.is_ok(),
        users = count_users(pool).await?,
        "nested transaction finished"
    );

    let timeout = ctx.with_timeout(Duration::from_millis(50));
    let (erk, err) = transaction(&timeout, &store, |tx| async move {
        insert_user(&tx, "erin", 22).await?;
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok::<_, BusinessError>(())
    })
    .await
    .into_errors();
    info!(
        business = erk.is_some(),
        infra = ?err.map(|e| e.to_string()),
        users = count_users(pool).await?,
        "slow transaction timed out"
    );

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), sqlx::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    sqlx::any::install_default_drivers();
    let pool = AnyPoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect(&database_url())
        .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS demo_users (name VARCHAR(255) NOT NULL, age BIGINT NOT NULL)",
    )
    .execute(&pool)
    .await?;

    info!("starting transaction demo");
    run(&pool).await?;
    info!("transaction demo completed");

    pool.close().await;
    Ok(())
}
