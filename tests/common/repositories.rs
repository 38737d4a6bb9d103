use sqlx::Row;
use uuid::Uuid;

use transactional_executor::{Executor, TransactionResult};

use super::entities::User;

/// User repository bound to one transaction.
#[derive(Clone)]
pub struct UserRepository {
    executor: Executor,
}

impl UserRepository {
    pub fn new(executor: Executor) -> Self {
        Self { executor }
    }

    pub async fn create(&self, user: &User) -> TransactionResult<()> {
        let mut tx_guard = self.executor.tx.lock().await;
        let tx = tx_guard.as_mut().ok_or(sqlx::Error::PoolClosed)?;
        sqlx::query("INSERT INTO users (id, name, age) VALUES ($1, $2, $3)")
            .bind(user.key())
            .bind(user.name.clone())
            .bind(user.age)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }

    pub async fn update_age(&self, id: Uuid, age: i64) -> TransactionResult<u64> {
        let mut tx_guard = self.executor.tx.lock().await;
        let tx = tx_guard.as_mut().ok_or(sqlx::Error::PoolClosed)?;
        let result = sqlx::query("UPDATE users SET age = $1 WHERE id = $2")
            .bind(age)
            .bind(id.to_string())
            .execute(&mut **tx)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn find_by_id(&self, id: Uuid) -> TransactionResult<Option<User>> {
        let mut tx_guard = self.executor.tx.lock().await;
        let tx = tx_guard.as_mut().ok_or(sqlx::Error::PoolClosed)?;
        let row = sqlx::query("SELECT name, age FROM users WHERE id = $1")
            .bind(id.to_string())
            .fetch_optional(&mut **tx)
            .await?;

        Ok(row.map(|r| User {
            id,
            name: r.get("name"),
            age: r.get("age"),
        }))
    }

    pub async fn count(&self) -> TransactionResult<i64> {
        let mut tx_guard = self.executor.tx.lock().await;
        let tx = tx_guard.as_mut().ok_or(sqlx::Error::PoolClosed)?;
        let row = sqlx::query("SELECT COUNT(*) AS count FROM users")
            .fetch_one(&mut **tx)
            .await?;
        Ok(row.get("count"))
    }
}
