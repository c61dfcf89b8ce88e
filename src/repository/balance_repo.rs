use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::MySqlPool;

use crate::model::leave_balance::LeaveBalance;
use crate::repository::repo_error::RepositoryError;

#[async_trait]
pub trait BalanceRepository: Send + Sync {
    async fn find(&self, user_id: u64, year: i32) -> Result<Option<LeaveBalance>, RepositoryError>;
    /// One row per (user, year); a second call overwrites the first.
    async fn upsert(
        &self,
        user_id: u64,
        year: i32,
        base_days: Decimal,
        bonus_days: Decimal,
        note: Option<&str>,
    ) -> Result<LeaveBalance, RepositoryError>;
}

pub struct BalanceRepositoryImpl {
    pool: MySqlPool,
}

impl BalanceRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BalanceRepository for BalanceRepositoryImpl {
    async fn find(&self, user_id: u64, year: i32) -> Result<Option<LeaveBalance>, RepositoryError> {
        Ok(sqlx::query_as::<_, LeaveBalance>(
            r#"
            SELECT user_id, year, base_days, bonus_days, note, updated_at
            FROM leave_balances
            WHERE user_id = ?
            AND year = ?
            "#,
        )
        .bind(user_id)
        .bind(year)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn upsert(
        &self,
        user_id: u64,
        year: i32,
        base_days: Decimal,
        bonus_days: Decimal,
        note: Option<&str>,
    ) -> Result<LeaveBalance, RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO leave_balances (user_id, year, base_days, bonus_days, note)
            VALUES (?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                base_days = VALUES(base_days),
                bonus_days = VALUES(bonus_days),
                note = VALUES(note)
            "#,
        )
        .bind(user_id)
        .bind(year)
        .bind(base_days)
        .bind(bonus_days)
        .bind(note)
        .execute(&self.pool)
        .await?;

        self.find(user_id, year)
            .await?
            .ok_or_else(|| RepositoryError::Corrupt(format!("balance {user_id}/{year} vanished")))
    }
}
