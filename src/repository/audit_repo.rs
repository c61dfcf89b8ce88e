use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::model::audit::{AuditEntry, NewAuditEntry};
use crate::repository::page_offset;
use crate::repository::repo_error::RepositoryError;

#[async_trait]
pub trait AuditRepository: Send + Sync {
    async fn insert(&self, entry: &NewAuditEntry) -> Result<(), RepositoryError>;
    /// Newest first, with the total row count.
    async fn list(&self, page: u64, per_page: u64) -> Result<(Vec<AuditEntry>, i64), RepositoryError>;
}

pub struct AuditRepositoryImpl {
    pool: MySqlPool,
}

impl AuditRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for AuditRepositoryImpl {
    async fn insert(&self, entry: &NewAuditEntry) -> Result<(), RepositoryError> {
        sqlx::query("INSERT INTO audit_log (user_id, action, detail, ip) VALUES (?, ?, ?, ?)")
            .bind(entry.user_id)
            .bind(&entry.action)
            .bind(&entry.detail)
            .bind(&entry.ip)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list(&self, page: u64, per_page: u64) -> Result<(Vec<AuditEntry>, i64), RepositoryError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM audit_log")
            .fetch_one(&self.pool)
            .await?;

        let offset = page_offset(page, per_page);
        let entries = sqlx::query_as::<_, AuditEntry>(
            r#"
            SELECT id, user_id, action, detail, ip, created_at
            FROM audit_log
            ORDER BY created_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((entries, total))
    }
}
