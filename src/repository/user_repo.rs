use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::model::role::Role;
use crate::model::user::{NewUser, User};
use crate::repository::repo_error::RepositoryError;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find(&self, id: u64) -> Result<Option<User>, RepositoryError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError>;
    /// Fails with [`RepositoryError::Duplicate`] when the username or email is taken.
    async fn insert(&self, user: &NewUser) -> Result<u64, RepositoryError>;
    async fn touch_last_login(&self, id: u64) -> Result<(), RepositoryError>;
    async fn active_with_role(&self, role: Role) -> Result<Vec<User>, RepositoryError>;
    async fn list_active(&self) -> Result<Vec<User>, RepositoryError>;

    async fn store_refresh_token(&self, user_id: u64, jti: &str, expires_at: i64) -> Result<(), RepositoryError>;
    /// Revokes an active token, returning its owner. `None` if unknown or already revoked.
    async fn consume_refresh_token(&self, jti: &str) -> Result<Option<u64>, RepositoryError>;
    async fn revoke_refresh_token(&self, jti: &str) -> Result<(), RepositoryError>;
}

const USER_COLUMNS: &str = "id, username, email, password, full_name, role_id, manager_id, is_active";

pub struct UserRepositoryImpl {
    pool: MySqlPool,
}

impl UserRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for UserRepositoryImpl {
    async fn find(&self, id: u64) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert(&self, user: &NewUser) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, email, password, full_name, role_id, manager_id)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(user.role.id())
        .bind(user.manager_id)
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from_insert)?;

        Ok(result.last_insert_id())
    }

    async fn touch_last_login(&self, id: u64) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn active_with_role(&self, role: Role) -> Result<Vec<User>, RepositoryError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role_id = ? AND is_active = TRUE ORDER BY id"
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(role.id())
            .fetch_all(&self.pool)
            .await?)
    }

    async fn list_active(&self) -> Result<Vec<User>, RepositoryError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE is_active = TRUE ORDER BY full_name, id"
        );
        Ok(sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?)
    }

    async fn store_refresh_token(&self, user_id: u64, jti: &str, expires_at: i64) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, jti, expires_at)
            VALUES (?, ?, FROM_UNIXTIME(?))
            "#,
        )
        .bind(user_id)
        .bind(jti)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn consume_refresh_token(&self, jti: &str) -> Result<Option<u64>, RepositoryError> {
        let record = sqlx::query_as::<_, (u64, u64)>(
            r#"
            SELECT id, user_id
            FROM refresh_tokens
            WHERE jti = ?
            AND revoked = FALSE
            "#,
        )
        .bind(jti)
        .fetch_optional(&self.pool)
        .await?;

        let Some((id, user_id)) = record else {
            return Ok(None);
        };

        // a concurrent refresh may have won the race
        let result = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE id = ? AND revoked = FALSE")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok((result.rows_affected() > 0).then_some(user_id))
    }

    async fn revoke_refresh_token(&self, jti: &str) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ?")
            .bind(jti)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
