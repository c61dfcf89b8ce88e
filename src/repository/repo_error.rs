use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
    #[error("Duplicate entry")]
    Duplicate,
    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

impl RepositoryError {
    pub fn from_insert(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return RepositoryError::Duplicate;
            }
        }
        RepositoryError::DatabaseError(e)
    }
}
