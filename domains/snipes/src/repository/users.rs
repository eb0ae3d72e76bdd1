//! User repository

use snipr_common::RepositoryError;
use sqlx::PgPool;

use crate::domain::entities::AppUser;

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a user by identity-provider subject id
    pub async fn find(&self, id: &str) -> Result<Option<AppUser>, RepositoryError> {
        let user = sqlx::query_as::<_, AppUser>(
            r#"
            SELECT id, email, username
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}
