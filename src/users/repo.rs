use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

use crate::error::ApiError;

/// User record in the database. Balance mutation goes through `debit` only.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2 PHC string, not exposed in JSON
    pub tokens_count: i64,
    pub tg_id: Option<i64>,
}

const USER_COLUMNS: &str = "id, username, email, password_hash, tokens_count, tg_id";

impl User {
    /// Create a new user. Uniqueness of username and email is enforced by
    /// the table constraints; a conflict maps to `UserAlreadyExists`.
    pub async fn create(
        db: &PgPool,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, ApiError> {
        let result = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(db)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(ApiError::UserAlreadyExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn find_by_id(db: &PgPool, id: i64) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"SELECT {USER_COLUMNS} FROM users WHERE id = $1"#
        ))
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"SELECT {USER_COLUMNS} FROM users WHERE email = $1"#
        ))
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_username(db: &PgPool, username: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"SELECT {USER_COLUMNS} FROM users WHERE username = $1"#
        ))
        .bind(username)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Atomically subtract `cost` from the balance, clamped at zero.
    /// A single UPDATE so concurrent debits for the same user never lose
    /// each other's writes. Returns the new balance, or `None` when the
    /// user row no longer exists.
    pub async fn debit(db: &PgPool, user_id: i64, cost: i64) -> Result<Option<i64>, ApiError> {
        let new_balance = sqlx::query_scalar::<_, i64>(
            r#"
            UPDATE users
            SET tokens_count = GREATEST(tokens_count - $2, 0)
            WHERE id = $1
            RETURNING tokens_count
            "#,
        )
        .bind(user_id)
        .bind(cost)
        .fetch_optional(db)
        .await?;
        Ok(new_balance)
    }
}
