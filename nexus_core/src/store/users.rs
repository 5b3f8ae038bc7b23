use super::models::{NewUser, User};
use super::{conflict_on_unique, Store, StoreError};
use crate::auth::{hash_password, verify_password};
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{debug, info};

pub const MIN_PASSWORD_CHARS: usize = 6;

const USER_TAKEN: &str = "A user with this email or username already exists";

fn user_from_row(row: &SqliteRow) -> Result<User, StoreError> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        display_name: row.try_get("display_name")?,
        username: row.try_get("username")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Store {
    pub async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let email = normalize_email(&new.email);
        if email.is_empty() || !email.contains('@') {
            return Err(StoreError::Validation("A valid email is required".into()));
        }
        if new.password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(StoreError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_CHARS
            )));
        }

        let id = uuid::Uuid::new_v4().to_string();
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, display_name, username, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&email)
        .bind(hash_password(&new.password))
        .bind(optional(new.display_name))
        .bind(optional(new.username))
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, USER_TAKEN))?;

        info!(user_id = %id, "Created user");
        self.get_user(&id).await
    }

    /// The user with these credentials, or `None` if either is wrong.
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(
            "SELECT id, email, password_hash, display_name, username, created_at, updated_at \
             FROM users WHERE email = ?",
        )
        .bind(normalize_email(email))
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            debug!("Sign-in for unknown email");
            return Ok(None);
        };
        let stored: String = row.try_get("password_hash")?;
        if !verify_password(password, &stored) {
            debug!("Sign-in with wrong password");
            return Ok(None);
        }
        user_from_row(&row).map(Some)
    }

    pub async fn get_user(&self, id: &str) -> Result<User, StoreError> {
        let row = sqlx::query(
            "SELECT id, email, display_name, username, created_at, updated_at \
             FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::NotFound("User not found".into()))?;
        user_from_row(&row)
    }
}
