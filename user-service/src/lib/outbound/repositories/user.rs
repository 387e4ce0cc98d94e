use async_trait::async_trait;
use auth::HashedSecret;
use chrono::DateTime;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::login::models::UserCredential;
use crate::domain::login::ports::CredentialStore;
use crate::domain::user::models::EmailAddress;
use crate::domain::user::models::User;
use crate::domain::user::models::UserId;
use crate::domain::user::models::Username;
use crate::domain::user::ports::UserRepository;
use crate::user::errors::UserError;

/// Postgres-backed user store.
///
/// Every query checks a connection out of the pool and hands it back when the
/// query future completes or is dropped, whatever the outcome.
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId(row.id),
            name: Username::from_storage(row.name),
            email: row.email.map(EmailAddress::from_storage),
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CredentialRow {
    id: Uuid,
    name: String,
    password: Option<String>,
    password_hash: Option<String>,
}

impl From<CredentialRow> for UserCredential {
    fn from(row: CredentialRow) -> Self {
        UserCredential {
            id: UserId(row.id),
            name: row.name,
            legacy_password: row.password,
            password_hash: row.password_hash.map(HashedSecret::new),
        }
    }
}

fn map_write_error(err: sqlx::Error, user: &User) -> UserError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() && db_err.constraint() == Some("users_name_key") {
            return UserError::UsernameAlreadyExists(user.name.as_str().to_string());
        }
    }
    UserError::DatabaseError(err.to_string())
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: User, password_hash: HashedSecret) -> Result<User, UserError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.id.0)
        .bind(user.name.as_str())
        .bind(user.email.as_ref().map(|e| e.as_str()))
        .bind(password_hash.as_str())
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &user))?;

        Ok(user)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        Ok(row.map(User::from))
    }

    async fn list_all(&self) -> Result<Vec<User>, UserError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, name, email, created_at
            FROM users
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn update(
        &self,
        user: User,
        password_hash: Option<HashedSecret>,
    ) -> Result<User, UserError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = $2,
                email = $3,
                password_hash = COALESCE($4::TEXT, password_hash),
                password = CASE WHEN $4::TEXT IS NULL THEN password ELSE NULL END
            WHERE id = $1
            "#,
        )
        .bind(user.id.0)
        .bind(user.name.as_str())
        .bind(user.email.as_ref().map(|e| e.as_str()))
        .bind(password_hash.as_ref().map(|h| h.as_str()))
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_error(e, &user))?;

        if result.rows_affected() == 0 {
            return Err(UserError::NotFound(user.id.to_string()));
        }

        Ok(user)
    }
}

#[async_trait]
impl CredentialStore for PostgresUserRepository {
    async fn find_credential_by_name(
        &self,
        name: &str,
    ) -> Result<Option<UserCredential>, UserError> {
        let row = sqlx::query_as::<_, CredentialRow>(
            r#"
            SELECT id, name, password, password_hash
            FROM users
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        Ok(row.map(UserCredential::from))
    }

    async fn update_password_hash(
        &self,
        id: &UserId,
        password_hash: &HashedSecret,
    ) -> Result<u64, UserError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, password = NULL
            WHERE id = $1 AND password_hash IS NULL
            "#,
        )
        .bind(id.0)
        .bind(password_hash.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| UserError::DatabaseError(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
