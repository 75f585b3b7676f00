//! Postgres-backed user store.
//!
//! Expects an existing table (schema management is out of scope here):
//!
//! ```sql
//! CREATE TABLE users (
//!     id           BIGSERIAL PRIMARY KEY,
//!     name         TEXT,
//!     phone_number TEXT,
//!     address      TEXT
//! );
//! ```
//!
//! ## Error Mapping
//!
//! | SQLx Error | RepositoryError |
//! |------------|-----------------|
//! | PoolClosed / PoolTimedOut / Io / Tls | `Unavailable` |
//! | ColumnNotFound / ColumnDecode / Decode | `Corrupt` |
//! | Database / other | `Backend` |

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;

use userdir_core::{User, UserId};

use super::r#trait::{RepositoryError, UserRepository};

/// Postgres-backed `UserRepository`.
///
/// `Send + Sync` and cheap to clone; all access goes through the SQLx pool.
#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    #[instrument(skip_all, fields(user_id = ?user.id), err)]
    async fn save(&self, user: User) -> Result<User, RepositoryError> {
        let row = match user.id {
            None => sqlx::query(
                r#"
                INSERT INTO users (name, phone_number, address)
                VALUES ($1, $2, $3)
                RETURNING id, name, phone_number, address
                "#,
            )
            .bind(&user.name)
            .bind(&user.phone_number)
            .bind(&user.address)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_user", e))?,
            Some(id) => sqlx::query(
                r#"
                INSERT INTO users (id, name, phone_number, address)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (id)
                DO UPDATE SET
                    name = EXCLUDED.name,
                    phone_number = EXCLUDED.phone_number,
                    address = EXCLUDED.address
                RETURNING id, name, phone_number, address
                "#,
            )
            .bind(id.get())
            .bind(&user.name)
            .bind(&user.phone_number)
            .bind(&user.address)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("upsert_user", e))?,
        };

        user_from_row(&row)
    }

    #[instrument(skip(self), err)]
    async fn find_all(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, phone_number, address
            FROM users
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_all_users", e))?;

        rows.iter().map(user_from_row).collect()
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn find_one(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, phone_number, address
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_user", e))?;

        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self, user), fields(user_id = %id), err)]
    async fn update(&self, id: UserId, user: User) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(
            r#"
            UPDATE users
            SET
                name = $2,
                phone_number = $3,
                address = $4
            WHERE id = $1
            RETURNING id, name, phone_number, address
            "#,
        )
        .bind(id.get())
        .bind(&user.name)
        .bind(&user.phone_number)
        .bind(&user.address)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_user", e))?;

        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn delete_all(&self) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM users")
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_all_users", e))?;
        Ok(())
    }
}

fn user_from_row(row: &PgRow) -> Result<User, RepositoryError> {
    let raw_id: i64 = row
        .try_get("id")
        .map_err(|e| map_sqlx_error("decode_user", e))?;
    let id = UserId::new(raw_id).map_err(|e| RepositoryError::Corrupt(e.to_string()))?;

    Ok(User {
        id: Some(id),
        name: row.try_get("name").map_err(|e| map_sqlx_error("decode_user", e))?,
        phone_number: row
            .try_get("phone_number")
            .map_err(|e| map_sqlx_error("decode_user", e))?,
        address: row
            .try_get("address")
            .map_err(|e| map_sqlx_error("decode_user", e))?,
    })
}

/// Map SQLx errors to RepositoryError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::PoolClosed => {
            RepositoryError::Unavailable(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::PoolTimedOut => {
            RepositoryError::Unavailable(format!("connection pool timed out in {operation}"))
        }
        sqlx::Error::Io(e) => RepositoryError::Unavailable(format!("io error in {operation}: {e}")),
        sqlx::Error::Tls(e) => RepositoryError::Unavailable(format!("tls error in {operation}: {e}")),
        sqlx::Error::ColumnNotFound(col) => {
            RepositoryError::Corrupt(format!("column {col} missing in {operation}"))
        }
        sqlx::Error::ColumnDecode { index, source } => {
            RepositoryError::Corrupt(format!("column {index} undecodable in {operation}: {source}"))
        }
        sqlx::Error::Decode(e) => RepositoryError::Corrupt(format!("decode error in {operation}: {e}")),
        sqlx::Error::Database(db_err) => RepositoryError::Backend(format!(
            "database error in {operation}: {}",
            db_err.message()
        )),
        other => RepositoryError::Backend(format!("sqlx error in {operation}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Needs a reachable Postgres with the `users` table:
    // DATABASE_URL=postgres://... cargo test -p userdir-infra -- --ignored
    #[tokio::test]
    #[ignore]
    async fn round_trips_against_a_live_database() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let repo = PostgresUserRepository::connect(&url, 1).await.unwrap();
        repo.delete_all().await.unwrap();

        let stored = repo
            .save(User::new("Bengt", "+35308511111111", "Dublin"))
            .await
            .unwrap();
        let id = stored.id.unwrap();

        let fetched = repo.find_one(id).await.unwrap().unwrap();
        assert!(fetched.same_details(&stored));

        let moved = repo
            .update(id, User::new("Bengt", "+35308511111111", "Berlin"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(moved.id, Some(id));
        assert_eq!(moved.address.as_deref(), Some("Berlin"));

        assert!(repo.delete(id).await.unwrap());
        assert_eq!(repo.find_one(id).await.unwrap(), None);
        assert_eq!(repo.update(id, stored).await.unwrap(), None);
        assert!(repo.find_all().await.unwrap().is_empty());
    }

    #[test]
    fn pool_errors_map_to_unavailable() {
        assert!(matches!(
            map_sqlx_error("find_user", sqlx::Error::PoolClosed),
            RepositoryError::Unavailable(_)
        ));
        assert!(matches!(
            map_sqlx_error("find_user", sqlx::Error::RowNotFound),
            RepositoryError::Backend(_)
        ));
    }
}
