use crate::domain::user::User;
use crate::error::Result;
use crate::storage::records;
use sqlx::PgConnection;
use uuid::Uuid;

#[derive(Clone, Debug, Default)]
pub struct UserRepository;

impl UserRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    pub async fn create(
        &self,
        conn: &mut PgConnection,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User> {
        let user = sqlx::query_as::<_, records::User>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, bio, is_staff, password_hash, created_at
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(conn)
        .await?;

        Ok(user.into())
    }

    pub async fn find_by_username(&self, conn: &mut PgConnection, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, records::User>(
            r#"
            SELECT id, username, email, bio, is_staff, password_hash, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(conn)
        .await?;

        Ok(user.map(Into::into))
    }

    pub async fn find_by_id(&self, conn: &mut PgConnection, user_id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, records::User>(
            r#"
            SELECT id, username, email, bio, is_staff, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(conn)
        .await?;

        Ok(user.map(Into::into))
    }

    pub async fn username_or_email_taken(
        &self,
        conn: &mut PgConnection,
        username: &str,
        email: &str,
    ) -> Result<bool> {
        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1 OR email = $2)")
                .bind(username)
                .bind(email)
                .fetch_one(conn)
                .await?;
        Ok(taken)
    }

    pub async fn delete(&self, conn: &mut PgConnection, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(user_id).execute(conn).await?;
        Ok(result.rows_affected())
    }
}
