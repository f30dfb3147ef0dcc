use crate::error::Result;
use sqlx::PgConnection;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

#[derive(Clone, Debug, Default)]
pub struct RefreshTokenRepository;

impl RefreshTokenRepository {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    pub async fn create(
        &self,
        conn: &mut PgConnection,
        user_id: Uuid,
        token_hash: &str,
        ttl_days: i64,
    ) -> Result<()> {
        let expires_at = OffsetDateTime::now_utc() + Duration::days(ttl_days);

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, token_hash, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Atomically replaces a live refresh token with a new one.
    /// Returns the owning user, or None when the old token is unknown or expired.
    pub async fn rotate(
        &self,
        conn: &mut PgConnection,
        old_hash: &str,
        new_hash: &str,
        ttl_days: i64,
    ) -> Result<Option<Uuid>> {
        let expires_at = OffsetDateTime::now_utc() + Duration::days(ttl_days);

        let user_id: Option<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE refresh_tokens
            SET token_hash = $2, expires_at = $3, created_at = NOW()
            WHERE token_hash = $1 AND expires_at > NOW()
            RETURNING user_id
            "#,
        )
        .bind(old_hash)
        .bind(new_hash)
        .bind(expires_at)
        .fetch_optional(conn)
        .await?;

        Ok(user_id)
    }

    pub async fn delete_owned(&self, conn: &mut PgConnection, token_hash: &str, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE token_hash = $1 AND user_id = $2")
            .bind(token_hash)
            .bind(user_id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete_expired(&self, conn: &mut PgConnection) -> Result<u64> {
        let result = sqlx::query("DELETE FROM refresh_tokens WHERE expires_at < NOW()").execute(conn).await?;
        Ok(result.rows_affected())
    }
}
