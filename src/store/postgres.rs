use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;
use uuid::Uuid;

use super::{AccountDeletion, Filter, Kind, ResourceStore, StoreError};
use crate::config::DatabaseConfig;

const CREATE_DOCUMENTS: &str = r#"
    CREATE TABLE IF NOT EXISTS documents (
        kind       TEXT        NOT NULL,
        id         UUID        NOT NULL,
        body       JSONB       NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        PRIMARY KEY (kind, id)
    )
"#;

const CREATE_OWNER_INDEX: &str = r#"
    CREATE INDEX IF NOT EXISTS documents_owner_idx ON documents (kind, (body ->> 'user'))
"#;

/// One profile per user. A second insert fails with a unique violation,
/// which surfaces as `StoreError::Conflict`.
const CREATE_PROFILE_OWNER_UNIQUE: &str = r#"
    CREATE UNIQUE INDEX IF NOT EXISTS documents_profile_owner_uidx
        ON documents ((body ->> 'user')) WHERE kind = 'profiles'
"#;

const SCHEMA: [&str; 3] = [CREATE_DOCUMENTS, CREATE_OWNER_INDEX, CREATE_PROFILE_OWNER_UNIQUE];

/// Postgres-backed store: one JSONB row per aggregate.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Connected document store (max {} connections)", config.max_connections);
        Ok(Self { pool })
    }

    /// Create the documents table and its indexes if they are missing.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Document store schema is up to date");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// `->>` yields text, so compare against the textual form of the value.
fn filter_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl ResourceStore for PgStore {
    async fn find_by_id(&self, kind: Kind, id: Uuid) -> Result<Option<Value>, StoreError> {
        let body = sqlx::query_scalar::<_, Value>("SELECT body FROM documents WHERE kind = $1 AND id = $2")
            .bind(kind.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(body)
    }

    async fn find_one(&self, kind: Kind, filter: &Filter) -> Result<Option<Value>, StoreError> {
        let body = match filter {
            Filter::All => {
                sqlx::query_scalar::<_, Value>("SELECT body FROM documents WHERE kind = $1 LIMIT 1")
                    .bind(kind.as_str())
                    .fetch_optional(&self.pool)
                    .await?
            }
            Filter::FieldEq { field, value } => {
                sqlx::query_scalar::<_, Value>(
                    "SELECT body FROM documents WHERE kind = $1 AND body ->> $2 = $3 LIMIT 1",
                )
                .bind(kind.as_str())
                .bind(*field)
                .bind(filter_text(value))
                .fetch_optional(&self.pool)
                .await?
            }
        };
        Ok(body)
    }

    async fn find_many(&self, kind: Kind, filter: &Filter) -> Result<Vec<Value>, StoreError> {
        let bodies = match filter {
            Filter::All => {
                sqlx::query_scalar::<_, Value>("SELECT body FROM documents WHERE kind = $1")
                    .bind(kind.as_str())
                    .fetch_all(&self.pool)
                    .await?
            }
            Filter::FieldEq { field, value } => {
                sqlx::query_scalar::<_, Value>(
                    "SELECT body FROM documents WHERE kind = $1 AND body ->> $2 = $3",
                )
                .bind(kind.as_str())
                .bind(*field)
                .bind(filter_text(value))
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(bodies)
    }

    async fn save(&self, kind: Kind, id: Uuid, doc: Value) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO documents (kind, id, body) VALUES ($1, $2, $3)
             ON CONFLICT (kind, id) DO UPDATE SET body = EXCLUDED.body, updated_at = now()",
        )
        .bind(kind.as_str())
        .bind(id)
        .bind(sqlx::types::Json(doc))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_by_id(&self, kind: Kind, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE kind = $1 AND id = $2")
            .bind(kind.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { kind, id });
        }
        Ok(())
    }

    async fn delete_many(&self, kind: Kind, filter: &Filter) -> Result<u64, StoreError> {
        let result = match filter {
            Filter::All => {
                sqlx::query("DELETE FROM documents WHERE kind = $1")
                    .bind(kind.as_str())
                    .execute(&self.pool)
                    .await?
            }
            Filter::FieldEq { field, value } => {
                sqlx::query("DELETE FROM documents WHERE kind = $1 AND body ->> $2 = $3")
                    .bind(kind.as_str())
                    .bind(*field)
                    .bind(filter_text(value))
                    .execute(&self.pool)
                    .await?
            }
        };
        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Posts, profile and user go in one transaction: all or nothing.
    async fn delete_account(&self, user_id: Uuid) -> Result<AccountDeletion, StoreError> {
        let owner = user_id.to_string();
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query("SELECT id FROM documents WHERE kind = $1 AND id = $2 FOR UPDATE")
            .bind(Kind::User.as_str())
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
        if user.is_none() {
            return Err(StoreError::NotFound {
                kind: Kind::User,
                id: user_id,
            });
        }

        let posts = sqlx::query("DELETE FROM documents WHERE kind = $1 AND body ->> 'user' = $2")
            .bind(Kind::Post.as_str())
            .bind(&owner)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let profiles = sqlx::query("DELETE FROM documents WHERE kind = $1 AND body ->> 'user' = $2")
            .bind(Kind::Profile.as_str())
            .bind(&owner)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM documents WHERE kind = $1 AND id = $2")
            .bind(Kind::User.as_str())
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(AccountDeletion { posts, profiles })
    }
}
