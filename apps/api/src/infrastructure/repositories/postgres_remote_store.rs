use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, Row};

use crate::domain::project::ProjectContext;
use crate::domain::repositories::RemoteContextStore;

/// PostgreSQL implementation of RemoteContextStore
///
/// Keeps one JSONB document per project. The version is duplicated into its
/// own column so reconciliation can be inspected without decoding documents.
pub struct PostgresRemoteStore {
    pool: PgPool,
}

impl PostgresRemoteStore {
    /// Creates a new PostgresRemoteStore
    ///
    /// # Arguments
    /// * `pool` - SQLx connection pool for PostgreSQL
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the backing table when it does not exist yet
    pub async fn ensure_schema(&self) -> Result<(), String> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS project_contexts (
                project_id TEXT PRIMARY KEY,
                version BIGINT NOT NULL,
                context JSONB NOT NULL,
                synced_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to create project_contexts table: {}", e))?;

        Ok(())
    }
}

#[async_trait]
impl RemoteContextStore for PostgresRemoteStore {
    async fn pull(&self, project_id: &str) -> Result<Option<ProjectContext>, String> {
        let row = sqlx::query(
            r#"
            SELECT context
            FROM project_contexts
            WHERE project_id = $1
            "#,
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| format!("Failed to pull project context: {}", e))?;

        match row {
            Some(row) => {
                let Json(context): Json<ProjectContext> = row
                    .try_get("context")
                    .map_err(|e| format!("Failed to decode project context: {}", e))?;
                Ok(Some(context))
            }
            None => Ok(None),
        }
    }

    async fn push(&self, context: &ProjectContext) -> Result<(), String> {
        let version = i64::try_from(context.version())
            .map_err(|_| format!("Context version {} out of range", context.version()))?;

        sqlx::query(
            r#"
            INSERT INTO project_contexts (project_id, version, context, synced_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (project_id) DO UPDATE SET
                version = EXCLUDED.version,
                context = EXCLUDED.context,
                synced_at = EXCLUDED.synced_at
            "#,
        )
        .bind(&context.project_id)
        .bind(version)
        .bind(Json(context))
        .execute(&self.pool)
        .await
        .map_err(|e| format!("Failed to push project context: {}", e))?;

        Ok(())
    }
}
