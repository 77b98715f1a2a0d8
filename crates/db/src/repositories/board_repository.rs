use crate::error::DbError;
use crate::models::BoardConfigRow;
use sqlx::SqlitePool;
use swarm_core::BoardConfig;
use uuid::Uuid;

#[derive(Clone)]
pub struct BoardConfigRepository {
    pool: SqlitePool,
}

impl BoardConfigRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// One board per workflow; re-initialization replaces the layout.
    pub async fn upsert(&self, workflow_id: Uuid, config: &BoardConfig) -> Result<(), DbError> {
        let columns =
            serde_json::to_string(&config.columns).unwrap_or_else(|_| "[]".to_string());

        sqlx::query(
            r#"
            INSERT INTO board_configs (workflow_id, columns, initial_column, terminal_column, require_comment_on_change)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(workflow_id) DO UPDATE SET
                columns = excluded.columns,
                initial_column = excluded.initial_column,
                terminal_column = excluded.terminal_column,
                require_comment_on_change = excluded.require_comment_on_change
            "#,
        )
        .bind(workflow_id.to_string())
        .bind(columns)
        .bind(&config.initial_column)
        .bind(&config.terminal_column)
        .bind(config.require_comment_on_change)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_workflow(
        &self,
        workflow_id: Uuid,
    ) -> Result<Option<BoardConfig>, DbError> {
        let row: Option<BoardConfigRow> = sqlx::query_as(
            r#"
            SELECT workflow_id, columns, initial_column, terminal_column, require_comment_on_change
            FROM board_configs
            WHERE workflow_id = ?
            "#,
        )
        .bind(workflow_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_domain()))
    }
}
