use crate::error::DbError;
use crate::models::WorkflowRow;
use chrono::Utc;
use sqlx::SqlitePool;
use swarm_core::Workflow;
use uuid::Uuid;

#[derive(Clone)]
pub struct WorkflowRepository {
    pool: SqlitePool,
}

impl WorkflowRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, workflow: &Workflow) -> Result<Workflow, DbError> {
        let row = WorkflowRow::from(workflow);

        sqlx::query(
            r#"
            INSERT INTO workflows (id, name, definition_ref, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.name)
        .bind(&row.definition_ref)
        .bind(&row.status)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(workflow.clone())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Workflow>, DbError> {
        let row: Option<WorkflowRow> = sqlx::query_as(
            r#"
            SELECT id, name, definition_ref, status, created_at, updated_at
            FROM workflows
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_domain()))
    }

    /// The workflow currently counting against the single-active-workflow
    /// policy, if any.
    pub async fn find_open(&self) -> Result<Option<Workflow>, DbError> {
        let row: Option<WorkflowRow> = sqlx::query_as(
            r#"
            SELECT id, name, definition_ref, status, created_at, updated_at
            FROM workflows
            WHERE status IN ('active', 'paused')
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_domain()))
    }

    pub async fn update(&self, workflow: &Workflow) -> Result<Workflow, DbError> {
        let mut updated = workflow.clone();
        updated.updated_at = Utc::now();
        let row = WorkflowRow::from(&updated);

        let result = sqlx::query(
            r#"
            UPDATE workflows
            SET name = ?, definition_ref = ?, status = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&row.name)
        .bind(&row.definition_ref)
        .bind(&row.status)
        .bind(row.updated_at)
        .bind(&row.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::WorkflowNotFound(workflow.id));
        }

        Ok(updated)
    }
}
