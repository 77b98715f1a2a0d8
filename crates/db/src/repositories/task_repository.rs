use crate::error::DbError;
use crate::models::TaskRow;
use chrono::Utc;
use sqlx::SqlitePool;
use swarm_core::{Task, TaskStatus};
use uuid::Uuid;

const TASK_COLUMNS: &str = "id, phase_id, description, done_definition, status, priority, assigned_agent_id, ticket_id, validation_enabled, validation_iteration, last_validation_feedback, review_done, completion_summary, created_at, updated_at";

#[derive(Clone)]
pub struct TaskRepository {
    pool: SqlitePool,
}

impl TaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, task: &Task) -> Result<Task, DbError> {
        let row = TaskRow::from(task);

        sqlx::query(&format!(
            r#"
            INSERT INTO tasks ({TASK_COLUMNS})
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        ))
        .bind(&row.id)
        .bind(&row.phase_id)
        .bind(&row.description)
        .bind(&row.done_definition)
        .bind(&row.status)
        .bind(&row.priority)
        .bind(&row.assigned_agent_id)
        .bind(&row.ticket_id)
        .bind(row.validation_enabled)
        .bind(row.validation_iteration)
        .bind(&row.last_validation_feedback)
        .bind(row.review_done)
        .bind(&row.completion_summary)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(task.clone())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, DbError> {
        let row: Option<TaskRow> =
            sqlx::query_as(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|r| r.into_domain()))
    }

    pub async fn find_by_phase(&self, phase_id: Uuid) -> Result<Vec<Task>, DbError> {
        let rows: Vec<TaskRow> = sqlx::query_as(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE phase_id = ? ORDER BY created_at ASC"
        ))
        .bind(phase_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_domain()).collect())
    }

    /// Writes back the full mutable portion of the row. Callers mutate the
    /// domain value and persist it in one step.
    pub async fn update(&self, task: &Task) -> Result<Task, DbError> {
        let mut updated = task.clone();
        updated.updated_at = Utc::now();
        let row = TaskRow::from(&updated);

        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET phase_id = ?, description = ?, done_definition = ?, status = ?, priority = ?,
                assigned_agent_id = ?, ticket_id = ?, validation_enabled = ?,
                validation_iteration = ?, last_validation_feedback = ?, review_done = ?,
                completion_summary = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&row.phase_id)
        .bind(&row.description)
        .bind(&row.done_definition)
        .bind(&row.status)
        .bind(&row.priority)
        .bind(&row.assigned_agent_id)
        .bind(&row.ticket_id)
        .bind(row.validation_enabled)
        .bind(row.validation_iteration)
        .bind(&row.last_validation_feedback)
        .bind(row.review_done)
        .bind(&row.completion_summary)
        .bind(row.updated_at)
        .bind(&row.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::TaskNotFound(task.id));
        }

        Ok(updated)
    }

    /// Count of tasks under a phase, total and done, with open work
    /// defined as any status other than done.
    pub async fn phase_progress(&self, phase_id: Uuid) -> Result<(i64, i64), DbError> {
        let (total, done): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(status = 'done'), 0)
            FROM tasks
            WHERE phase_id = ?
            "#,
        )
        .bind(phase_id.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok((total, done))
    }

    pub async fn count_by_phase_and_status(
        &self,
        phase_id: Uuid,
        status: TaskStatus,
    ) -> Result<i64, DbError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM tasks WHERE phase_id = ? AND status = ?")
                .bind(phase_id.to_string())
                .bind(status.as_str())
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
