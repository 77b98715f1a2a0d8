use crate::error::DbError;
use crate::models::PhaseRow;
use sqlx::SqlitePool;
use swarm_core::{Phase, PhaseExecutionStatus, ValidationConfig};
use uuid::Uuid;

const PHASE_COLUMNS: &str = "id, workflow_id, phase_order, name, description, done_definitions, validation, execution_status, created_at";

#[derive(Clone)]
pub struct PhaseRepository {
    pool: SqlitePool,
}

impl PhaseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, phase: &Phase) -> Result<Phase, DbError> {
        let row = PhaseRow::from(phase);

        sqlx::query(
            r#"
            INSERT INTO phases (id, workflow_id, phase_order, name, description, done_definitions, validation, execution_status, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.workflow_id)
        .bind(row.phase_order)
        .bind(&row.name)
        .bind(&row.description)
        .bind(&row.done_definitions)
        .bind(&row.validation)
        .bind(&row.execution_status)
        .bind(row.created_at)
        .execute(&self.pool)
        .await?;

        Ok(phase.clone())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Phase>, DbError> {
        let row: Option<PhaseRow> = sqlx::query_as(&format!(
            "SELECT {PHASE_COLUMNS} FROM phases WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_domain()))
    }

    pub async fn find_by_workflow(&self, workflow_id: Uuid) -> Result<Vec<Phase>, DbError> {
        let rows: Vec<PhaseRow> = sqlx::query_as(&format!(
            "SELECT {PHASE_COLUMNS} FROM phases WHERE workflow_id = ? ORDER BY phase_order ASC"
        ))
        .bind(workflow_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_domain()).collect())
    }

    pub async fn find_by_order(
        &self,
        workflow_id: Uuid,
        phase_order: i64,
    ) -> Result<Option<Phase>, DbError> {
        let row: Option<PhaseRow> = sqlx::query_as(&format!(
            "SELECT {PHASE_COLUMNS} FROM phases WHERE workflow_id = ? AND phase_order = ?"
        ))
        .bind(workflow_id.to_string())
        .bind(phase_order)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_domain()))
    }

    /// First phase of the workflow whose execution is not completed.
    pub async fn find_first_open(&self, workflow_id: Uuid) -> Result<Option<Phase>, DbError> {
        let row: Option<PhaseRow> = sqlx::query_as(&format!(
            r#"
            SELECT {PHASE_COLUMNS} FROM phases
            WHERE workflow_id = ? AND execution_status != 'completed'
            ORDER BY phase_order ASC
            LIMIT 1
            "#
        ))
        .bind(workflow_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_domain()))
    }

    /// The next phase after the given order in the same workflow, if any.
    pub async fn find_next_after(
        &self,
        workflow_id: Uuid,
        phase_order: i64,
    ) -> Result<Option<Phase>, DbError> {
        let row: Option<PhaseRow> = sqlx::query_as(&format!(
            r#"
            SELECT {PHASE_COLUMNS} FROM phases
            WHERE workflow_id = ? AND phase_order > ?
            ORDER BY phase_order ASC
            LIMIT 1
            "#
        ))
        .bind(workflow_id.to_string())
        .bind(phase_order)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_domain()))
    }

    pub async fn update_execution_status(
        &self,
        id: Uuid,
        status: PhaseExecutionStatus,
    ) -> Result<(), DbError> {
        let result = sqlx::query("UPDATE phases SET execution_status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::PhaseNotFound(id));
        }

        Ok(())
    }

    /// Re-initialization refreshes the validation config of an existing
    /// phase in place; everything else about a phase is immutable.
    pub async fn update_validation(
        &self,
        id: Uuid,
        validation: Option<&ValidationConfig>,
    ) -> Result<(), DbError> {
        let encoded = validation.and_then(|v| serde_json::to_string(v).ok());

        let result = sqlx::query("UPDATE phases SET validation = ? WHERE id = ?")
            .bind(encoded)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::PhaseNotFound(id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations, WorkflowRepository};
    use swarm_core::Workflow;

    async fn setup() -> (SqlitePool, Uuid) {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();

        let workflow = Workflow::new("test", "test.yaml");
        WorkflowRepository::new(pool.clone())
            .create(&workflow)
            .await
            .unwrap();

        (pool, workflow.id)
    }

    #[tokio::test]
    async fn test_create_and_order_queries() {
        let (pool, workflow_id) = setup().await;
        let repo = PhaseRepository::new(pool);

        repo.create(&Phase::new(workflow_id, 1, "plan")).await.unwrap();
        repo.create(&Phase::new(workflow_id, 3, "build")).await.unwrap();

        let phases = repo.find_by_workflow(workflow_id).await.unwrap();
        assert_eq!(phases.len(), 2);
        assert_eq!(phases[0].name, "plan");

        // gaps in order are allowed
        let next = repo.find_next_after(workflow_id, 1).await.unwrap().unwrap();
        assert_eq!(next.phase_order, 3);
        assert!(repo.find_next_after(workflow_id, 3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_first_open_skips_completed() {
        let (pool, workflow_id) = setup().await;
        let repo = PhaseRepository::new(pool);

        let first = Phase::new(workflow_id, 1, "plan");
        repo.create(&first).await.unwrap();
        repo.create(&Phase::new(workflow_id, 2, "build")).await.unwrap();

        repo.update_execution_status(first.id, PhaseExecutionStatus::Completed)
            .await
            .unwrap();

        let open = repo.find_first_open(workflow_id).await.unwrap().unwrap();
        assert_eq!(open.name, "build");
    }

    #[tokio::test]
    async fn test_validation_round_trip() {
        let (pool, workflow_id) = setup().await;
        let repo = PhaseRepository::new(pool);

        let phase = Phase::new(workflow_id, 1, "build")
            .with_validation(ValidationConfig::new(vec!["tests pass".into()]));
        repo.create(&phase).await.unwrap();

        let found = repo.find_by_id(phase.id).await.unwrap().unwrap();
        assert!(found.validation_required());

        repo.update_validation(phase.id, None).await.unwrap();
        let found = repo.find_by_id(phase.id).await.unwrap().unwrap();
        assert!(found.validation.is_none());
    }
}
