use crate::error::DbError;
use crate::models::AgentRow;
use chrono::Utc;
use sqlx::SqlitePool;
use swarm_core::Agent;
use uuid::Uuid;

#[derive(Clone)]
pub struct AgentRepository {
    pool: SqlitePool,
}

impl AgentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, agent: &Agent) -> Result<Agent, DbError> {
        let row = AgentRow::from(agent);

        sqlx::query(
            r#"
            INSERT INTO agents (id, name, status, current_task_id, kept_alive_for_validation, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.name)
        .bind(&row.status)
        .bind(&row.current_task_id)
        .bind(row.kept_alive_for_validation)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(agent.clone())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Agent>, DbError> {
        let row: Option<AgentRow> = sqlx::query_as(
            r#"
            SELECT id, name, status, current_task_id, kept_alive_for_validation, created_at, updated_at
            FROM agents
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_domain()))
    }

    pub async fn update(&self, agent: &Agent) -> Result<Agent, DbError> {
        let mut updated = agent.clone();
        updated.updated_at = Utc::now();
        let row = AgentRow::from(&updated);

        let result = sqlx::query(
            r#"
            UPDATE agents
            SET name = ?, status = ?, current_task_id = ?, kept_alive_for_validation = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&row.name)
        .bind(&row.status)
        .bind(&row.current_task_id)
        .bind(row.kept_alive_for_validation)
        .bind(row.updated_at)
        .bind(&row.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::AgentNotFound(agent.id));
        }

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};
    use swarm_core::AgentStatus;

    async fn setup_test_db() -> SqlitePool {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_create_and_update_agent() {
        let pool = setup_test_db().await;
        let repo = AgentRepository::new(pool);

        let mut agent = Agent::new("worker-1");
        repo.create(&agent).await.unwrap();

        let task_id = Uuid::new_v4();
        agent.status = AgentStatus::Working;
        agent.current_task_id = Some(task_id);
        agent.kept_alive_for_validation = true;
        repo.update(&agent).await.unwrap();

        let found = repo.find_by_id(agent.id).await.unwrap().unwrap();
        assert_eq!(found.status, AgentStatus::Working);
        assert_eq!(found.current_task_id, Some(task_id));
        assert!(found.kept_alive_for_validation);
    }
}
