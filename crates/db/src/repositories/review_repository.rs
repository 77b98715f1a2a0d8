use crate::error::DbError;
use crate::models::ValidationReviewRow;
use sqlx::SqlitePool;
use swarm_core::ValidationReview;
use uuid::Uuid;

/// Append-only store: reviews are inserted and listed, never updated.
#[derive(Clone)]
pub struct ValidationReviewRepository {
    pool: SqlitePool,
}

impl ValidationReviewRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, review: &ValidationReview) -> Result<ValidationReview, DbError> {
        let row = ValidationReviewRow::from(review);

        sqlx::query(
            r#"
            INSERT INTO validation_reviews (id, task_id, validator_agent_id, iteration_number, validation_passed, feedback, evidence, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.task_id)
        .bind(&row.validator_agent_id)
        .bind(row.iteration_number)
        .bind(row.validation_passed)
        .bind(&row.feedback)
        .bind(&row.evidence)
        .bind(row.created_at)
        .execute(&self.pool)
        .await?;

        Ok(review.clone())
    }

    pub async fn find_by_task(&self, task_id: Uuid) -> Result<Vec<ValidationReview>, DbError> {
        let rows: Vec<ValidationReviewRow> = sqlx::query_as(
            r#"
            SELECT id, task_id, validator_agent_id, iteration_number, validation_passed, feedback, evidence, created_at
            FROM validation_reviews
            WHERE task_id = ?
            ORDER BY iteration_number ASC
            "#,
        )
        .bind(task_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_domain()).collect())
    }
}
