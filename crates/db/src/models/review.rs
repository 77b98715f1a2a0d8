use swarm_core::ValidationReview;
use uuid::Uuid;

use super::{datetime_to_timestamp, timestamp_to_datetime};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ValidationReviewRow {
    pub id: String,
    pub task_id: String,
    pub validator_agent_id: String,
    pub iteration_number: i64,
    pub validation_passed: bool,
    pub feedback: String,
    /// JSON list of evidence entries.
    pub evidence: String,
    pub created_at: i64,
}

impl ValidationReviewRow {
    pub fn into_domain(self) -> ValidationReview {
        ValidationReview {
            id: Uuid::parse_str(&self.id).unwrap_or_default(),
            task_id: Uuid::parse_str(&self.task_id).unwrap_or_default(),
            validator_agent_id: Uuid::parse_str(&self.validator_agent_id).unwrap_or_default(),
            iteration_number: self.iteration_number,
            validation_passed: self.validation_passed,
            feedback: self.feedback,
            evidence: serde_json::from_str(&self.evidence).unwrap_or_default(),
            created_at: timestamp_to_datetime(self.created_at),
        }
    }
}

impl From<&ValidationReview> for ValidationReviewRow {
    fn from(review: &ValidationReview) -> Self {
        Self {
            id: review.id.to_string(),
            task_id: review.task_id.to_string(),
            validator_agent_id: review.validator_agent_id.to_string(),
            iteration_number: review.iteration_number,
            validation_passed: review.validation_passed,
            feedback: review.feedback.clone(),
            evidence: serde_json::to_string(&review.evidence)
                .unwrap_or_else(|_| "[]".to_string()),
            created_at: datetime_to_timestamp(review.created_at),
        }
    }
}
