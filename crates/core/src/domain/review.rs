use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One piece of evidence collected by a validator (test run, lint output,
/// file inspection, ...). Stored as structured JSON alongside the review.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationEvidence {
    pub kind: String,
    pub detail: String,
}

/// Append-only audit row: one per review attempt, never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReview {
    pub id: Uuid,
    pub task_id: Uuid,
    pub validator_agent_id: Uuid,
    /// Equals the task's validation_iteration at the time of review.
    pub iteration_number: i64,
    pub validation_passed: bool,
    pub feedback: String,
    pub evidence: Vec<ValidationEvidence>,
    pub created_at: DateTime<Utc>,
}

impl ValidationReview {
    pub fn new(
        task_id: Uuid,
        validator_agent_id: Uuid,
        iteration_number: i64,
        validation_passed: bool,
        feedback: impl Into<String>,
        evidence: Vec<ValidationEvidence>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id,
            validator_agent_id,
            iteration_number,
            validation_passed,
            feedback: feedback.into(),
            evidence,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_creation() {
        let review = ValidationReview::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            1,
            false,
            "missing tests",
            vec![ValidationEvidence {
                kind: "test_run".into(),
                detail: "0 tests executed".into(),
            }],
        );

        assert_eq!(review.iteration_number, 1);
        assert!(!review.validation_passed);
        assert_eq!(review.evidence.len(), 1);
    }
}
