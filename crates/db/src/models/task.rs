use swarm_core::{Task, TaskPriority, TaskStatus};
use uuid::Uuid;

use super::{datetime_to_timestamp, timestamp_to_datetime};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TaskRow {
    pub id: String,
    pub phase_id: Option<String>,
    pub description: String,
    pub done_definition: String,
    pub status: String,
    pub priority: String,
    pub assigned_agent_id: Option<String>,
    pub ticket_id: Option<String>,
    pub validation_enabled: bool,
    pub validation_iteration: i64,
    pub last_validation_feedback: Option<String>,
    pub review_done: bool,
    pub completion_summary: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TaskRow {
    pub fn into_domain(self) -> Task {
        Task {
            id: Uuid::parse_str(&self.id).unwrap_or_default(),
            phase_id: self.phase_id.and_then(|s| Uuid::parse_str(&s).ok()),
            description: self.description,
            done_definition: self.done_definition,
            status: TaskStatus::parse(&self.status).unwrap_or_default(),
            priority: TaskPriority::parse(&self.priority).unwrap_or_default(),
            assigned_agent_id: self.assigned_agent_id.and_then(|s| Uuid::parse_str(&s).ok()),
            ticket_id: self.ticket_id.and_then(|s| Uuid::parse_str(&s).ok()),
            validation_enabled: self.validation_enabled,
            validation_iteration: self.validation_iteration,
            last_validation_feedback: self.last_validation_feedback,
            review_done: self.review_done,
            completion_summary: self.completion_summary,
            created_at: timestamp_to_datetime(self.created_at),
            updated_at: timestamp_to_datetime(self.updated_at),
        }
    }
}

impl From<&Task> for TaskRow {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id.to_string(),
            phase_id: task.phase_id.map(|id| id.to_string()),
            description: task.description.clone(),
            done_definition: task.done_definition.clone(),
            status: task.status.as_str().to_string(),
            priority: task.priority.as_str().to_string(),
            assigned_agent_id: task.assigned_agent_id.map(|id| id.to_string()),
            ticket_id: task.ticket_id.map(|id| id.to_string()),
            validation_enabled: task.validation_enabled,
            validation_iteration: task.validation_iteration,
            last_validation_feedback: task.last_validation_feedback.clone(),
            review_done: task.review_done,
            completion_summary: task.completion_summary.clone(),
            created_at: datetime_to_timestamp(task.created_at),
            updated_at: datetime_to_timestamp(task.updated_at),
        }
    }
}
