use swarm_core::{Workflow, WorkflowStatus};
use uuid::Uuid;

use super::{datetime_to_timestamp, timestamp_to_datetime};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WorkflowRow {
    pub id: String,
    pub name: String,
    pub definition_ref: String,
    pub status: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl WorkflowRow {
    pub fn into_domain(self) -> Workflow {
        Workflow {
            id: Uuid::parse_str(&self.id).unwrap_or_default(),
            name: self.name,
            definition_ref: self.definition_ref,
            status: WorkflowStatus::parse(&self.status).unwrap_or_default(),
            created_at: timestamp_to_datetime(self.created_at),
            updated_at: timestamp_to_datetime(self.updated_at),
        }
    }
}

impl From<&Workflow> for WorkflowRow {
    fn from(workflow: &Workflow) -> Self {
        Self {
            id: workflow.id.to_string(),
            name: workflow.name.clone(),
            definition_ref: workflow.definition_ref.clone(),
            status: workflow.status.as_str().to_string(),
            created_at: datetime_to_timestamp(workflow.created_at),
            updated_at: datetime_to_timestamp(workflow.updated_at),
        }
    }
}
