use swarm_core::{Phase, PhaseExecutionStatus, ValidationConfig};
use uuid::Uuid;

use super::{datetime_to_timestamp, timestamp_to_datetime};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PhaseRow {
    pub id: String,
    pub workflow_id: String,
    pub phase_order: i64,
    pub name: String,
    pub description: String,
    /// JSON list of strings.
    pub done_definitions: String,
    /// JSON-encoded ValidationConfig, NULL when the phase has none.
    pub validation: Option<String>,
    pub execution_status: String,
    pub created_at: i64,
}

impl PhaseRow {
    pub fn into_domain(self) -> Phase {
        Phase {
            id: Uuid::parse_str(&self.id).unwrap_or_default(),
            workflow_id: Uuid::parse_str(&self.workflow_id).unwrap_or_default(),
            phase_order: self.phase_order,
            name: self.name,
            description: self.description,
            done_definitions: serde_json::from_str(&self.done_definitions).unwrap_or_default(),
            validation: self
                .validation
                .and_then(|v| serde_json::from_str::<ValidationConfig>(&v).ok()),
            execution_status: PhaseExecutionStatus::parse(&self.execution_status)
                .unwrap_or_default(),
            created_at: timestamp_to_datetime(self.created_at),
        }
    }
}

impl From<&Phase> for PhaseRow {
    fn from(phase: &Phase) -> Self {
        Self {
            id: phase.id.to_string(),
            workflow_id: phase.workflow_id.to_string(),
            phase_order: phase.phase_order,
            name: phase.name.clone(),
            description: phase.description.clone(),
            done_definitions: serde_json::to_string(&phase.done_definitions)
                .unwrap_or_else(|_| "[]".to_string()),
            validation: phase
                .validation
                .as_ref()
                .and_then(|v| serde_json::to_string(v).ok()),
            execution_status: phase.execution_status.as_str().to_string(),
            created_at: datetime_to_timestamp(phase.created_at),
        }
    }
}
