use swarm_core::{Agent, AgentStatus};
use uuid::Uuid;

use super::{datetime_to_timestamp, timestamp_to_datetime};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AgentRow {
    pub id: String,
    pub name: String,
    pub status: String,
    pub current_task_id: Option<String>,
    pub kept_alive_for_validation: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl AgentRow {
    pub fn into_domain(self) -> Agent {
        Agent {
            id: Uuid::parse_str(&self.id).unwrap_or_default(),
            name: self.name,
            status: AgentStatus::parse(&self.status).unwrap_or_default(),
            current_task_id: self.current_task_id.and_then(|s| Uuid::parse_str(&s).ok()),
            kept_alive_for_validation: self.kept_alive_for_validation,
            created_at: timestamp_to_datetime(self.created_at),
            updated_at: timestamp_to_datetime(self.updated_at),
        }
    }
}

impl From<&Agent> for AgentRow {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id.to_string(),
            name: agent.name.clone(),
            status: agent.status.as_str().to_string(),
            current_task_id: agent.current_task_id.map(|id| id.to_string()),
            kept_alive_for_validation: agent.kept_alive_for_validation,
            created_at: datetime_to_timestamp(agent.created_at),
            updated_at: datetime_to_timestamp(agent.updated_at),
        }
    }
}
