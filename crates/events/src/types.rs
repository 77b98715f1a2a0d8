//! Event types published by the orchestration engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Envelope wrapping all events with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub event: Event,
}

impl EventEnvelope {
    pub fn new(event: Event) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            event,
        }
    }
}

/// All events the engine publishes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    #[serde(rename = "workflow.initialized")]
    WorkflowInitialized { workflow_id: Uuid, reused: bool },

    #[serde(rename = "phase.completed")]
    PhaseCompleted { phase_id: Uuid, workflow_id: Uuid },

    #[serde(rename = "task.created")]
    TaskCreated { task_id: Uuid, phase_id: Option<Uuid> },

    #[serde(rename = "task.assigned")]
    TaskAssigned { task_id: Uuid, agent_id: Uuid },

    #[serde(rename = "task.completed")]
    TaskCompleted { task_id: Uuid },

    #[serde(rename = "task.failed")]
    TaskFailed { task_id: Uuid, reason: String },

    /// A task entered review; the lifecycle manager must produce a
    /// validator agent for it.
    #[serde(rename = "validation.requested")]
    ValidationRequested { task_id: Uuid, iteration: i64 },

    #[serde(rename = "validation.passed")]
    ValidationPassed { task_id: Uuid, iteration: i64 },

    #[serde(rename = "validation.failed")]
    ValidationFailed {
        task_id: Uuid,
        iteration: i64,
        feedback: String,
    },

    /// The lifecycle manager must not tear the worker down while
    /// `kept_alive` is true.
    #[serde(rename = "agent.keep_alive_changed")]
    AgentKeepAliveChanged { agent_id: Uuid, kept_alive: bool },

    /// The worker finished all of its work and may be terminated.
    #[serde(rename = "agent.completed")]
    AgentCompleted { agent_id: Uuid },

    #[serde(rename = "diff.queued")]
    DiffQueued { diff_id: Uuid, file_path: String },

    #[serde(rename = "diff.batch_resolved")]
    DiffBatchResolved {
        batch_id: Uuid,
        resolved: usize,
        failed: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_has_unique_ids() {
        let a = EventEnvelope::new(Event::TaskCompleted {
            task_id: Uuid::new_v4(),
        });
        let b = EventEnvelope::new(Event::TaskCompleted {
            task_id: Uuid::new_v4(),
        });
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_event_serialization_tag() {
        let event = Event::ValidationRequested {
            task_id: Uuid::new_v4(),
            iteration: 1,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"validation.requested""#));
    }
}
