use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::phase::PhaseRef;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Pending,
    Assigned,
    InProgress,
    UnderReview,
    ValidationInProgress,
    NeedsWork,
    Done,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::UnderReview => "under_review",
            Self::ValidationInProgress => "validation_in_progress",
            Self::NeedsWork => "needs_work",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "assigned" => Some(Self::Assigned),
            "in_progress" => Some(Self::InProgress),
            "under_review" => Some(Self::UnderReview),
            "validation_in_progress" => Some(Self::ValidationInProgress),
            "needs_work" => Some(Self::NeedsWork),
            "done" => Some(Self::Done),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub phase_id: Option<Uuid>,
    pub description: String,
    pub done_definition: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub assigned_agent_id: Option<Uuid>,
    pub ticket_id: Option<Uuid>,
    /// Fixed at creation from the owning phase's validation config.
    pub validation_enabled: bool,
    /// Monotonic; bumped each time the task enters review.
    pub validation_iteration: i64,
    pub last_validation_feedback: Option<String>,
    pub review_done: bool,
    pub completion_summary: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    pub fn new(description: impl Into<String>, done_definition: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            phase_id: None,
            description: description.into(),
            done_definition: done_definition.into(),
            status: TaskStatus::default(),
            priority: TaskPriority::default(),
            assigned_agent_id: None,
            ticket_id: None,
            validation_enabled: false,
            validation_iteration: 0,
            last_validation_feedback: None,
            review_done: false,
            completion_summary: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_phase(mut self, phase_id: Uuid, validation_enabled: bool) -> Self {
        self.phase_id = Some(phase_id);
        self.validation_enabled = validation_enabled;
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_ticket(mut self, ticket_id: Uuid) -> Self {
        self.ticket_id = Some(ticket_id);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub description: String,
    pub done_definition: String,
    /// Explicit phase override; when absent the requester's current phase
    /// (or the first open phase of the active workflow) is used.
    pub phase: Option<PhaseRef>,
    pub priority: TaskPriority,
    pub ticket_id: Option<Uuid>,
    pub requester_agent_id: Option<Uuid>,
}

impl CreateTaskRequest {
    pub fn new(description: impl Into<String>, done_definition: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            done_definition: done_definition.into(),
            phase: None,
            priority: TaskPriority::default(),
            ticket_id: None,
            requester_agent_id: None,
        }
    }

    pub fn with_phase(mut self, phase: PhaseRef) -> Self {
        self.phase = Some(phase);
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }
}
