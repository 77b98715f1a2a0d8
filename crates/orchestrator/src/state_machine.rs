use swarm_core::TaskStatus;

use crate::error::{OrchestratorError, Result};

pub struct TaskStateMachine;

impl TaskStateMachine {
    pub fn validate_transition(from: &TaskStatus, to: &TaskStatus) -> Result<()> {
        let allowed = Self::allowed_transitions(from);

        if allowed.contains(to) {
            Ok(())
        } else {
            Err(OrchestratorError::InvalidTransition {
                from: from.as_str().to_string(),
                to: to.as_str().to_string(),
            })
        }
    }

    fn allowed_transitions(from: &TaskStatus) -> Vec<TaskStatus> {
        match from {
            TaskStatus::Pending => vec![TaskStatus::Assigned],
            TaskStatus::Assigned => vec![TaskStatus::InProgress, TaskStatus::Failed],
            TaskStatus::InProgress => vec![
                TaskStatus::Done,
                TaskStatus::UnderReview,
                TaskStatus::Failed,
            ],
            TaskStatus::UnderReview => vec![TaskStatus::ValidationInProgress],
            TaskStatus::ValidationInProgress => vec![TaskStatus::Done, TaskStatus::NeedsWork],
            TaskStatus::NeedsWork => vec![TaskStatus::UnderReview, TaskStatus::Failed],
            TaskStatus::Done => vec![],
            TaskStatus::Failed => vec![],
        }
    }

    pub fn can_transition(from: &TaskStatus, to: &TaskStatus) -> bool {
        Self::validate_transition(from, to).is_ok()
    }
}
