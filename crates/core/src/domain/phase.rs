use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

fn default_enabled() -> bool {
    true
}

/// Validation requirement attached to a phase. Absence of a config means
/// tasks under the phase complete without a review loop; a config with
/// `enabled: false` means the same but keeps the criteria around.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub criteria: Vec<String>,
}

impl ValidationConfig {
    pub fn new(criteria: Vec<String>) -> Self {
        Self {
            enabled: true,
            criteria,
        }
    }

    pub fn disabled(criteria: Vec<String>) -> Self {
        Self {
            enabled: false,
            criteria,
        }
    }
}

/// Execution marker for a phase within its workflow run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PhaseExecutionStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl PhaseExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Phase {
    pub id: Uuid,
    pub workflow_id: Uuid,
    /// Ascending within the workflow, gaps allowed.
    pub phase_order: i64,
    pub name: String,
    pub description: String,
    pub done_definitions: Vec<String>,
    pub validation: Option<ValidationConfig>,
    pub execution_status: PhaseExecutionStatus,
    pub created_at: DateTime<Utc>,
}

impl Phase {
    pub fn new(workflow_id: Uuid, phase_order: i64, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            workflow_id,
            phase_order,
            name: name.into(),
            description: String::new(),
            done_definitions: Vec::new(),
            validation: None,
            execution_status: PhaseExecutionStatus::default(),
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_done_definitions(mut self, done_definitions: Vec<String>) -> Self {
        self.done_definitions = done_definitions;
        self
    }

    pub fn with_validation(mut self, validation: ValidationConfig) -> Self {
        self.validation = Some(validation);
        self
    }

    /// Whether tasks created under this phase must pass the validation
    /// loop. Derived once at task creation; later phase edits do not
    /// retroactively change existing tasks.
    pub fn validation_required(&self) -> bool {
        self.validation.as_ref().map(|v| v.enabled).unwrap_or(false)
    }
}

/// How a caller refers to a phase when creating a task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PhaseRef {
    Id(Uuid),
    Order(i64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_required() {
        let workflow_id = Uuid::new_v4();
        let phase = Phase::new(workflow_id, 1, "build");
        assert!(!phase.validation_required());

        let phase = phase.with_validation(ValidationConfig::new(vec!["tests pass".into()]));
        assert!(phase.validation_required());

        let phase =
            Phase::new(workflow_id, 2, "docs").with_validation(ValidationConfig::disabled(vec![]));
        assert!(!phase.validation_required());
    }

    #[test]
    fn test_enabled_defaults_true_when_config_present() {
        let config: ValidationConfig =
            serde_json::from_str(r#"{"criteria":["lint clean"]}"#).unwrap();
        assert!(config.enabled);
        assert_eq!(config.criteria, vec!["lint clean".to_string()]);
    }

    #[test]
    fn test_execution_status_round_trip() {
        assert_eq!(
            PhaseExecutionStatus::parse("in_progress"),
            Some(PhaseExecutionStatus::InProgress)
        );
        assert_eq!(PhaseExecutionStatus::Completed.as_str(), "completed");
        assert_eq!(PhaseExecutionStatus::parse("running"), None);
    }
}
