use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DiffStatus {
    #[default]
    Pending,
    Processing,
    Resolved,
    Failed,
}

impl DiffStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Resolved => "resolved",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "processing" => Some(Self::Processing),
            "resolved" => Some(Self::Resolved),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionChoice {
    /// Keep the shared baseline's version of the file.
    Parent,
    /// Keep the worker's version of the file.
    Child,
    /// Replace with arbitrated content combining both.
    Merged,
}

impl ResolutionChoice {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parent => "parent",
            Self::Child => "child",
            Self::Merged => "merged",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "parent" => Some(Self::Parent),
            "child" => Some(Self::Child),
            "merged" => Some(Self::Merged),
            _ => None,
        }
    }

    /// Audit category for compatibility reporting. Merged content is
    /// rooted in the baseline, so it reports as "parent".
    pub fn audit_outcome(&self) -> &'static str {
        match self {
            Self::Parent | Self::Merged => "parent",
            Self::Child => "child",
        }
    }
}

/// A single file-level content conflict between the shared baseline and
/// one worker's isolated copy, awaiting arbitration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingDiffResolution {
    pub id: Uuid,
    pub merge_context_id: Uuid,
    pub worktree_owner_id: Uuid,
    pub file_path: String,
    pub parent_content: String,
    pub child_content: String,
    pub parent_ts: Option<DateTime<Utc>>,
    pub child_ts: Option<DateTime<Utc>>,
    pub diff_context: Option<String>,
    pub status: DiffStatus,
    pub batch_id: Option<Uuid>,
    pub resolution_choice: Option<ResolutionChoice>,
    /// Required iff resolution_choice is Merged.
    pub resolved_content: Option<String>,
    pub resolver_agent_id: Option<Uuid>,
    pub resolution_reasoning: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PendingDiffResolution {
    pub fn new(request: QueueDiffRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            merge_context_id: request.merge_context_id,
            worktree_owner_id: request.worktree_owner_id,
            file_path: request.file_path,
            parent_content: request.parent_content,
            child_content: request.child_content,
            parent_ts: request.parent_ts,
            child_ts: request.child_ts,
            diff_context: request.diff_context,
            status: DiffStatus::Pending,
            batch_id: None,
            resolution_choice: None,
            resolved_content: None,
            resolver_agent_id: None,
            resolution_reasoning: None,
            resolved_at: None,
            created_at: Utc::now(),
        }
    }

    /// The final file content for a resolved diff.
    pub fn effective_content(&self) -> Option<&str> {
        match self.resolution_choice? {
            ResolutionChoice::Parent => Some(&self.parent_content),
            ResolutionChoice::Child => Some(&self.child_content),
            ResolutionChoice::Merged => self.resolved_content.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueDiffRequest {
    pub merge_context_id: Uuid,
    pub worktree_owner_id: Uuid,
    pub file_path: String,
    pub parent_content: String,
    pub child_content: String,
    pub parent_ts: Option<DateTime<Utc>>,
    pub child_ts: Option<DateTime<Utc>>,
    pub diff_context: Option<String>,
}

impl QueueDiffRequest {
    pub fn new(
        merge_context_id: Uuid,
        worktree_owner_id: Uuid,
        file_path: impl Into<String>,
        parent_content: impl Into<String>,
        child_content: impl Into<String>,
    ) -> Self {
        Self {
            merge_context_id,
            worktree_owner_id,
            file_path: file_path.into(),
            parent_content: parent_content.into(),
            child_content: child_content.into(),
            parent_ts: None,
            child_ts: None,
            diff_context: None,
        }
    }

    pub fn with_timestamps(
        mut self,
        parent_ts: DateTime<Utc>,
        child_ts: DateTime<Utc>,
    ) -> Self {
        self.parent_ts = Some(parent_ts);
        self.child_ts = Some(child_ts);
        self
    }

    pub fn with_diff_context(mut self, diff_context: impl Into<String>) -> Self {
        self.diff_context = Some(diff_context.into());
        self
    }
}

/// Audit record written alongside every resolved diff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeConflictResolution {
    pub id: Uuid,
    pub diff_id: Uuid,
    pub file_path: String,
    /// "parent" or "child" per [`ResolutionChoice::audit_outcome`].
    pub outcome: String,
    pub resolver_agent_id: Uuid,
    pub reasoning: String,
    pub created_at: DateTime<Utc>,
}

impl MergeConflictResolution {
    pub fn new(
        diff_id: Uuid,
        file_path: impl Into<String>,
        choice: ResolutionChoice,
        resolver_agent_id: Uuid,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            diff_id,
            file_path: file_path.into(),
            outcome: choice.audit_outcome().to_string(),
            resolver_agent_id,
            reasoning: reasoning.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queued() -> PendingDiffResolution {
        PendingDiffResolution::new(QueueDiffRequest::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "src/lib.rs",
            "parent version",
            "child version",
        ))
    }

    #[test]
    fn test_queued_diff_defaults() {
        let diff = queued();

        assert_eq!(diff.status, DiffStatus::Pending);
        assert!(diff.batch_id.is_none());
        assert!(diff.effective_content().is_none());
    }

    #[test]
    fn test_effective_content_per_choice() {
        let mut diff = queued();

        diff.resolution_choice = Some(ResolutionChoice::Parent);
        assert_eq!(diff.effective_content(), Some("parent version"));

        diff.resolution_choice = Some(ResolutionChoice::Child);
        assert_eq!(diff.effective_content(), Some("child version"));

        diff.resolution_choice = Some(ResolutionChoice::Merged);
        diff.resolved_content = Some("merged version".into());
        assert_eq!(diff.effective_content(), Some("merged version"));
    }

    #[test]
    fn test_audit_outcome_mapping() {
        assert_eq!(ResolutionChoice::Parent.audit_outcome(), "parent");
        assert_eq!(ResolutionChoice::Merged.audit_outcome(), "parent");
        assert_eq!(ResolutionChoice::Child.audit_outcome(), "child");
    }

    #[test]
    fn test_choice_parse() {
        assert_eq!(ResolutionChoice::parse("merged"), Some(ResolutionChoice::Merged));
        assert_eq!(ResolutionChoice::parse("both"), None);
    }
}
