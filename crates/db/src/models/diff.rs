use swarm_core::{DiffStatus, MergeConflictResolution, PendingDiffResolution, ResolutionChoice};
use uuid::Uuid;

use super::{datetime_to_timestamp, timestamp_to_datetime};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DiffRow {
    pub id: String,
    pub merge_context_id: String,
    pub worktree_owner_id: String,
    pub file_path: String,
    pub parent_content: String,
    pub child_content: String,
    pub parent_ts: Option<i64>,
    pub child_ts: Option<i64>,
    pub diff_context: Option<String>,
    pub status: String,
    pub batch_id: Option<String>,
    pub resolution_choice: Option<String>,
    pub resolved_content: Option<String>,
    pub resolver_agent_id: Option<String>,
    pub resolution_reasoning: Option<String>,
    pub resolved_at: Option<i64>,
    pub created_at: i64,
}

impl DiffRow {
    pub fn into_domain(self) -> PendingDiffResolution {
        PendingDiffResolution {
            id: Uuid::parse_str(&self.id).unwrap_or_default(),
            merge_context_id: Uuid::parse_str(&self.merge_context_id).unwrap_or_default(),
            worktree_owner_id: Uuid::parse_str(&self.worktree_owner_id).unwrap_or_default(),
            file_path: self.file_path,
            parent_content: self.parent_content,
            child_content: self.child_content,
            parent_ts: self.parent_ts.map(timestamp_to_datetime),
            child_ts: self.child_ts.map(timestamp_to_datetime),
            diff_context: self.diff_context,
            status: DiffStatus::parse(&self.status).unwrap_or_default(),
            batch_id: self.batch_id.and_then(|s| Uuid::parse_str(&s).ok()),
            resolution_choice: self
                .resolution_choice
                .and_then(|s| ResolutionChoice::parse(&s)),
            resolved_content: self.resolved_content,
            resolver_agent_id: self.resolver_agent_id.and_then(|s| Uuid::parse_str(&s).ok()),
            resolution_reasoning: self.resolution_reasoning,
            resolved_at: self.resolved_at.map(timestamp_to_datetime),
            created_at: timestamp_to_datetime(self.created_at),
        }
    }
}

impl From<&PendingDiffResolution> for DiffRow {
    fn from(diff: &PendingDiffResolution) -> Self {
        Self {
            id: diff.id.to_string(),
            merge_context_id: diff.merge_context_id.to_string(),
            worktree_owner_id: diff.worktree_owner_id.to_string(),
            file_path: diff.file_path.clone(),
            parent_content: diff.parent_content.clone(),
            child_content: diff.child_content.clone(),
            parent_ts: diff.parent_ts.map(datetime_to_timestamp),
            child_ts: diff.child_ts.map(datetime_to_timestamp),
            diff_context: diff.diff_context.clone(),
            status: diff.status.as_str().to_string(),
            batch_id: diff.batch_id.map(|id| id.to_string()),
            resolution_choice: diff.resolution_choice.map(|c| c.as_str().to_string()),
            resolved_content: diff.resolved_content.clone(),
            resolver_agent_id: diff.resolver_agent_id.map(|id| id.to_string()),
            resolution_reasoning: diff.resolution_reasoning.clone(),
            resolved_at: diff.resolved_at.map(datetime_to_timestamp),
            created_at: datetime_to_timestamp(diff.created_at),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MergeConflictResolutionRow {
    pub id: String,
    pub diff_id: String,
    pub file_path: String,
    pub outcome: String,
    pub resolver_agent_id: String,
    pub reasoning: String,
    pub created_at: i64,
}

impl MergeConflictResolutionRow {
    pub fn into_domain(self) -> MergeConflictResolution {
        MergeConflictResolution {
            id: Uuid::parse_str(&self.id).unwrap_or_default(),
            diff_id: Uuid::parse_str(&self.diff_id).unwrap_or_default(),
            file_path: self.file_path,
            outcome: self.outcome,
            resolver_agent_id: Uuid::parse_str(&self.resolver_agent_id).unwrap_or_default(),
            reasoning: self.reasoning,
            created_at: timestamp_to_datetime(self.created_at),
        }
    }
}

impl From<&MergeConflictResolution> for MergeConflictResolutionRow {
    fn from(resolution: &MergeConflictResolution) -> Self {
        Self {
            id: resolution.id.to_string(),
            diff_id: resolution.diff_id.to_string(),
            file_path: resolution.file_path.clone(),
            outcome: resolution.outcome.clone(),
            resolver_agent_id: resolution.resolver_agent_id.to_string(),
            reasoning: resolution.reasoning.clone(),
            created_at: datetime_to_timestamp(resolution.created_at),
        }
    }
}
