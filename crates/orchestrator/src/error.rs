use thiserror::Error;
use uuid::Uuid;

/// Every rejected operation maps to a distinct kind so automated callers
/// can branch on it (retry, escalate, stop) instead of pattern-matching
/// on message strings.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Task {task_id} is {status}, expected {expected}")]
    InvalidTaskState {
        task_id: Uuid,
        status: String,
        expected: String,
    },

    #[error("Phase reference does not resolve: {0}")]
    InvalidPhase(String),

    #[error("No active workflow")]
    NoActiveWorkflow,

    #[error("Workflow not found: {0}")]
    WorkflowNotFound(Uuid),

    #[error("Phase not found: {0}")]
    PhaseNotFound(Uuid),

    #[error("Task not found: {0}")]
    TaskNotFound(Uuid),

    #[error("Agent not found: {0}")]
    AgentNotFound(Uuid),

    #[error("Ticket not found: {0}")]
    TicketNotFound(Uuid),

    #[error("Board has no column named {0}")]
    UnknownColumn(String),

    #[error("Terminal column {0} is only reachable through resolve")]
    TerminalViaChangeStatus(String),

    #[error("Board requires a comment on status change")]
    CommentRequired,

    #[error("Ticket already resolved: {0}")]
    AlreadyResolved(Uuid),

    #[error("No board configured for workflow {0}")]
    BoardNotConfigured(Uuid),

    #[error("Diff not found: {0}")]
    DiffNotFound(Uuid),

    #[error("Diff not resolved yet: {0}")]
    DiffNotResolved(Uuid),

    #[error("Database error: {0}")]
    Database(#[from] db::DbError),
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
