use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

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

    #[error("Diff not found: {0}")]
    DiffNotFound(Uuid),
}
