use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Kanban board layout for a workflow. Columns are free-form names; the
/// terminal column is only reachable through an explicit resolve.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoardConfig {
    pub columns: Vec<String>,
    pub initial_column: String,
    pub terminal_column: String,
    #[serde(default)]
    pub require_comment_on_change: bool,
}

impl BoardConfig {
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    pub fn is_terminal(&self, column: &str) -> bool {
        self.terminal_column == column
    }
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            columns: vec![
                "backlog".into(),
                "in_progress".into(),
                "review".into(),
                "resolved".into(),
            ],
            initial_column: "backlog".into(),
            terminal_column: "resolved".into(),
            require_comment_on_change: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub ticket_type: String,
    /// One of the board's configured columns.
    pub status: String,
    pub parent_ticket_id: Option<Uuid>,
    pub blocked_by: BTreeSet<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        ticket_type: impl Into<String>,
        initial_status: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: description.into(),
            ticket_type: ticket_type.into(),
            status: initial_status.into(),
            parent_ticket_id: None,
            blocked_by: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_parent(mut self, parent_ticket_id: Uuid) -> Self {
        self.parent_ticket_id = Some(parent_ticket_id);
        self
    }

    pub fn with_blockers(mut self, blocked_by: BTreeSet<Uuid>) -> Self {
        self.blocked_by = blocked_by;
        self
    }

    /// Advisory: callers should not pick up blocked tickets for active
    /// work, but no operation is rejected because of this.
    pub fn is_blocked(&self) -> bool {
        !self.blocked_by.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketComment {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl TicketComment {
    pub fn new(ticket_id: Uuid, author: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            ticket_id,
            author: author.into(),
            body: body.into(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTicketRequest {
    pub title: String,
    pub description: String,
    pub ticket_type: String,
    pub parent_ticket_id: Option<Uuid>,
    #[serde(default)]
    pub blocked_by: BTreeSet<Uuid>,
}

impl CreateTicketRequest {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        ticket_type: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            ticket_type: ticket_type.into(),
            parent_ticket_id: None,
            blocked_by: BTreeSet::new(),
        }
    }
}
