use std::collections::BTreeSet;
use swarm_core::{BoardConfig, Ticket, TicketComment};
use uuid::Uuid;

use super::{datetime_to_timestamp, timestamp_to_datetime};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TicketRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub ticket_type: String,
    pub status: String,
    pub parent_ticket_id: Option<String>,
    /// JSON list of ticket ids.
    pub blocked_by: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TicketRow {
    pub fn into_domain(self) -> Ticket {
        let blocked_by: BTreeSet<Uuid> = serde_json::from_str::<Vec<String>>(&self.blocked_by)
            .unwrap_or_default()
            .iter()
            .filter_map(|s| Uuid::parse_str(s).ok())
            .collect();

        Ticket {
            id: Uuid::parse_str(&self.id).unwrap_or_default(),
            title: self.title,
            description: self.description,
            ticket_type: self.ticket_type,
            status: self.status,
            parent_ticket_id: self.parent_ticket_id.and_then(|s| Uuid::parse_str(&s).ok()),
            blocked_by,
            created_at: timestamp_to_datetime(self.created_at),
            updated_at: timestamp_to_datetime(self.updated_at),
        }
    }
}

impl From<&Ticket> for TicketRow {
    fn from(ticket: &Ticket) -> Self {
        let blocked_by: Vec<String> = ticket.blocked_by.iter().map(|id| id.to_string()).collect();

        Self {
            id: ticket.id.to_string(),
            title: ticket.title.clone(),
            description: ticket.description.clone(),
            ticket_type: ticket.ticket_type.clone(),
            status: ticket.status.clone(),
            parent_ticket_id: ticket.parent_ticket_id.map(|id| id.to_string()),
            blocked_by: serde_json::to_string(&blocked_by).unwrap_or_else(|_| "[]".to_string()),
            created_at: datetime_to_timestamp(ticket.created_at),
            updated_at: datetime_to_timestamp(ticket.updated_at),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TicketCommentRow {
    pub id: String,
    pub ticket_id: String,
    pub author: String,
    pub body: String,
    pub created_at: i64,
}

impl TicketCommentRow {
    pub fn into_domain(self) -> TicketComment {
        TicketComment {
            id: Uuid::parse_str(&self.id).unwrap_or_default(),
            ticket_id: Uuid::parse_str(&self.ticket_id).unwrap_or_default(),
            author: self.author,
            body: self.body,
            created_at: timestamp_to_datetime(self.created_at),
        }
    }
}

impl From<&TicketComment> for TicketCommentRow {
    fn from(comment: &TicketComment) -> Self {
        Self {
            id: comment.id.to_string(),
            ticket_id: comment.ticket_id.to_string(),
            author: comment.author.clone(),
            body: comment.body.clone(),
            created_at: datetime_to_timestamp(comment.created_at),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BoardConfigRow {
    pub workflow_id: String,
    /// JSON list of column names.
    pub columns: String,
    pub initial_column: String,
    pub terminal_column: String,
    pub require_comment_on_change: bool,
}

impl BoardConfigRow {
    pub fn into_domain(self) -> BoardConfig {
        BoardConfig {
            columns: serde_json::from_str(&self.columns).unwrap_or_default(),
            initial_column: self.initial_column,
            terminal_column: self.terminal_column,
            require_comment_on_change: self.require_comment_on_change,
        }
    }
}
