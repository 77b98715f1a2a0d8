use swarm_core::{BoardConfig, CreateTicketRequest, Ticket, TicketComment};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{OrchestratorError, Result};
use crate::store::Store;

/// Kanban-style dependency tracking over tickets, orthogonal to the task
/// lifecycle. Blocking relationships are stored and surfaced but never
/// enforced; the terminal column is only reachable through resolve.
pub struct TicketBoard {
    store: Store,
    workflow_id: Uuid,
}

impl TicketBoard {
    pub fn new(store: Store, workflow_id: Uuid) -> Self {
        Self { store, workflow_id }
    }

    async fn board_config(&self) -> Result<BoardConfig> {
        self.store
            .boards
            .find_by_workflow(self.workflow_id)
            .await?
            .ok_or(OrchestratorError::BoardNotConfigured(self.workflow_id))
    }

    pub async fn create_ticket(&self, request: CreateTicketRequest) -> Result<Ticket> {
        let board = self.board_config().await?;

        let mut ticket = Ticket::new(
            &request.title,
            &request.description,
            &request.ticket_type,
            &board.initial_column,
        )
        .with_blockers(request.blocked_by);
        if let Some(parent) = request.parent_ticket_id {
            ticket = ticket.with_parent(parent);
        }

        let ticket = self.store.tickets.create(&ticket).await?;
        info!(ticket_id = %ticket.id, title = %ticket.title, "Ticket created");

        Ok(ticket)
    }

    /// Free transition between non-terminal columns. Entering the
    /// terminal column this way is rejected; use [`Self::resolve`].
    pub async fn change_status(
        &self,
        ticket_id: Uuid,
        new_status: &str,
        actor: &str,
        comment: Option<&str>,
    ) -> Result<Ticket> {
        let board = self.board_config().await?;
        let mut ticket = self.find_ticket(ticket_id).await?;

        if !board.has_column(new_status) {
            return Err(OrchestratorError::UnknownColumn(new_status.to_string()));
        }
        if board.is_terminal(new_status) {
            return Err(OrchestratorError::TerminalViaChangeStatus(
                new_status.to_string(),
            ));
        }
        if board.is_terminal(&ticket.status) {
            return Err(OrchestratorError::AlreadyResolved(ticket_id));
        }
        if board.require_comment_on_change && comment.is_none() {
            return Err(OrchestratorError::CommentRequired);
        }

        debug!(
            ticket_id = %ticket_id,
            from = %ticket.status,
            to = new_status,
            actor = actor,
            "Ticket status change"
        );

        ticket.status = new_status.to_string();
        let ticket = self.store.tickets.update(&ticket).await?;

        if let Some(comment) = comment {
            self.store
                .tickets
                .add_comment(&TicketComment::new(ticket_id, actor, comment))
                .await?;
        }

        Ok(ticket)
    }

    /// The only path into the terminal column.
    pub async fn resolve(
        &self,
        ticket_id: Uuid,
        actor: &str,
        resolution_comment: &str,
    ) -> Result<Ticket> {
        let board = self.board_config().await?;
        let mut ticket = self.find_ticket(ticket_id).await?;

        if board.is_terminal(&ticket.status) {
            return Err(OrchestratorError::AlreadyResolved(ticket_id));
        }

        ticket.status = board.terminal_column.clone();
        let ticket = self.store.tickets.update(&ticket).await?;

        self.store
            .tickets
            .add_comment(&TicketComment::new(ticket_id, actor, resolution_comment))
            .await?;

        info!(ticket_id = %ticket_id, actor = actor, "Ticket resolved");

        Ok(ticket)
    }

    pub async fn add_comment(
        &self,
        ticket_id: Uuid,
        author: &str,
        body: &str,
    ) -> Result<TicketComment> {
        self.find_ticket(ticket_id).await?;
        Ok(self
            .store
            .tickets
            .add_comment(&TicketComment::new(ticket_id, author, body))
            .await?)
    }

    pub async fn get_ticket(&self, ticket_id: Uuid) -> Result<Ticket> {
        self.find_ticket(ticket_id).await
    }

    pub async fn comments(&self, ticket_id: Uuid) -> Result<Vec<TicketComment>> {
        Ok(self.store.tickets.find_comments(ticket_id).await?)
    }

    pub async fn tickets(&self) -> Result<Vec<Ticket>> {
        Ok(self.store.tickets.find_all().await?)
    }

    /// Tickets a scheduler should not pick up yet. Advisory only.
    pub async fn blocked_tickets(&self) -> Result<Vec<Ticket>> {
        Ok(self.store.tickets.find_blocked().await?)
    }

    async fn find_ticket(&self, ticket_id: Uuid) -> Result<Ticket> {
        self.store
            .tickets
            .find_by_id(ticket_id)
            .await?
            .ok_or(OrchestratorError::TicketNotFound(ticket_id))
    }
}
