use crate::error::DbError;
use crate::models::{TicketCommentRow, TicketRow};
use chrono::Utc;
use sqlx::SqlitePool;
use swarm_core::{Ticket, TicketComment};
use uuid::Uuid;

const TICKET_COLUMNS: &str =
    "id, title, description, ticket_type, status, parent_ticket_id, blocked_by, created_at, updated_at";

#[derive(Clone)]
pub struct TicketRepository {
    pool: SqlitePool,
}

impl TicketRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, ticket: &Ticket) -> Result<Ticket, DbError> {
        let row = TicketRow::from(ticket);

        sqlx::query(&format!(
            r#"
            INSERT INTO tickets ({TICKET_COLUMNS})
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        ))
        .bind(&row.id)
        .bind(&row.title)
        .bind(&row.description)
        .bind(&row.ticket_type)
        .bind(&row.status)
        .bind(&row.parent_ticket_id)
        .bind(&row.blocked_by)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(ticket.clone())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Ticket>, DbError> {
        let row: Option<TicketRow> =
            sqlx::query_as(&format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|r| r.into_domain()))
    }

    pub async fn find_all(&self) -> Result<Vec<Ticket>, DbError> {
        let rows: Vec<TicketRow> = sqlx::query_as(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets ORDER BY created_at ASC, rowid ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_domain()).collect())
    }

    /// Tickets with at least one blocker recorded. Advisory for
    /// schedulers; nothing is enforced at this layer.
    pub async fn find_blocked(&self) -> Result<Vec<Ticket>, DbError> {
        let rows: Vec<TicketRow> = sqlx::query_as(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE blocked_by != '[]' ORDER BY created_at ASC, rowid ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_domain()).collect())
    }

    pub async fn update(&self, ticket: &Ticket) -> Result<Ticket, DbError> {
        let mut updated = ticket.clone();
        updated.updated_at = Utc::now();
        let row = TicketRow::from(&updated);

        let result = sqlx::query(
            r#"
            UPDATE tickets
            SET title = ?, description = ?, ticket_type = ?, status = ?, parent_ticket_id = ?, blocked_by = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&row.title)
        .bind(&row.description)
        .bind(&row.ticket_type)
        .bind(&row.status)
        .bind(&row.parent_ticket_id)
        .bind(&row.blocked_by)
        .bind(row.updated_at)
        .bind(&row.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::TicketNotFound(ticket.id));
        }

        Ok(updated)
    }

    pub async fn add_comment(&self, comment: &TicketComment) -> Result<TicketComment, DbError> {
        let row = TicketCommentRow::from(comment);

        sqlx::query(
            r#"
            INSERT INTO ticket_comments (id, ticket_id, author, body, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.ticket_id)
        .bind(&row.author)
        .bind(&row.body)
        .bind(row.created_at)
        .execute(&self.pool)
        .await?;

        Ok(comment.clone())
    }

    pub async fn find_comments(&self, ticket_id: Uuid) -> Result<Vec<TicketComment>, DbError> {
        let rows: Vec<TicketCommentRow> = sqlx::query_as(
            r#"
            SELECT id, ticket_id, author, body, created_at
            FROM ticket_comments
            WHERE ticket_id = ?
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .bind(ticket_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_domain()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};

    async fn setup_test_db() -> SqlitePool {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_create_and_find_ticket() {
        let pool = setup_test_db().await;
        let repo = TicketRepository::new(pool);

        let ticket = Ticket::new("Split parser", "Parser is too big", "refactor", "backlog");
        repo.create(&ticket).await.unwrap();

        let found = repo.find_by_id(ticket.id).await.unwrap().unwrap();
        assert_eq!(found.title, "Split parser");
        assert_eq!(found.status, "backlog");
    }

    #[tokio::test]
    async fn test_blocked_round_trip() {
        let pool = setup_test_db().await;
        let repo = TicketRepository::new(pool);

        let blocker = Ticket::new("Blocker", "", "task", "backlog");
        repo.create(&blocker).await.unwrap();

        let blocked = Ticket::new("Blocked", "", "task", "backlog")
            .with_blockers([blocker.id].into_iter().collect());
        repo.create(&blocked).await.unwrap();

        let found = repo.find_blocked().await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, blocked.id);
        assert!(found[0].blocked_by.contains(&blocker.id));
    }

    #[tokio::test]
    async fn test_comments() {
        let pool = setup_test_db().await;
        let repo = TicketRepository::new(pool);

        let ticket = Ticket::new("Docs", "", "chore", "backlog");
        repo.create(&ticket).await.unwrap();

        repo.add_comment(&TicketComment::new(ticket.id, "operator", "triaged"))
            .await
            .unwrap();
        repo.add_comment(&TicketComment::new(ticket.id, "worker-3", "picked up"))
            .await
            .unwrap();

        let comments = repo.find_comments(ticket.id).await.unwrap();
        assert_eq!(comments.len(), 2);
    }
}
