use crate::error::DbError;
use crate::models::{DiffRow, MergeConflictResolutionRow};
use chrono::Utc;
use sqlx::SqlitePool;
use swarm_core::{DiffStatus, MergeConflictResolution, PendingDiffResolution, ResolutionChoice};
use tracing::debug;
use uuid::Uuid;

const DIFF_COLUMNS: &str = "id, merge_context_id, worktree_owner_id, file_path, parent_content, child_content, parent_ts, child_ts, diff_context, status, batch_id, resolution_choice, resolved_content, resolver_agent_id, resolution_reasoning, resolved_at, created_at";

#[derive(Clone)]
pub struct DiffRepository {
    pool: SqlitePool,
}

impl DiffRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        diff: &PendingDiffResolution,
    ) -> Result<PendingDiffResolution, DbError> {
        let row = DiffRow::from(diff);

        sqlx::query(&format!(
            r#"
            INSERT INTO pending_diff_resolutions ({DIFF_COLUMNS})
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        ))
        .bind(&row.id)
        .bind(&row.merge_context_id)
        .bind(&row.worktree_owner_id)
        .bind(&row.file_path)
        .bind(&row.parent_content)
        .bind(&row.child_content)
        .bind(row.parent_ts)
        .bind(row.child_ts)
        .bind(&row.diff_context)
        .bind(&row.status)
        .bind(&row.batch_id)
        .bind(&row.resolution_choice)
        .bind(&row.resolved_content)
        .bind(&row.resolver_agent_id)
        .bind(&row.resolution_reasoning)
        .bind(row.resolved_at)
        .bind(row.created_at)
        .execute(&self.pool)
        .await?;

        Ok(diff.clone())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<PendingDiffResolution>, DbError> {
        let row: Option<DiffRow> = sqlx::query_as(&format!(
            "SELECT {DIFF_COLUMNS} FROM pending_diff_resolutions WHERE id = ?"
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.into_domain()))
    }

    /// Claims up to `limit` oldest pending diffs into a batch: stamps them
    /// processing with the shared batch id. Runs in one transaction so a
    /// diff can never be claimed by two batches.
    pub async fn claim_pending(
        &self,
        batch_id: Uuid,
        limit: i64,
    ) -> Result<Vec<PendingDiffResolution>, DbError> {
        let mut tx = self.pool.begin().await?;

        let rows: Vec<DiffRow> = sqlx::query_as(&format!(
            r#"
            SELECT {DIFF_COLUMNS} FROM pending_diff_resolutions
            WHERE status = 'pending'
            ORDER BY created_at ASC, rowid ASC
            LIMIT ?
            "#
        ))
        .bind(limit)
        .fetch_all(&mut *tx)
        .await?;

        for row in &rows {
            sqlx::query(
                r#"
                UPDATE pending_diff_resolutions
                SET status = 'processing', batch_id = ?
                WHERE id = ? AND status = 'pending'
                "#,
            )
            .bind(batch_id.to_string())
            .bind(&row.id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        debug!(batch_id = %batch_id, claimed = rows.len(), "Claimed pending diffs");

        Ok(rows
            .into_iter()
            .map(|r| {
                let mut diff = r.into_domain();
                diff.status = DiffStatus::Processing;
                diff.batch_id = Some(batch_id);
                diff
            })
            .collect())
    }

    pub async fn mark_resolved(
        &self,
        id: Uuid,
        choice: ResolutionChoice,
        resolved_content: Option<&str>,
        resolver_agent_id: Uuid,
        reasoning: &str,
    ) -> Result<(), DbError> {
        let result = sqlx::query(
            r#"
            UPDATE pending_diff_resolutions
            SET status = 'resolved', resolution_choice = ?, resolved_content = ?,
                resolver_agent_id = ?, resolution_reasoning = ?, resolved_at = ?
            WHERE id = ?
            "#,
        )
        .bind(choice.as_str())
        .bind(resolved_content)
        .bind(resolver_agent_id.to_string())
        .bind(reasoning)
        .bind(Utc::now().timestamp())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::DiffNotFound(id));
        }

        Ok(())
    }

    pub async fn mark_failed(
        &self,
        id: Uuid,
        resolver_agent_id: Uuid,
        reasoning: &str,
    ) -> Result<(), DbError> {
        let result = sqlx::query(
            r#"
            UPDATE pending_diff_resolutions
            SET status = 'failed', resolver_agent_id = ?, resolution_reasoning = ?
            WHERE id = ?
            "#,
        )
        .bind(resolver_agent_id.to_string())
        .bind(reasoning)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::DiffNotFound(id));
        }

        Ok(())
    }

    /// Returns every processing diff to the pending queue. Only sound
    /// while no batch is running: rows still stamped processing at that
    /// point were claimed by a batch that never finished.
    pub async fn reclaim_processing(&self) -> Result<u64, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE pending_diff_resolutions
            SET status = 'pending', batch_id = NULL
            WHERE status = 'processing'
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// A failed diff can be retried in a later batch.
    pub async fn requeue(&self, id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query(
            r#"
            UPDATE pending_diff_resolutions
            SET status = 'pending', batch_id = NULL
            WHERE id = ? AND status = 'failed'
            "#,
        )
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::DiffNotFound(id));
        }

        Ok(())
    }

    pub async fn list(
        &self,
        status: Option<DiffStatus>,
        limit: i64,
    ) -> Result<Vec<PendingDiffResolution>, DbError> {
        let rows: Vec<DiffRow> = match status {
            Some(status) => {
                sqlx::query_as(&format!(
                    r#"
                    SELECT {DIFF_COLUMNS} FROM pending_diff_resolutions
                    WHERE status = ?
                    ORDER BY created_at ASC, rowid ASC
                    LIMIT ?
                    "#
                ))
                .bind(status.as_str())
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(&format!(
                    r#"
                    SELECT {DIFF_COLUMNS} FROM pending_diff_resolutions
                    ORDER BY created_at ASC, rowid ASC
                    LIMIT ?
                    "#
                ))
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(|r| r.into_domain()).collect())
    }
}

#[derive(Clone)]
pub struct MergeResolutionRepository {
    pool: SqlitePool,
}

impl MergeResolutionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        resolution: &MergeConflictResolution,
    ) -> Result<MergeConflictResolution, DbError> {
        let row = MergeConflictResolutionRow::from(resolution);

        sqlx::query(
            r#"
            INSERT INTO merge_conflict_resolutions (id, diff_id, file_path, outcome, resolver_agent_id, reasoning, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.diff_id)
        .bind(&row.file_path)
        .bind(&row.outcome)
        .bind(&row.resolver_agent_id)
        .bind(&row.reasoning)
        .bind(row.created_at)
        .execute(&self.pool)
        .await?;

        Ok(resolution.clone())
    }

    pub async fn find_by_diff(
        &self,
        diff_id: Uuid,
    ) -> Result<Vec<MergeConflictResolution>, DbError> {
        let rows: Vec<MergeConflictResolutionRow> = sqlx::query_as(
            r#"
            SELECT id, diff_id, file_path, outcome, resolver_agent_id, reasoning, created_at
            FROM merge_conflict_resolutions
            WHERE diff_id = ?
            ORDER BY created_at ASC
            "#,
        )
        .bind(diff_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.into_domain()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};
    use swarm_core::QueueDiffRequest;

    async fn setup_test_db() -> SqlitePool {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    fn new_diff(path: &str) -> PendingDiffResolution {
        PendingDiffResolution::new(QueueDiffRequest::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            path,
            "parent",
            "child",
        ))
    }

    #[tokio::test]
    async fn test_claim_respects_limit_and_order() {
        let pool = setup_test_db().await;
        let repo = DiffRepository::new(pool);

        let first = new_diff("a.rs");
        let second = new_diff("b.rs");
        let third = new_diff("c.rs");
        repo.create(&first).await.unwrap();
        repo.create(&second).await.unwrap();
        repo.create(&third).await.unwrap();

        let batch_id = Uuid::new_v4();
        let claimed = repo.claim_pending(batch_id, 2).await.unwrap();
        assert_eq!(claimed.len(), 2);
        assert_eq!(claimed[0].id, first.id);
        assert_eq!(claimed[1].id, second.id);
        assert!(claimed.iter().all(|d| d.batch_id == Some(batch_id)));

        // third is still pending, the claimed two are not re-claimable
        let rest = repo.claim_pending(Uuid::new_v4(), 10).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].id, third.id);
    }

    #[tokio::test]
    async fn test_mark_resolved_round_trip() {
        let pool = setup_test_db().await;
        let repo = DiffRepository::new(pool);

        let diff = new_diff("a.rs");
        repo.create(&diff).await.unwrap();

        let resolver = Uuid::new_v4();
        repo.mark_resolved(
            diff.id,
            ResolutionChoice::Merged,
            Some("merged content"),
            resolver,
            "combined both edits",
        )
        .await
        .unwrap();

        let found = repo.find_by_id(diff.id).await.unwrap().unwrap();
        assert_eq!(found.status, DiffStatus::Resolved);
        assert_eq!(found.resolution_choice, Some(ResolutionChoice::Merged));
        assert_eq!(found.effective_content(), Some("merged content"));
        assert_eq!(found.resolver_agent_id, Some(resolver));
        assert!(found.resolved_at.is_some());
    }

    #[tokio::test]
    async fn test_reclaim_returns_processing_to_pending() {
        let pool = setup_test_db().await;
        let repo = DiffRepository::new(pool);

        let stranded = new_diff("a.rs");
        let resolved = new_diff("b.rs");
        repo.create(&stranded).await.unwrap();
        repo.create(&resolved).await.unwrap();

        repo.claim_pending(Uuid::new_v4(), 10).await.unwrap();
        repo.mark_resolved(
            resolved.id,
            ResolutionChoice::Child,
            None,
            Uuid::new_v4(),
            "child preferred",
        )
        .await
        .unwrap();

        // The unresolved claim goes back to the queue; the resolved one stays.
        let reclaimed = repo.reclaim_processing().await.unwrap();
        assert_eq!(reclaimed, 1);

        let found = repo.find_by_id(stranded.id).await.unwrap().unwrap();
        assert_eq!(found.status, DiffStatus::Pending);
        assert!(found.batch_id.is_none());

        let found = repo.find_by_id(resolved.id).await.unwrap().unwrap();
        assert_eq!(found.status, DiffStatus::Resolved);
    }

    #[tokio::test]
    async fn test_failed_then_requeued() {
        let pool = setup_test_db().await;
        let repo = DiffRepository::new(pool);

        let diff = new_diff("a.rs");
        repo.create(&diff).await.unwrap();
        repo.mark_failed(diff.id, Uuid::new_v4(), "arbitration unreachable")
            .await
            .unwrap();

        let found = repo.find_by_id(diff.id).await.unwrap().unwrap();
        assert_eq!(found.status, DiffStatus::Failed);

        repo.requeue(diff.id).await.unwrap();
        let found = repo.find_by_id(diff.id).await.unwrap().unwrap();
        assert_eq!(found.status, DiffStatus::Pending);
        assert!(found.batch_id.is_none());
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let pool = setup_test_db().await;
        let repo = DiffRepository::new(pool.clone());

        repo.create(&new_diff("a.rs")).await.unwrap();
        let resolved = new_diff("b.rs");
        repo.create(&resolved).await.unwrap();
        repo.mark_resolved(
            resolved.id,
            ResolutionChoice::Child,
            None,
            Uuid::new_v4(),
            "child preferred",
        )
        .await
        .unwrap();

        let pending = repo.list(Some(DiffStatus::Pending), 100).await.unwrap();
        assert_eq!(pending.len(), 1);

        let all = repo.list(None, 100).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_audit_rows() {
        let pool = setup_test_db().await;
        let audit = MergeResolutionRepository::new(pool);
        let diff_id = Uuid::new_v4();

        audit
            .create(&MergeConflictResolution::new(
                diff_id,
                "a.rs",
                ResolutionChoice::Merged,
                Uuid::new_v4(),
                "combined",
            ))
            .await
            .unwrap();

        let rows = audit.find_by_diff(diff_id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].outcome, "parent");
    }
}
