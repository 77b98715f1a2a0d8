use std::sync::Arc;

use events::{Event, EventBus};
use serde::{Deserialize, Serialize};
use swarm_core::{
    DiffStatus, MergeConflictResolution, PendingDiffResolution, QueueDiffRequest, ResolutionChoice,
};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::arbitration::{ArbitrationRequest, ArbitrationResponse, Arbitrator};
use crate::error::{OrchestratorError, Result};
use crate::store::Store;

/// Queues file-level conflicts produced by concurrent workers and
/// resolves them in mutually exclusive batches through the arbitration
/// service. Constructed once and shared; the batch lock is an owned
/// field, not a global.
pub struct ConflictResolutionEngine {
    store: Store,
    arbitrator: Arc<dyn Arbitrator>,
    event_bus: EventBus,
    /// Held for the entire duration of a batch: selection, every
    /// arbitration call, and persistence. Guarantees at most one
    /// concurrent claim on any pending diff.
    batch_lock: Mutex<()>,
}

/// Per-diff result of a batch, in claim order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffOutcome {
    pub diff_id: Uuid,
    pub file_path: String,
    pub status: DiffStatus,
    pub choice: Option<ResolutionChoice>,
}

impl ConflictResolutionEngine {
    pub fn new(store: Store, arbitrator: Arc<dyn Arbitrator>, event_bus: EventBus) -> Self {
        Self {
            store,
            arbitrator,
            event_bus,
            batch_lock: Mutex::new(()),
        }
    }

    /// Queues one conflict. Diffs are independent even when they name the
    /// same file; no deduplication happens here.
    pub async fn queue_diff(&self, request: QueueDiffRequest) -> Result<Uuid> {
        let diff = PendingDiffResolution::new(request);
        let diff = self.store.diffs.create(&diff).await?;

        info!(diff_id = %diff.id, file_path = %diff.file_path, "Diff queued");
        self.event_bus.publish(Event::DiffQueued {
            diff_id: diff.id,
            file_path: diff.file_path.clone(),
        });

        Ok(diff.id)
    }

    /// Claims and resolves up to `batch_size` oldest pending diffs under
    /// the engine-wide lock. Blocking: callers wait batch_size times the
    /// arbitration latency in the worst case, and a hung arbitration
    /// call holds the lock until the transport gives up. Invoke from a
    /// worker that can afford to wait.
    pub async fn resolve_batch(
        &self,
        resolver_agent_id: Uuid,
        batch_size: i64,
    ) -> Result<Vec<DiffOutcome>> {
        let _guard = self.batch_lock.lock().await;

        // No batch is running while we hold the lock, so any diff still
        // stamped processing was stranded by an interrupted batch. Put
        // them back in the queue before claiming.
        let reclaimed = self.store.diffs.reclaim_processing().await?;
        if reclaimed > 0 {
            warn!(reclaimed, "Requeued diffs stranded by an interrupted batch");
        }

        let batch_id = Uuid::new_v4();
        let claimed = self.store.diffs.claim_pending(batch_id, batch_size).await?;

        if claimed.is_empty() {
            return Ok(Vec::new());
        }

        info!(
            batch_id = %batch_id,
            size = claimed.len(),
            resolver_id = %resolver_agent_id,
            "Resolving diff batch"
        );

        let mut outcomes = Vec::with_capacity(claimed.len());
        let mut resolved = 0usize;
        let mut failed = 0usize;

        for diff in claimed {
            let request = ArbitrationRequest {
                file_path: diff.file_path.clone(),
                parent_content: diff.parent_content.clone(),
                child_content: diff.child_content.clone(),
                parent_ts: diff.parent_ts,
                child_ts: diff.child_ts,
                diff_context: diff.diff_context.clone(),
            };

            let outcome = match self.arbitrator.arbitrate(&request).await {
                Ok(response) => {
                    let (choice, content, reasoning) = interpret_response(response);
                    self.persist_resolution(&diff, choice, content.as_deref(), resolver_agent_id, &reasoning)
                        .await?;
                    resolved += 1;
                    DiffOutcome {
                        diff_id: diff.id,
                        file_path: diff.file_path.clone(),
                        status: DiffStatus::Resolved,
                        choice: Some(choice),
                    }
                }
                // Transport failure: the call itself raised before any
                // verdict existed. The diff fails outright and can be
                // retried in a later batch.
                Err(err) => {
                    warn!(
                        diff_id = %diff.id,
                        error = %err,
                        "Arbitration call failed, marking diff failed"
                    );
                    self.store
                        .diffs
                        .mark_failed(
                            diff.id,
                            resolver_agent_id,
                            &format!("arbitration call failed: {err}"),
                        )
                        .await?;
                    failed += 1;
                    DiffOutcome {
                        diff_id: diff.id,
                        file_path: diff.file_path.clone(),
                        status: DiffStatus::Failed,
                        choice: None,
                    }
                }
            };

            outcomes.push(outcome);
        }

        self.event_bus.publish(Event::DiffBatchResolved {
            batch_id,
            resolved,
            failed,
        });

        Ok(outcomes)
    }

    async fn persist_resolution(
        &self,
        diff: &PendingDiffResolution,
        choice: ResolutionChoice,
        content: Option<&str>,
        resolver_agent_id: Uuid,
        reasoning: &str,
    ) -> Result<()> {
        self.store
            .diffs
            .mark_resolved(diff.id, choice, content, resolver_agent_id, reasoning)
            .await?;

        self.store
            .merge_resolutions
            .create(&MergeConflictResolution::new(
                diff.id,
                &diff.file_path,
                choice,
                resolver_agent_id,
                reasoning,
            ))
            .await?;

        Ok(())
    }

    /// The final content the merge step should write for a resolved diff.
    pub async fn get_resolved_content(&self, diff_id: Uuid) -> Result<(ResolutionChoice, String)> {
        let diff = self
            .store
            .diffs
            .find_by_id(diff_id)
            .await?
            .ok_or(OrchestratorError::DiffNotFound(diff_id))?;

        if diff.status != DiffStatus::Resolved {
            return Err(OrchestratorError::DiffNotResolved(diff_id));
        }

        let choice = diff
            .resolution_choice
            .ok_or(OrchestratorError::DiffNotResolved(diff_id))?;
        let content = diff
            .effective_content()
            .ok_or(OrchestratorError::DiffNotResolved(diff_id))?
            .to_string();

        Ok((choice, content))
    }

    pub async fn get_diff_status(&self, diff_id: Uuid) -> Result<DiffStatus> {
        let diff = self
            .store
            .diffs
            .find_by_id(diff_id)
            .await?
            .ok_or(OrchestratorError::DiffNotFound(diff_id))?;

        Ok(diff.status)
    }

    pub async fn list_diffs(
        &self,
        status: Option<DiffStatus>,
        limit: i64,
    ) -> Result<Vec<PendingDiffResolution>> {
        Ok(self.store.diffs.list(status, limit).await?)
    }

    /// Puts a failed diff back in the queue for a later batch.
    pub async fn requeue_failed(&self, diff_id: Uuid) -> Result<()> {
        Ok(self.store.diffs.requeue(diff_id).await?)
    }
}

/// Turns a raw arbitration response into a resolution. Malformed
/// responses (unknown choice, or "merged" without content) degrade to
/// keeping the worker's own changes so a merge is never blocked by a
/// misbehaving arbitration service.
fn interpret_response(
    response: ArbitrationResponse,
) -> (ResolutionChoice, Option<String>, String) {
    match ResolutionChoice::parse(&response.choice) {
        Some(ResolutionChoice::Merged) => match response.content {
            Some(content) => (
                ResolutionChoice::Merged,
                Some(content),
                response.reasoning,
            ),
            None => {
                warn!("Arbitration chose merged without content, falling back to child");
                (
                    ResolutionChoice::Child,
                    None,
                    format!(
                        "fallback to child: merged chosen without content ({})",
                        response.reasoning
                    ),
                )
            }
        },
        Some(choice) => (choice, None, response.reasoning),
        None => {
            warn!(choice = %response.choice, "Unknown arbitration choice, falling back to child");
            (
                ResolutionChoice::Child,
                None,
                format!("fallback to child: unknown choice {:?}", response.choice),
            )
        }
    }
}
