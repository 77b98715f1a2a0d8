use events::{Event, EventBus};
use serde::{Deserialize, Serialize};
use swarm_core::{Phase, PhaseExecutionStatus, TaskStatus, Workflow, WorkflowDefinition};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{OrchestratorError, Result};
use crate::store::Store;

/// Owns workflow and phase bookkeeping: initialization with the
/// single-active-workflow reuse policy, phase-completion detection, and
/// advisory phase progression.
pub struct WorkflowManager {
    store: Store,
    event_bus: EventBus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseStatusReport {
    pub phase_id: Uuid,
    pub phase_order: i64,
    pub name: String,
    pub execution_status: PhaseExecutionStatus,
    pub total_tasks: i64,
    pub done_tasks: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStatusReport {
    pub workflow: Workflow,
    pub phases: Vec<PhaseStatusReport>,
}

impl WorkflowManager {
    pub fn new(store: Store, event_bus: EventBus) -> Self {
        Self { store, event_bus }
    }

    /// Creates the workflow with its phases, or reuses the existing
    /// active/paused one. Reuse updates name, definition reference and
    /// each phase's validation config in place (matched by order) so a
    /// process restart never duplicates a workflow or loses task history.
    pub async fn initialize_workflow(&self, definition: &WorkflowDefinition) -> Result<Uuid> {
        if let Some(mut existing) = self.store.workflows.find_open().await? {
            info!(workflow_id = %existing.id, "Reusing existing workflow");

            existing.name = definition.name.clone();
            existing.definition_ref = definition.definition_ref.clone();
            self.store.workflows.update(&existing).await?;

            for phase_def in &definition.phases {
                if let Some(phase) = self
                    .store
                    .phases
                    .find_by_order(existing.id, phase_def.order)
                    .await?
                {
                    self.store
                        .phases
                        .update_validation(phase.id, phase_def.validation.as_ref())
                        .await?;
                }
            }

            if let Some(board) = &definition.board {
                self.store.boards.upsert(existing.id, board).await?;
            }

            self.event_bus.publish(Event::WorkflowInitialized {
                workflow_id: existing.id,
                reused: true,
            });

            return Ok(existing.id);
        }

        let workflow = Workflow::new(&definition.name, &definition.definition_ref);
        self.store.workflows.create(&workflow).await?;

        for phase_def in &definition.phases {
            let mut phase = Phase::new(workflow.id, phase_def.order, &phase_def.name)
                .with_description(&phase_def.description)
                .with_done_definitions(phase_def.done_definitions.clone());
            if let Some(validation) = &phase_def.validation {
                phase = phase.with_validation(validation.clone());
            }
            self.store.phases.create(&phase).await?;
        }

        if let Some(board) = &definition.board {
            self.store.boards.upsert(workflow.id, board).await?;
        }

        info!(
            workflow_id = %workflow.id,
            phases = definition.phases.len(),
            "Workflow initialized"
        );

        self.event_bus.publish(Event::WorkflowInitialized {
            workflow_id: workflow.id,
            reused: false,
        });

        Ok(workflow.id)
    }

    /// A phase is complete when it has at least one task and every task
    /// under it is done. A phase with zero tasks is never complete.
    pub async fn check_phase_completion(&self, phase_id: Uuid) -> Result<bool> {
        if self.store.phases.find_by_id(phase_id).await?.is_none() {
            return Err(OrchestratorError::PhaseNotFound(phase_id));
        }

        let (total, done) = self.store.tasks.phase_progress(phase_id).await?;
        Ok(total > 0 && total == done)
    }

    /// Marks the phase executed when complete and nudges the next phase
    /// to in_progress if it has no tasks yet. Advisory bookkeeping only;
    /// whoever populates the next phase creates its tasks.
    pub async fn advance_on_completion(&self, phase_id: Uuid) -> Result<bool> {
        if !self.check_phase_completion(phase_id).await? {
            return Ok(false);
        }

        let phase = self
            .store
            .phases
            .find_by_id(phase_id)
            .await?
            .ok_or(OrchestratorError::PhaseNotFound(phase_id))?;

        self.store
            .phases
            .update_execution_status(phase_id, PhaseExecutionStatus::Completed)
            .await?;

        info!(phase_id = %phase_id, phase = %phase.name, "Phase completed");
        self.event_bus.publish(Event::PhaseCompleted {
            phase_id,
            workflow_id: phase.workflow_id,
        });

        if let Some(next) = self
            .store
            .phases
            .find_next_after(phase.workflow_id, phase.phase_order)
            .await?
        {
            let (total, _) = self.store.tasks.phase_progress(next.id).await?;
            if total == 0 && next.execution_status == PhaseExecutionStatus::Pending {
                debug!(phase_id = %next.id, phase = %next.name, "Marking next phase in progress");
                self.store
                    .phases
                    .update_execution_status(next.id, PhaseExecutionStatus::InProgress)
                    .await?;
            }
        }

        Ok(true)
    }

    pub async fn get_workflow_status(&self, workflow_id: Uuid) -> Result<WorkflowStatusReport> {
        let workflow = self
            .store
            .workflows
            .find_by_id(workflow_id)
            .await?
            .ok_or(OrchestratorError::WorkflowNotFound(workflow_id))?;

        let mut phases = Vec::new();
        for phase in self.store.phases.find_by_workflow(workflow_id).await? {
            let (total_tasks, done_tasks) = self.store.tasks.phase_progress(phase.id).await?;
            phases.push(PhaseStatusReport {
                phase_id: phase.id,
                phase_order: phase.phase_order,
                name: phase.name,
                execution_status: phase.execution_status,
                total_tasks,
                done_tasks,
            });
        }

        Ok(WorkflowStatusReport { workflow, phases })
    }

    /// Count of tasks still failing under a phase, for status reporting.
    pub async fn failed_task_count(&self, phase_id: Uuid) -> Result<i64> {
        Ok(self
            .store
            .tasks
            .count_by_phase_and_status(phase_id, TaskStatus::Failed)
            .await?)
    }
}
