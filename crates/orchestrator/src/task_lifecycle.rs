use events::{Event, EventBus};
use swarm_core::{
    Agent, AgentStatus, CreateTaskRequest, Phase, PhaseRef, Task, TaskStatus, ValidationEvidence,
    ValidationReview,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{OrchestratorError, Result};
use crate::state_machine::TaskStateMachine;
use crate::store::Store;

/// Drives tasks through creation, assignment, completion and the
/// validation feedback loop. Stateless beyond the store; every operation
/// re-reads current state and rejects stale transitions.
pub struct TaskLifecycle {
    store: Store,
    event_bus: EventBus,
}

impl TaskLifecycle {
    pub fn new(store: Store, event_bus: EventBus) -> Self {
        Self { store, event_bus }
    }

    /// Creates a task under the resolved phase. Whether the task will
    /// need validation is decided here, once, from the phase's config;
    /// later phase edits do not affect the task.
    pub async fn create_task(&self, request: CreateTaskRequest) -> Result<Task> {
        let phase = self.resolve_phase(&request).await?;

        let mut task = Task::new(&request.description, &request.done_definition)
            .with_priority(request.priority);
        if let Some(ticket_id) = request.ticket_id {
            task = task.with_ticket(ticket_id);
        }
        task = task.with_phase(phase.id, phase.validation_required());

        let task = self.store.tasks.create(&task).await?;

        info!(
            task_id = %task.id,
            phase_id = %phase.id,
            validation_enabled = task.validation_enabled,
            "Task created"
        );
        self.event_bus.publish(Event::TaskCreated {
            task_id: task.id,
            phase_id: task.phase_id,
        });

        Ok(task)
    }

    async fn resolve_phase(&self, request: &CreateTaskRequest) -> Result<Phase> {
        // Explicit override wins.
        if let Some(phase_ref) = request.phase {
            return match phase_ref {
                PhaseRef::Id(id) => self
                    .store
                    .phases
                    .find_by_id(id)
                    .await?
                    .ok_or_else(|| OrchestratorError::InvalidPhase(format!("id {id}"))),
                PhaseRef::Order(order) => {
                    let workflow = self.active_workflow().await?;
                    self.store
                        .phases
                        .find_by_order(workflow.id, order)
                        .await?
                        .ok_or_else(|| OrchestratorError::InvalidPhase(format!("order {order}")))
                }
            };
        }

        // Fall back to the requester's current phase.
        if let Some(agent_id) = request.requester_agent_id {
            if let Some(agent) = self.store.agents.find_by_id(agent_id).await? {
                if let Some(task_id) = agent.current_task_id {
                    if let Some(task) = self.store.tasks.find_by_id(task_id).await? {
                        if let Some(phase_id) = task.phase_id {
                            if let Some(phase) = self.store.phases.find_by_id(phase_id).await? {
                                return Ok(phase);
                            }
                        }
                    }
                }
            }
        }

        // Last resort: the first non-completed phase of the active workflow.
        let workflow = self.active_workflow().await?;
        self.store
            .phases
            .find_first_open(workflow.id)
            .await?
            .ok_or_else(|| {
                OrchestratorError::InvalidPhase("no open phase in active workflow".into())
            })
    }

    async fn active_workflow(&self) -> Result<swarm_core::Workflow> {
        self.store
            .workflows
            .find_open()
            .await?
            .ok_or(OrchestratorError::NoActiveWorkflow)
    }

    /// Hands the task to a worker: pending → assigned → in_progress.
    pub async fn assign_task(&self, task_id: Uuid, agent_id: Uuid) -> Result<Task> {
        let mut task = self.find_task(task_id).await?;
        let mut agent = self.find_agent(agent_id).await?;

        TaskStateMachine::validate_transition(&task.status, &TaskStatus::Assigned)?;

        task.status = TaskStatus::Assigned;
        task.assigned_agent_id = Some(agent_id);
        TaskStateMachine::validate_transition(&task.status, &TaskStatus::InProgress)?;
        task.status = TaskStatus::InProgress;
        let task = self.store.tasks.update(&task).await?;

        agent.status = AgentStatus::Working;
        agent.current_task_id = Some(task_id);
        self.store.agents.update(&agent).await?;

        info!(task_id = %task_id, agent_id = %agent_id, "Task assigned");
        self.event_bus
            .publish(Event::TaskAssigned { task_id, agent_id });

        Ok(task)
    }

    /// The worker reports its work finished. Without validation the task
    /// completes immediately; with validation it enters review and a
    /// validator must be produced by the lifecycle manager.
    pub async fn report_done(&self, task_id: Uuid, summary: impl Into<String>) -> Result<Task> {
        let mut task = self.find_task(task_id).await?;

        if !matches!(
            task.status,
            TaskStatus::InProgress | TaskStatus::NeedsWork
        ) {
            return Err(OrchestratorError::InvalidTaskState {
                task_id,
                status: task.status.as_str().to_string(),
                expected: "in_progress or needs_work".to_string(),
            });
        }

        task.completion_summary = Some(summary.into());

        if !task.validation_enabled {
            task.status = TaskStatus::Done;
            let task = self.store.tasks.update(&task).await?;

            info!(task_id = %task_id, "Task done (no validation required)");
            self.event_bus.publish(Event::TaskCompleted { task_id });
            self.complete_agent(task.assigned_agent_id).await?;

            return Ok(task);
        }

        task.status = TaskStatus::UnderReview;
        task.validation_iteration += 1;
        let task = self.store.tasks.update(&task).await?;

        info!(
            task_id = %task_id,
            iteration = task.validation_iteration,
            "Task under review, validator requested"
        );
        self.event_bus.publish(Event::ValidationRequested {
            task_id,
            iteration: task.validation_iteration,
        });

        Ok(task)
    }

    /// The spawned validator is active: the review is now in progress and
    /// the owning worker must be kept alive between iterations.
    pub async fn begin_validation(&self, task_id: Uuid, validator_agent_id: Uuid) -> Result<Task> {
        let mut task = self.find_task(task_id).await?;

        if task.status != TaskStatus::UnderReview {
            return Err(OrchestratorError::InvalidTaskState {
                task_id,
                status: task.status.as_str().to_string(),
                expected: TaskStatus::UnderReview.as_str().to_string(),
            });
        }

        task.status = TaskStatus::ValidationInProgress;
        let task = self.store.tasks.update(&task).await?;

        if let Some(mut validator) = self.store.agents.find_by_id(validator_agent_id).await? {
            validator.status = AgentStatus::Validating;
            validator.current_task_id = Some(task_id);
            self.store.agents.update(&validator).await?;
        }

        self.set_keep_alive(task.assigned_agent_id, true).await?;

        debug!(task_id = %task_id, validator_id = %validator_agent_id, "Validation in progress");

        Ok(task)
    }

    /// Records one review attempt. Pass finishes the task; fail sends it
    /// back to the worker with feedback, and the cycle may repeat without
    /// any iteration cap.
    pub async fn submit_validation_review(
        &self,
        task_id: Uuid,
        validator_agent_id: Uuid,
        passed: bool,
        feedback: impl Into<String>,
        evidence: Vec<ValidationEvidence>,
    ) -> Result<Task> {
        let mut task = self.find_task(task_id).await?;

        if task.status != TaskStatus::ValidationInProgress {
            return Err(OrchestratorError::InvalidTaskState {
                task_id,
                status: task.status.as_str().to_string(),
                expected: TaskStatus::ValidationInProgress.as_str().to_string(),
            });
        }

        let feedback = feedback.into();
        let review = ValidationReview::new(
            task_id,
            validator_agent_id,
            task.validation_iteration,
            passed,
            feedback.clone(),
            evidence,
        );
        self.store.reviews.create(&review).await?;

        if passed {
            task.status = TaskStatus::Done;
            task.review_done = true;
            let task = self.store.tasks.update(&task).await?;

            info!(
                task_id = %task_id,
                iteration = task.validation_iteration,
                "Validation passed, task done"
            );
            self.event_bus.publish(Event::ValidationPassed {
                task_id,
                iteration: task.validation_iteration,
            });
            self.event_bus.publish(Event::TaskCompleted { task_id });

            self.set_keep_alive(task.assigned_agent_id, false).await?;
            self.complete_agent(task.assigned_agent_id).await?;

            return Ok(task);
        }

        task.status = TaskStatus::NeedsWork;
        task.last_validation_feedback = Some(feedback.clone());
        let task = self.store.tasks.update(&task).await?;

        warn!(
            task_id = %task_id,
            iteration = task.validation_iteration,
            "Validation failed, task needs work"
        );
        self.event_bus.publish(Event::ValidationFailed {
            task_id,
            iteration: task.validation_iteration,
            feedback,
        });

        Ok(task)
    }

    /// Marks a task failed (worker crashed, unrecoverable error).
    pub async fn fail_task(&self, task_id: Uuid, reason: impl Into<String>) -> Result<Task> {
        let mut task = self.find_task(task_id).await?;

        TaskStateMachine::validate_transition(&task.status, &TaskStatus::Failed)?;

        let reason = reason.into();
        task.status = TaskStatus::Failed;
        let task = self.store.tasks.update(&task).await?;

        warn!(task_id = %task_id, reason = %reason, "Task failed");
        self.event_bus.publish(Event::TaskFailed { task_id, reason });

        self.set_keep_alive(task.assigned_agent_id, false).await?;

        Ok(task)
    }

    async fn set_keep_alive(&self, agent_id: Option<Uuid>, kept_alive: bool) -> Result<()> {
        let Some(agent_id) = agent_id else {
            return Ok(());
        };
        let Some(mut agent) = self.store.agents.find_by_id(agent_id).await? else {
            return Ok(());
        };

        if agent.kept_alive_for_validation != kept_alive {
            agent.kept_alive_for_validation = kept_alive;
            self.store.agents.update(&agent).await?;
            self.event_bus
                .publish(Event::AgentKeepAliveChanged { agent_id, kept_alive });
        }

        Ok(())
    }

    async fn complete_agent(&self, agent_id: Option<Uuid>) -> Result<()> {
        let Some(agent_id) = agent_id else {
            return Ok(());
        };
        let Some(mut agent) = self.store.agents.find_by_id(agent_id).await? else {
            return Ok(());
        };

        agent.status = AgentStatus::Completed;
        agent.current_task_id = None;
        self.store.agents.update(&agent).await?;
        self.event_bus.publish(Event::AgentCompleted { agent_id });

        Ok(())
    }

    pub async fn register_agent(&self, name: impl Into<String>) -> Result<Agent> {
        let agent = Agent::new(name);
        Ok(self.store.agents.create(&agent).await?)
    }

    pub async fn get_task(&self, task_id: Uuid) -> Result<Task> {
        self.find_task(task_id).await
    }

    pub async fn reviews_for_task(&self, task_id: Uuid) -> Result<Vec<ValidationReview>> {
        Ok(self.store.reviews.find_by_task(task_id).await?)
    }

    pub async fn tasks_for_phase(&self, phase_id: Uuid) -> Result<Vec<Task>> {
        Ok(self.store.tasks.find_by_phase(phase_id).await?)
    }

    async fn find_task(&self, task_id: Uuid) -> Result<Task> {
        self.store
            .tasks
            .find_by_id(task_id)
            .await?
            .ok_or(OrchestratorError::TaskNotFound(task_id))
    }

    async fn find_agent(&self, agent_id: Uuid) -> Result<Agent> {
        self.store
            .agents
            .find_by_id(agent_id)
            .await?
            .ok_or(OrchestratorError::AgentNotFound(agent_id))
    }
}
