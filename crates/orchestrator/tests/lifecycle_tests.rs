use db::{create_pool, run_migrations};
use events::EventBus;
use orchestrator::{OrchestratorError, Store, TaskLifecycle, WorkflowManager};
use swarm_core::{
    CreateTaskRequest, PhaseDefinition, PhaseExecutionStatus, PhaseRef, TaskStatus,
    ValidationConfig, ValidationEvidence, WorkflowDefinition,
};
use uuid::Uuid;

async fn setup() -> (Store, WorkflowManager, TaskLifecycle) {
    let pool = create_pool("sqlite::memory:").await.unwrap();
    run_migrations(&pool).await.unwrap();

    let store = Store::new(pool);
    let bus = EventBus::new();
    let workflows = WorkflowManager::new(store.clone(), bus.clone());
    let lifecycle = TaskLifecycle::new(store.clone(), bus);

    (store, workflows, lifecycle)
}

fn phase_def(order: i64, name: &str, validation: Option<ValidationConfig>) -> PhaseDefinition {
    PhaseDefinition {
        order,
        name: name.to_string(),
        description: format!("{name} phase"),
        done_definitions: vec![format!("{name} criteria met")],
        validation,
    }
}

fn single_phase_definition(validation: Option<ValidationConfig>) -> WorkflowDefinition {
    WorkflowDefinition {
        name: "test-workflow".to_string(),
        definition_ref: "workflows/test.yaml".to_string(),
        phases: vec![phase_def(1, "build", validation)],
        board: None,
    }
}

#[tokio::test]
async fn scenario_a_no_validation_completes_directly() {
    let (_, workflows, lifecycle) = setup().await;

    workflows
        .initialize_workflow(&single_phase_definition(None))
        .await
        .unwrap();

    let agent = lifecycle.register_agent("worker-1").await.unwrap();
    let task = lifecycle
        .create_task(CreateTaskRequest::new("Implement parser", "All fixtures pass"))
        .await
        .unwrap();
    assert!(!task.validation_enabled);

    lifecycle.assign_task(task.id, agent.id).await.unwrap();
    let task = lifecycle.report_done(task.id, "parser implemented").await.unwrap();

    assert_eq!(task.status, TaskStatus::Done);
    assert_eq!(task.validation_iteration, 0);
    assert!(lifecycle.reviews_for_task(task.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn scenario_b_validation_feedback_loop() {
    let (_, workflows, lifecycle) = setup().await;

    workflows
        .initialize_workflow(&single_phase_definition(Some(ValidationConfig::new(vec![
            "tests added".to_string(),
        ]))))
        .await
        .unwrap();

    let worker = lifecycle.register_agent("worker-1").await.unwrap();
    let validator = lifecycle.register_agent("validator-1").await.unwrap();

    let task = lifecycle
        .create_task(CreateTaskRequest::new("Implement codec", "Round-trips all fixtures"))
        .await
        .unwrap();
    assert!(task.validation_enabled);

    lifecycle.assign_task(task.id, worker.id).await.unwrap();

    // First attempt: rejected with feedback.
    let task = lifecycle.report_done(task.id, "codec done").await.unwrap();
    assert_eq!(task.status, TaskStatus::UnderReview);
    assert_eq!(task.validation_iteration, 1);

    let task = lifecycle.begin_validation(task.id, validator.id).await.unwrap();
    assert_eq!(task.status, TaskStatus::ValidationInProgress);

    let task = lifecycle
        .submit_validation_review(task.id, validator.id, false, "missing tests", vec![])
        .await
        .unwrap();
    assert_eq!(task.status, TaskStatus::NeedsWork);
    assert_eq!(task.last_validation_feedback.as_deref(), Some("missing tests"));

    // Second attempt: passes.
    let task = lifecycle.report_done(task.id, "tests added").await.unwrap();
    assert_eq!(task.validation_iteration, 2);

    lifecycle.begin_validation(task.id, validator.id).await.unwrap();
    let task = lifecycle
        .submit_validation_review(
            task.id,
            validator.id,
            true,
            "all good",
            vec![ValidationEvidence {
                kind: "test_run".to_string(),
                detail: "12 passed".to_string(),
            }],
        )
        .await
        .unwrap();

    assert_eq!(task.status, TaskStatus::Done);
    assert!(task.review_done);
}

#[tokio::test]
async fn validation_reviews_are_monotonic_per_iteration() {
    let (_, workflows, lifecycle) = setup().await;

    workflows
        .initialize_workflow(&single_phase_definition(Some(ValidationConfig::new(vec![]))))
        .await
        .unwrap();

    let worker = lifecycle.register_agent("worker").await.unwrap();
    let validator = lifecycle.register_agent("validator").await.unwrap();
    let task = lifecycle
        .create_task(CreateTaskRequest::new("t", "d"))
        .await
        .unwrap();
    lifecycle.assign_task(task.id, worker.id).await.unwrap();

    for (iteration, passed) in [(1, false), (2, false), (3, true)] {
        let task = lifecycle.report_done(task.id, "attempt").await.unwrap();
        assert_eq!(task.validation_iteration, iteration);
        lifecycle.begin_validation(task.id, validator.id).await.unwrap();
        lifecycle
            .submit_validation_review(task.id, validator.id, passed, "feedback", vec![])
            .await
            .unwrap();
    }

    let reviews = lifecycle.reviews_for_task(task.id).await.unwrap();
    let iterations: Vec<i64> = reviews.iter().map(|r| r.iteration_number).collect();
    assert_eq!(iterations, vec![1, 2, 3]);
    assert!(reviews.last().unwrap().validation_passed);
}

#[tokio::test]
async fn keep_alive_flag_follows_validation_loop() {
    let (store, workflows, lifecycle) = setup().await;

    workflows
        .initialize_workflow(&single_phase_definition(Some(ValidationConfig::new(vec![]))))
        .await
        .unwrap();

    let worker = lifecycle.register_agent("worker").await.unwrap();
    let validator = lifecycle.register_agent("validator").await.unwrap();
    let task = lifecycle
        .create_task(CreateTaskRequest::new("t", "d"))
        .await
        .unwrap();
    lifecycle.assign_task(task.id, worker.id).await.unwrap();
    lifecycle.report_done(task.id, "done").await.unwrap();

    lifecycle.begin_validation(task.id, validator.id).await.unwrap();
    let agent = store.agents.find_by_id(worker.id).await.unwrap().unwrap();
    assert!(agent.kept_alive_for_validation);

    lifecycle
        .submit_validation_review(task.id, validator.id, true, "ok", vec![])
        .await
        .unwrap();
    let agent = store.agents.find_by_id(worker.id).await.unwrap().unwrap();
    assert!(!agent.kept_alive_for_validation);
    assert_eq!(agent.status, swarm_core::AgentStatus::Completed);
}

#[tokio::test]
async fn validation_inheritance_is_fixed_at_creation() {
    let (store, workflows, lifecycle) = setup().await;

    let workflow_id = workflows
        .initialize_workflow(&single_phase_definition(Some(ValidationConfig::new(vec![]))))
        .await
        .unwrap();

    let task = lifecycle
        .create_task(CreateTaskRequest::new("t", "d"))
        .await
        .unwrap();
    assert!(task.validation_enabled);

    // Removing validation from the phase afterwards does not change the task.
    let phase = store
        .phases
        .find_first_open(workflow_id)
        .await
        .unwrap()
        .unwrap();
    store.phases.update_validation(phase.id, None).await.unwrap();

    let task = lifecycle.get_task(task.id).await.unwrap();
    assert!(task.validation_enabled);

    // New tasks pick up the edited config.
    let task = lifecycle
        .create_task(CreateTaskRequest::new("t2", "d"))
        .await
        .unwrap();
    assert!(!task.validation_enabled);
}

#[tokio::test]
async fn explicitly_disabled_validation_is_not_inherited() {
    let (_, workflows, lifecycle) = setup().await;

    workflows
        .initialize_workflow(&single_phase_definition(Some(ValidationConfig::disabled(
            vec!["kept for later".to_string()],
        ))))
        .await
        .unwrap();

    let task = lifecycle
        .create_task(CreateTaskRequest::new("t", "d"))
        .await
        .unwrap();
    assert!(!task.validation_enabled);
}

#[tokio::test]
async fn submit_review_rejected_outside_validation() {
    let (_, workflows, lifecycle) = setup().await;

    workflows
        .initialize_workflow(&single_phase_definition(Some(ValidationConfig::new(vec![]))))
        .await
        .unwrap();

    let worker = lifecycle.register_agent("worker").await.unwrap();
    let validator = lifecycle.register_agent("validator").await.unwrap();
    let task = lifecycle
        .create_task(CreateTaskRequest::new("t", "d"))
        .await
        .unwrap();
    lifecycle.assign_task(task.id, worker.id).await.unwrap();

    // Task is in_progress, not validation_in_progress.
    let result = lifecycle
        .submit_validation_review(task.id, validator.id, true, "ok", vec![])
        .await;
    assert!(matches!(
        result,
        Err(OrchestratorError::InvalidTaskState { .. })
    ));

    // Nothing was applied.
    let task = lifecycle.get_task(task.id).await.unwrap();
    assert_eq!(task.status, TaskStatus::InProgress);
    assert!(lifecycle.reviews_for_task(task.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn report_done_rejected_before_assignment() {
    let (_, workflows, lifecycle) = setup().await;

    workflows
        .initialize_workflow(&single_phase_definition(None))
        .await
        .unwrap();

    let task = lifecycle
        .create_task(CreateTaskRequest::new("t", "d"))
        .await
        .unwrap();

    let result = lifecycle.report_done(task.id, "done").await;
    assert!(matches!(
        result,
        Err(OrchestratorError::InvalidTaskState { .. })
    ));
}

#[tokio::test]
async fn workflow_init_is_idempotent() {
    let (store, workflows, _) = setup().await;

    let definition = WorkflowDefinition {
        name: "multi".to_string(),
        definition_ref: "workflows/multi.yaml".to_string(),
        phases: vec![
            phase_def(1, "plan", None),
            phase_def(2, "build", Some(ValidationConfig::new(vec![]))),
        ],
        board: None,
    };

    let first = workflows.initialize_workflow(&definition).await.unwrap();
    let second = workflows.initialize_workflow(&definition).await.unwrap();
    assert_eq!(first, second);

    let phases = store.phases.find_by_workflow(first).await.unwrap();
    assert_eq!(phases.len(), 2);
}

#[tokio::test]
async fn workflow_reinit_updates_definition_in_place() {
    let (store, workflows, _) = setup().await;

    let mut definition = WorkflowDefinition {
        name: "v1".to_string(),
        definition_ref: "workflows/v1.yaml".to_string(),
        phases: vec![phase_def(1, "build", None)],
        board: None,
    };
    let workflow_id = workflows.initialize_workflow(&definition).await.unwrap();

    definition.name = "v2".to_string();
    definition.definition_ref = "workflows/v2.yaml".to_string();
    definition.phases[0].validation = Some(ValidationConfig::new(vec!["lint".to_string()]));
    let reused = workflows.initialize_workflow(&definition).await.unwrap();
    assert_eq!(reused, workflow_id);

    let workflow = store.workflows.find_by_id(workflow_id).await.unwrap().unwrap();
    assert_eq!(workflow.name, "v2");
    assert_eq!(workflow.definition_ref, "workflows/v2.yaml");

    let phases = store.phases.find_by_workflow(workflow_id).await.unwrap();
    assert_eq!(phases.len(), 1);
    assert!(phases[0].validation_required());
}

#[tokio::test]
async fn phase_completion_requires_at_least_one_done_task() {
    let (store, workflows, lifecycle) = setup().await;

    let workflow_id = workflows
        .initialize_workflow(&WorkflowDefinition {
            name: "w".to_string(),
            definition_ref: "w.yaml".to_string(),
            phases: vec![phase_def(1, "build", None), phase_def(2, "verify", None)],
            board: None,
        })
        .await
        .unwrap();

    let phase = store
        .phases
        .find_by_order(workflow_id, 1)
        .await
        .unwrap()
        .unwrap();

    // Empty phase is never complete.
    assert!(!workflows.check_phase_completion(phase.id).await.unwrap());
    assert!(!workflows.advance_on_completion(phase.id).await.unwrap());

    let agent = lifecycle.register_agent("worker").await.unwrap();
    let task = lifecycle
        .create_task(CreateTaskRequest::new("t", "d").with_phase(PhaseRef::Order(1)))
        .await
        .unwrap();
    lifecycle.assign_task(task.id, agent.id).await.unwrap();

    // Open task blocks completion.
    assert!(!workflows.check_phase_completion(phase.id).await.unwrap());

    lifecycle.report_done(task.id, "done").await.unwrap();
    assert!(workflows.check_phase_completion(phase.id).await.unwrap());
}

#[tokio::test]
async fn advance_marks_next_empty_phase_in_progress() {
    let (store, workflows, lifecycle) = setup().await;

    let workflow_id = workflows
        .initialize_workflow(&WorkflowDefinition {
            name: "w".to_string(),
            definition_ref: "w.yaml".to_string(),
            // Orders with a gap.
            phases: vec![phase_def(1, "build", None), phase_def(5, "verify", None)],
            board: None,
        })
        .await
        .unwrap();

    let first = store
        .phases
        .find_by_order(workflow_id, 1)
        .await
        .unwrap()
        .unwrap();

    let agent = lifecycle.register_agent("worker").await.unwrap();
    let task = lifecycle
        .create_task(CreateTaskRequest::new("t", "d").with_phase(PhaseRef::Id(first.id)))
        .await
        .unwrap();
    lifecycle.assign_task(task.id, agent.id).await.unwrap();
    lifecycle.report_done(task.id, "done").await.unwrap();

    assert!(workflows.advance_on_completion(first.id).await.unwrap());

    let first = store.phases.find_by_id(first.id).await.unwrap().unwrap();
    assert_eq!(first.execution_status, PhaseExecutionStatus::Completed);

    let next = store
        .phases
        .find_by_order(workflow_id, 5)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(next.execution_status, PhaseExecutionStatus::InProgress);
}

#[tokio::test]
async fn in_flight_review_blocks_phase_completion() {
    let (store, workflows, lifecycle) = setup().await;

    let workflow_id = workflows
        .initialize_workflow(&single_phase_definition(Some(ValidationConfig::new(vec![]))))
        .await
        .unwrap();
    let phase = store
        .phases
        .find_first_open(workflow_id)
        .await
        .unwrap()
        .unwrap();

    let worker = lifecycle.register_agent("worker").await.unwrap();
    let validator = lifecycle.register_agent("validator").await.unwrap();
    let task = lifecycle
        .create_task(CreateTaskRequest::new("t", "d"))
        .await
        .unwrap();
    lifecycle.assign_task(task.id, worker.id).await.unwrap();

    // under_review and validation_in_progress are still open work.
    lifecycle.report_done(task.id, "done").await.unwrap();
    assert!(!workflows.check_phase_completion(phase.id).await.unwrap());

    lifecycle.begin_validation(task.id, validator.id).await.unwrap();
    assert!(!workflows.check_phase_completion(phase.id).await.unwrap());

    lifecycle
        .submit_validation_review(task.id, validator.id, true, "ok", vec![])
        .await
        .unwrap();
    assert!(workflows.check_phase_completion(phase.id).await.unwrap());
}

#[tokio::test]
async fn workflow_status_reports_per_phase_progress() {
    let (store, workflows, lifecycle) = setup().await;

    let workflow_id = workflows
        .initialize_workflow(&WorkflowDefinition {
            name: "w".to_string(),
            definition_ref: "w.yaml".to_string(),
            phases: vec![phase_def(1, "build", None), phase_def(2, "verify", None)],
            board: None,
        })
        .await
        .unwrap();

    let phase = store
        .phases
        .find_by_order(workflow_id, 1)
        .await
        .unwrap()
        .unwrap();

    let agent = lifecycle.register_agent("worker").await.unwrap();
    let task = lifecycle
        .create_task(CreateTaskRequest::new("t", "d").with_phase(PhaseRef::Id(phase.id)))
        .await
        .unwrap();
    lifecycle.assign_task(task.id, agent.id).await.unwrap();
    lifecycle.report_done(task.id, "done").await.unwrap();

    let report = workflows.get_workflow_status(workflow_id).await.unwrap();
    assert_eq!(report.workflow.id, workflow_id);
    assert_eq!(report.phases.len(), 2);
    assert_eq!(report.phases[0].total_tasks, 1);
    assert_eq!(report.phases[0].done_tasks, 1);
    assert_eq!(report.phases[1].total_tasks, 0);

    let tasks = lifecycle.tasks_for_phase(phase.id).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].id, task.id);
}

#[tokio::test]
async fn failed_task_blocks_phase_completion() {
    let (store, workflows, lifecycle) = setup().await;

    let workflow_id = workflows
        .initialize_workflow(&single_phase_definition(None))
        .await
        .unwrap();
    let phase = store
        .phases
        .find_first_open(workflow_id)
        .await
        .unwrap()
        .unwrap();

    let agent = lifecycle.register_agent("worker").await.unwrap();
    let done = lifecycle
        .create_task(CreateTaskRequest::new("a", "d"))
        .await
        .unwrap();
    lifecycle.assign_task(done.id, agent.id).await.unwrap();
    lifecycle.report_done(done.id, "done").await.unwrap();

    let agent2 = lifecycle.register_agent("worker-2").await.unwrap();
    let failing = lifecycle
        .create_task(CreateTaskRequest::new("b", "d"))
        .await
        .unwrap();
    lifecycle.assign_task(failing.id, agent2.id).await.unwrap();
    lifecycle.fail_task(failing.id, "worker crashed").await.unwrap();

    assert!(!workflows.check_phase_completion(phase.id).await.unwrap());
    assert_eq!(workflows.failed_task_count(phase.id).await.unwrap(), 1);
}

#[tokio::test]
async fn create_task_fails_for_unresolvable_phase() {
    let (_, workflows, lifecycle) = setup().await;

    // No workflow at all.
    let result = lifecycle
        .create_task(CreateTaskRequest::new("t", "d"))
        .await;
    assert!(matches!(result, Err(OrchestratorError::NoActiveWorkflow)));

    workflows
        .initialize_workflow(&single_phase_definition(None))
        .await
        .unwrap();

    // Unknown explicit references.
    let result = lifecycle
        .create_task(CreateTaskRequest::new("t", "d").with_phase(PhaseRef::Id(Uuid::new_v4())))
        .await;
    assert!(matches!(result, Err(OrchestratorError::InvalidPhase(_))));

    let result = lifecycle
        .create_task(CreateTaskRequest::new("t", "d").with_phase(PhaseRef::Order(42)))
        .await;
    assert!(matches!(result, Err(OrchestratorError::InvalidPhase(_))));
}

#[tokio::test]
async fn create_task_uses_requester_current_phase() {
    let (store, workflows, lifecycle) = setup().await;

    let workflow_id = workflows
        .initialize_workflow(&WorkflowDefinition {
            name: "w".to_string(),
            definition_ref: "w.yaml".to_string(),
            phases: vec![
                phase_def(1, "build", None),
                phase_def(2, "verify", Some(ValidationConfig::new(vec![]))),
            ],
            board: None,
        })
        .await
        .unwrap();

    let verify = store
        .phases
        .find_by_order(workflow_id, 2)
        .await
        .unwrap()
        .unwrap();

    // Put the agent to work in phase 2.
    let agent = lifecycle.register_agent("worker").await.unwrap();
    let current = lifecycle
        .create_task(CreateTaskRequest::new("verify things", "d").with_phase(PhaseRef::Id(verify.id)))
        .await
        .unwrap();
    lifecycle.assign_task(current.id, agent.id).await.unwrap();

    // A follow-up without explicit phase lands in the agent's phase.
    let mut request = CreateTaskRequest::new("follow-up", "d");
    request.requester_agent_id = Some(agent.id);
    let task = lifecycle.create_task(request).await.unwrap();
    assert_eq!(task.phase_id, Some(verify.id));
    assert!(task.validation_enabled);
}
