use db::{
    AgentRepository, BoardConfigRepository, DiffRepository, MergeResolutionRepository,
    PhaseRepository, TaskRepository, TicketRepository, ValidationReviewRepository,
    WorkflowRepository,
};
use sqlx::SqlitePool;

/// Bundle of repositories over one pool. Cloning shares the pool; the
/// managers each take a clone of this instead of threading nine
/// repositories through every constructor.
#[derive(Clone)]
pub struct Store {
    pub workflows: WorkflowRepository,
    pub phases: PhaseRepository,
    pub tasks: TaskRepository,
    pub agents: AgentRepository,
    pub reviews: ValidationReviewRepository,
    pub tickets: TicketRepository,
    pub boards: BoardConfigRepository,
    pub diffs: DiffRepository,
    pub merge_resolutions: MergeResolutionRepository,
}

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            workflows: WorkflowRepository::new(pool.clone()),
            phases: PhaseRepository::new(pool.clone()),
            tasks: TaskRepository::new(pool.clone()),
            agents: AgentRepository::new(pool.clone()),
            reviews: ValidationReviewRepository::new(pool.clone()),
            tickets: TicketRepository::new(pool.clone()),
            boards: BoardConfigRepository::new(pool.clone()),
            diffs: DiffRepository::new(pool.clone()),
            merge_resolutions: MergeResolutionRepository::new(pool),
        }
    }
}
