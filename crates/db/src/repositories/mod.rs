mod agent_repository;
mod board_repository;
mod diff_repository;
mod phase_repository;
mod review_repository;
mod task_repository;
mod ticket_repository;
mod workflow_repository;

pub use agent_repository::AgentRepository;
pub use board_repository::BoardConfigRepository;
pub use diff_repository::{DiffRepository, MergeResolutionRepository};
pub use phase_repository::PhaseRepository;
pub use review_repository::ValidationReviewRepository;
pub use task_repository::TaskRepository;
pub use ticket_repository::TicketRepository;
pub use workflow_repository::WorkflowRepository;
