mod arbitration;
mod conflict;
mod error;
mod state_machine;
mod store;
mod task_lifecycle;
mod ticket_board;
mod workflow_manager;

pub use arbitration::{ArbitrationError, ArbitrationRequest, ArbitrationResponse, Arbitrator};
pub use conflict::{ConflictResolutionEngine, DiffOutcome};
pub use error::{OrchestratorError, Result};
pub use state_machine::TaskStateMachine;
pub use store::Store;
pub use task_lifecycle::TaskLifecycle;
pub use ticket_board::TicketBoard;
pub use workflow_manager::{PhaseStatusReport, WorkflowManager, WorkflowStatusReport};
