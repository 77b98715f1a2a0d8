mod agent;
mod diff;
mod phase;
mod review;
mod task;
mod ticket;
mod workflow;

pub use agent::*;
pub use diff::*;
pub use phase::*;
pub use review::*;
pub use task::*;
pub use ticket::*;
pub use workflow::*;
