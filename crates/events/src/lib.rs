//! Event system for the swarm orchestrator
//!
//! The orchestrator never spawns or kills worker processes itself; it
//! publishes lifecycle events on this bus and the external worker
//! lifecycle manager subscribes and acts on them.

mod bus;
mod types;

pub use bus::EventBus;
pub use types::*;
