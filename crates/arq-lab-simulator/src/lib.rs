//! Discrete-event network simulator for the ARQ lab.
//!
//! Hosts a sender and a receiver endpoint, connects them through an
//! unreliable (but FIFO) channel with seeded loss, corruption and latency,
//! and provides the single-shot timer facility the endpoints rely on.

pub mod engine;
pub mod scenario_runner;
pub mod trace;

pub use engine::{LinkEventSummary, NodeId, Simulator};
pub use scenario_runner::ScenarioError;
pub use trace::SimulationReport;
