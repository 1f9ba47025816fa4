//! Serialization contracts for the station simulation.
//!
//! Everything an external presentation or query layer consumes lives here:
//! simulation time, the activity record stream, world snapshots, the
//! per-agent query view, and propagation trace reports. This crate carries
//! no simulation logic.

pub mod activity;
pub mod snapshot;
pub mod time;

pub use activity::{ActionKind, ActivityRecord};
pub use snapshot::{
    AgentSnapshot, AgentView, MemoryView, PlanEntrySnapshot, PropagationAcquisition,
    PropagationReport, RelationshipSnapshot, WorldSnapshot,
};
pub use time::{ParseClockError, SimTime, SolClock, TICKS_PER_SOL};
