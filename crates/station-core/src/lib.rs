//! Station Core
//!
//! Simulation core for an autonomous lunar base crew. Each crew member
//! carries a memory stream with importance-weighted decay, pairwise
//! relationships, and a role-based daily plan; a swappable reasoning
//! adapter decides what each agent does on a tick, and the engine
//! commits those decisions serially against a single world state.
//!
//! Injected events seed information into one agent's memory and spread
//! only through conversation; the propagation tracker records who
//! learned what, when, and from whom.

pub mod agent;
pub mod analytics;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod memory;
pub mod perception;
pub mod planner;
pub mod reasoning;
pub mod relationship;
pub mod setup;
pub mod station;
pub mod world;

pub use agent::{AgentId, AgentState, Mood, Personality, Role};
pub use analytics::PropagationTracker;
pub use config::SimConfig;
pub use engine::{ControlHandle, RunState, SimulationEngine};
pub use error::SimError;
pub use events::{EventInjector, StationEvent};
pub use memory::{MemoryInput, MemoryKind, MemoryRecord, MemoryStore};
pub use perception::DecisionContext;
pub use planner::{DailyPlan, PlanEntry};
pub use reasoning::{Decision, ReasoningAdapter, ScriptedAdapter, TalkativeAdapter};
pub use relationship::{InteractionOutcome, RelationshipTracker, Sentiment};
pub use station::{Room, StationMap};
pub use world::WorldState;
