//! Snapshot Types
//!
//! Read-only views of simulation state handed to external consumers.
//! The engine produces these; nothing outside the engine can mutate
//! simulation state through them.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::time::SimTime;

/// One agent's public state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub agent_id: String,
    pub name: String,
    pub role: String,
    pub location: String,
    pub activity: String,
    pub mood: String,
    pub energy: u8,
}

impl AgentSnapshot {
    pub fn new(
        agent_id: impl Into<String>,
        name: impl Into<String>,
        role: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            name: name.into(),
            role: role.into(),
            location: location.into(),
            activity: "idle".to_string(),
            mood: "content".to_string(),
            energy: 100,
        }
    }
}

/// One side of a pair relationship, as seen from a given agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipSnapshot {
    pub strength: u8,
    pub sentiment: String,
    pub last_interaction_tick: u64,
    pub interaction_count: u32,
}

/// One scheduled entry in an agent's daily plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEntrySnapshot {
    pub time_slot: String,
    pub location: String,
    pub description: String,
    pub completed: bool,
}

/// A retrieved memory, scored for the query that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryView {
    pub id: u64,
    pub kind: String,
    pub content: String,
    pub importance: f32,
    pub decayed_importance: f32,
    pub tick: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub score: f32,
}

/// Full per-agent view for the query surface: state, memories,
/// relationships, and the current plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentView {
    pub agent: AgentSnapshot,
    pub top_memories: Vec<MemoryView>,
    pub relationships: HashMap<String, RelationshipSnapshot>,
    pub plan: Vec<PlanEntrySnapshot>,
}

/// Complete world snapshot for the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub time: SimTime,
    pub is_running: bool,
    /// True during the station night (before 06:00 or from 22:00).
    pub is_night: bool,
    pub agents: Vec<AgentSnapshot>,
    /// Room name -> agents present, the inverse of agent locations.
    pub occupancy: HashMap<String, Vec<String>>,
}

impl WorldSnapshot {
    pub fn new(time: SimTime, is_running: bool) -> Self {
        Self {
            time,
            is_running,
            is_night: time.clock.is_night(),
            agents: Vec::new(),
            occupancy: HashMap::new(),
        }
    }

    /// Finds an agent by id.
    pub fn find_agent(&self, agent_id: &str) -> Option<&AgentSnapshot> {
        self.agents.iter().find(|a| a.agent_id == agent_id)
    }

    /// Returns agents at a specific room.
    pub fn agents_at(&self, location: &str) -> Vec<&AgentSnapshot> {
        self.agents.iter().filter(|a| a.location == location).collect()
    }

    /// Serializes the snapshot to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserializes a snapshot from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// How one agent first acquired a traced piece of information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropagationAcquisition {
    pub agent_id: String,
    pub agent_name: String,
    /// Tick at which the agent first held the information.
    pub tick: u64,
    /// Agent that transmitted it; None for the seed agent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

/// Result of tracing an injected event through the crew.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropagationReport {
    pub event_id: String,
    /// Acquisitions ordered by tick, the seed agent first.
    pub acquisitions: Vec<PropagationAcquisition>,
}

impl PropagationReport {
    pub fn new(event_id: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            acquisitions: Vec::new(),
        }
    }

    /// Number of agents holding the information.
    pub fn informed_count(&self) -> usize {
        self.acquisitions.len()
    }

    /// Returns the acquisition record for an agent, if it knows.
    pub fn acquisition_for(&self, agent_id: &str) -> Option<&PropagationAcquisition> {
        self.acquisitions.iter().find(|a| a.agent_id == agent_id)
    }
}
