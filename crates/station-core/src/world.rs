//! World State
//!
//! The single authoritative aggregate of station time, agent state, and
//! room occupancy. Only the engine mutates it, and only between
//! reasoning phases; everyone else reads snapshots. The occupancy index
//! is maintained as the exact inverse of the per-agent location fields
//! and checked after every commit.

use std::collections::HashMap;

use crate::agent::{AgentId, AgentState};
use crate::error::SimError;
use crate::station::StationMap;
use station_events::{ActivityRecord, AgentSnapshot, SimTime, WorldSnapshot};

#[derive(Debug, Clone)]
pub struct WorldState {
    pub time: SimTime,
    pub is_running: bool,
    station: StationMap,
    agents: HashMap<AgentId, AgentState>,
    /// Registration order, fixes commit and snapshot iteration order.
    roster: Vec<AgentId>,
    /// room name -> agent ids present, the inverse of agent locations.
    occupancy: HashMap<String, Vec<AgentId>>,
    /// Bounded live feed of recent activity.
    feed: Vec<ActivityRecord>,
    feed_limit: usize,
    /// Full activity history for the run.
    history: Vec<ActivityRecord>,
}

impl WorldState {
    pub fn new(station: StationMap, ticks_per_sol: u64, feed_limit: usize) -> Self {
        Self {
            time: SimTime::from_tick(0, ticks_per_sol),
            is_running: false,
            station,
            agents: HashMap::new(),
            roster: Vec::new(),
            occupancy: HashMap::new(),
            feed: Vec::new(),
            feed_limit,
            history: Vec::new(),
        }
    }

    pub fn station(&self) -> &StationMap {
        &self.station
    }

    /// Adds an agent to the world at its starting location.
    pub fn spawn(&mut self, agent: AgentState) -> Result<(), SimError> {
        if !self.station.contains(&agent.location) {
            return Err(SimError::UnknownRoom(agent.location.clone()));
        }
        if self.agents.contains_key(&agent.id) {
            return Err(SimError::Validation(format!(
                "agent {} already registered",
                agent.id
            )));
        }
        self.occupancy
            .entry(agent.location.clone())
            .or_default()
            .push(agent.id.clone());
        self.roster.push(agent.id.clone());
        self.agents.insert(agent.id.clone(), agent);
        Ok(())
    }

    pub fn agent(&self, id: &AgentId) -> Result<&AgentState, SimError> {
        self.agents
            .get(id)
            .ok_or_else(|| SimError::UnknownAgent(id.0.clone()))
    }

    pub fn agent_mut(&mut self, id: &AgentId) -> Result<&mut AgentState, SimError> {
        self.agents
            .get_mut(id)
            .ok_or_else(|| SimError::UnknownAgent(id.0.clone()))
    }

    /// Agent ids in registration order.
    pub fn roster(&self) -> &[AgentId] {
        &self.roster
    }

    /// Resolves a display name or id to the agent's id.
    pub fn resolve_agent(&self, target: &str) -> Option<&AgentId> {
        let target = target.trim();
        if let Some((id, _)) = self.agents.get_key_value(&AgentId(target.to_string())) {
            return Some(id);
        }
        let lowered = target.to_lowercase();
        self.roster.iter().find(|id| {
            self.agents
                .get(id)
                .map(|a| a.name.to_lowercase() == lowered)
                .unwrap_or(false)
        })
    }

    /// Agents currently in a room, in registration order.
    pub fn agents_in(&self, room: &str) -> Vec<AgentId> {
        let Some(present) = self.occupancy.get(room) else {
            return Vec::new();
        };
        // Occupancy lists are kept in arrival order; reorder to roster
        // order so downstream iteration is stable across runs.
        self.roster
            .iter()
            .filter(|id| present.contains(id))
            .cloned()
            .collect()
    }

    /// Other agents sharing a room with the given agent.
    pub fn co_located(&self, id: &AgentId) -> Result<Vec<AgentId>, SimError> {
        let location = &self.agent(id)?.location;
        Ok(self
            .agents_in(location)
            .into_iter()
            .filter(|other| other != id)
            .collect())
    }

    /// Moves an agent to a room, updating both the agent's location and
    /// the occupancy index in one step.
    pub fn move_agent(&mut self, id: &AgentId, room: &str) -> Result<(), SimError> {
        let Some(room) = self.station.resolve(room).map(str::to_string) else {
            return Err(SimError::UnknownRoom(room.to_string()));
        };
        let from = self.agent(id)?.location.clone();
        if from == room {
            return Ok(());
        }
        if let Some(present) = self.occupancy.get_mut(&from) {
            present.retain(|a| a != id);
        }
        self.occupancy
            .entry(room.clone())
            .or_default()
            .push(id.clone());
        self.agent_mut(id)?.location = room;
        Ok(())
    }

    /// Appends to the live feed (bounded) and the full history.
    pub fn record_activity(&mut self, record: ActivityRecord) {
        self.feed.push(record.clone());
        if self.feed.len() > self.feed_limit {
            let overflow = self.feed.len() - self.feed_limit;
            self.feed.drain(..overflow);
        }
        self.history.push(record);
    }

    pub fn feed(&self) -> &[ActivityRecord] {
        &self.feed
    }

    pub fn history(&self) -> &[ActivityRecord] {
        &self.history
    }

    /// Verifies the occupancy index is the exact inverse of the
    /// per-agent location fields.
    pub fn check_invariants(&self) -> Result<(), SimError> {
        for (room, present) in &self.occupancy {
            for id in present {
                let agent = self.agent(id)?;
                if &agent.location != room {
                    return Err(SimError::InvariantViolation(format!(
                        "{} indexed in {} but located in {}",
                        id, room, agent.location
                    )));
                }
            }
        }
        for (id, agent) in &self.agents {
            let indexed = self
                .occupancy
                .get(&agent.location)
                .map(|present| present.contains(id))
                .unwrap_or(false);
            if !indexed {
                return Err(SimError::InvariantViolation(format!(
                    "{} located in {} but missing from its index",
                    id, agent.location
                )));
            }
            if !self.station.contains(&agent.location) {
                return Err(SimError::InvariantViolation(format!(
                    "{} located in unregistered room {}",
                    id, agent.location
                )));
            }
        }
        Ok(())
    }

    /// Read-only snapshot of the whole world.
    pub fn snapshot(&self) -> WorldSnapshot {
        let agents = self
            .roster
            .iter()
            .filter_map(|id| self.agents.get(id))
            .map(agent_snapshot)
            .collect();

        let mut occupancy = HashMap::new();
        for (room, present) in &self.occupancy {
            if present.is_empty() {
                continue;
            }
            occupancy.insert(
                room.clone(),
                self.agents_in(room).iter().map(|id| id.0.clone()).collect(),
            );
        }

        WorldSnapshot {
            time: self.time,
            is_running: self.is_running,
            is_night: self.time.clock.is_night(),
            agents,
            occupancy,
        }
    }
}

pub(crate) fn agent_snapshot(agent: &AgentState) -> AgentSnapshot {
    AgentSnapshot {
        agent_id: agent.id.0.clone(),
        name: agent.name.clone(),
        role: agent.role.title().to_string(),
        location: agent.location.clone(),
        activity: agent.activity.clone(),
        mood: agent.mood.as_str().to_string(),
        energy: agent.energy,
    }
}
