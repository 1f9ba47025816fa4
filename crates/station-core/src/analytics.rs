//! Propagation Analytics
//!
//! Tracks how injected information spreads through the crew. Seeds are
//! registered when an event is injected; acquisitions are recorded at
//! conversation commit time, when a listener first hears about an event
//! the speaker knows. Reports are ordered by acquisition tick.

use std::collections::HashMap;

use crate::agent::AgentId;
use station_events::{PropagationAcquisition, PropagationReport};

#[derive(Debug, Clone)]
struct Acquisition {
    agent: AgentId,
    agent_name: String,
    tick: u64,
    from: Option<AgentId>,
}

/// Per-event record of who learned what, when, and from whom.
#[derive(Debug, Clone, Default)]
pub struct PropagationTracker {
    /// event id -> acquisitions in commit order.
    events: HashMap<String, Vec<Acquisition>>,
    /// Injection tick per event, acquisitions can never precede it.
    injected_at: HashMap<String, u64>,
}

impl PropagationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an event injection and its seed agents.
    pub fn register_seed(
        &mut self,
        event_id: &str,
        seeds: &[(AgentId, String)],
        tick: u64,
    ) {
        self.injected_at.entry(event_id.to_string()).or_insert(tick);
        let acquisitions = self.events.entry(event_id.to_string()).or_default();
        for (agent, name) in seeds {
            if acquisitions.iter().any(|a| &a.agent == agent) {
                continue;
            }
            acquisitions.push(Acquisition {
                agent: agent.clone(),
                agent_name: name.clone(),
                tick,
                from: None,
            });
        }
    }

    /// Records that a listener learned about an event from a speaker.
    /// Repeat acquisitions by the same agent are ignored; the first
    /// exposure is the one that counts.
    pub fn record_acquisition(
        &mut self,
        event_id: &str,
        listener: &AgentId,
        listener_name: &str,
        from: &AgentId,
        tick: u64,
    ) {
        let acquisitions = self.events.entry(event_id.to_string()).or_default();
        if acquisitions.iter().any(|a| &a.agent == listener) {
            return;
        }
        acquisitions.push(Acquisition {
            agent: listener.clone(),
            agent_name: listener_name.to_string(),
            tick,
            from: Some(from.clone()),
        });
    }

    /// Whether an agent has been recorded as knowing the event.
    pub fn knows(&self, event_id: &str, agent: &AgentId) -> bool {
        self.events
            .get(event_id)
            .map(|acqs| acqs.iter().any(|a| &a.agent == agent))
            .unwrap_or(false)
    }

    pub fn injection_tick(&self, event_id: &str) -> Option<u64> {
        self.injected_at.get(event_id).copied()
    }

    /// Event ids with at least one acquisition, in no particular order.
    pub fn tracked_events(&self) -> Vec<&str> {
        self.events.keys().map(String::as_str).collect()
    }

    /// Builds the report for one event, ordered by acquisition tick
    /// (stable for equal ticks, commit order is preserved).
    pub fn trace(&self, event_id: &str) -> PropagationReport {
        let mut acquisitions: Vec<PropagationAcquisition> = self
            .events
            .get(event_id)
            .map(|acqs| {
                acqs.iter()
                    .map(|a| PropagationAcquisition {
                        agent_id: a.agent.0.clone(),
                        agent_name: a.agent_name.clone(),
                        tick: a.tick,
                        from: a.from.as_ref().map(|f| f.0.clone()),
                    })
                    .collect()
            })
            .unwrap_or_default();
        acquisitions.sort_by_key(|a| a.tick);
        PropagationReport {
            event_id: event_id.to_string(),
            acquisitions,
        }
    }
}
