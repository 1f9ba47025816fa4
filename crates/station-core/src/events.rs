//! Event Injection
//!
//! Triggerable events seed information into one agent's memory and
//! register the seed with the propagation tracker; from there the
//! information spreads only through conversations. The built-in catalog
//! carries the demo scenarios; custom events can be injected directly.

use serde::{Deserialize, Serialize};

use crate::agent::AgentId;
use crate::analytics::PropagationTracker;
use crate::error::SimError;
use crate::memory::{MemoryInput, MemoryKind, MemoryStore};
use crate::world::WorldState;

/// A triggerable event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationEvent {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Display name of the agent who first receives the information.
    pub target_agent: String,
    /// The information injected into the target's memory.
    pub content: String,
    pub importance: f32,
}

/// The built-in demo scenarios.
pub fn demo_events() -> Vec<StationEvent> {
    vec![
        StationEvent {
            id: "crew_meeting".to_string(),
            name: "Emergency Crew Meeting".to_string(),
            description: "Commander calls for an emergency crew meeting".to_string(),
            target_agent: "Cdr. Vikram Sharma".to_string(),
            content: "I need to organize an emergency crew meeting at 15:00 in Mission Control. \
                      It's important that everyone attends. I should tell the crew members."
                .to_string(),
            importance: 9.0,
        },
        StationEvent {
            id: "supply_shortage".to_string(),
            name: "Supply Shortage Warning".to_string(),
            description: "Engineer discovers potential supply issue".to_string(),
            target_agent: "Aditya Reddy".to_string(),
            content: "I discovered that we have a potential oxygen recycler malfunction. \
                      I need to inform Commander Vikram about this urgently."
                .to_string(),
            importance: 8.5,
        },
        StationEvent {
            id: "medical_concern".to_string(),
            name: "Medical Concern".to_string(),
            description: "Doctor has a private health concern about a crew member".to_string(),
            target_agent: "Dr. Arjun Menon".to_string(),
            content: "I've noticed Commander Vikram showing signs of fatigue. I should check \
                      on him privately and maybe tell Priya about my concerns."
                .to_string(),
            importance: 7.0,
        },
        StationEvent {
            id: "discovery".to_string(),
            name: "Mining Discovery".to_string(),
            description: "Geologist makes an exciting discovery".to_string(),
            target_agent: "Kabir Saxena".to_string(),
            content: "I found unusual mineral deposits in the mining tunnel! This could be \
                      significant. I should share this news with Dr. Ananya for analysis and \
                      tell Rohan to inform Earth."
                .to_string(),
            importance: 8.0,
        },
        StationEvent {
            id: "secret_message".to_string(),
            name: "Secret Transmission".to_string(),
            description: "Communications officer receives classified info".to_string(),
            target_agent: "Rohan Pillai".to_string(),
            content: "I intercepted a classified transmission about a potential rescue \
                      mission. I'm not supposed to share this, but maybe I should tell \
                      Commander Vikram?"
                .to_string(),
            importance: 9.0,
        },
        StationEvent {
            id: "celebration".to_string(),
            name: "Surprise Celebration".to_string(),
            description: "Welfare officer plans a celebration".to_string(),
            target_agent: "Priya Nair".to_string(),
            content: "I'm planning a surprise celebration for our 100th sol on the Moon \
                      tomorrow evening at 19:00 in the Rec Room. I need to secretly invite \
                      everyone without spoiling the surprise."
                .to_string(),
            importance: 7.5,
        },
    ]
}

/// Injects events into the world and keeps the trigger log.
#[derive(Debug, Clone)]
pub struct EventInjector {
    catalog: Vec<StationEvent>,
    triggered: Vec<String>,
}

impl EventInjector {
    pub fn new() -> Self {
        Self {
            catalog: demo_events(),
            triggered: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &[StationEvent] {
        &self.catalog
    }

    pub fn triggered(&self) -> &[String] {
        &self.triggered
    }

    /// Triggers a catalog event by id. Each catalog event fires at most
    /// once per run.
    pub fn trigger(
        &mut self,
        event_id: &str,
        world: &WorldState,
        memories: &mut MemoryStore,
        tracker: &mut PropagationTracker,
    ) -> Result<AgentId, SimError> {
        if self.triggered.iter().any(|id| id == event_id) {
            return Err(SimError::Validation(format!(
                "event {} already triggered",
                event_id
            )));
        }
        let event = self
            .catalog
            .iter()
            .find(|e| e.id == event_id)
            .cloned()
            .ok_or_else(|| SimError::Validation(format!("unknown event: {}", event_id)))?;

        let target = self.inject(&event, world, memories, tracker)?;
        self.triggered.push(event_id.to_string());
        Ok(target)
    }

    /// Injects an arbitrary event, bypassing the catalog and its
    /// once-per-run rule.
    pub fn inject(
        &self,
        event: &StationEvent,
        world: &WorldState,
        memories: &mut MemoryStore,
        tracker: &mut PropagationTracker,
    ) -> Result<AgentId, SimError> {
        let target = world
            .resolve_agent(&event.target_agent)
            .cloned()
            .ok_or_else(|| SimError::UnknownAgent(event.target_agent.clone()))?;
        let tick = world.time.tick;
        let location = world.agent(&target)?.location.clone();

        memories.add(
            &target,
            MemoryInput {
                kind: MemoryKind::Event,
                content: event.content.clone(),
                importance: event.importance,
                tick,
                location,
                related_agents: Vec::new(),
                source: None,
                origin_event: Some(event.id.clone()),
                propagation_chain: vec![target.clone()],
            },
        )?;

        let name = world.agent(&target)?.name.clone();
        tracker.register_seed(&event.id, &[(target.clone(), name)], tick);
        tracing::info!(event = %event.id, target = %target, tick, "event injected");
        Ok(target)
    }
}

impl Default for EventInjector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryConfig;
    use crate::setup::{create_crew, create_station_map};
    use crate::world::WorldState;

    fn fixtures() -> (WorldState, MemoryStore, PropagationTracker, EventInjector) {
        let mut world = WorldState::new(create_station_map(), 24, 50);
        for agent in create_crew(42) {
            world.spawn(agent).unwrap();
        }
        (
            world,
            MemoryStore::new(MemoryConfig::default()),
            PropagationTracker::new(),
            EventInjector::new(),
        )
    }

    #[test]
    fn test_catalog_has_six_events() {
        let injector = EventInjector::new();
        assert_eq!(injector.catalog().len(), 6);
        assert!(injector.catalog().iter().any(|e| e.id == "crew_meeting"));
    }

    #[test]
    fn test_trigger_seeds_target_memory_and_tracker() {
        let (world, mut memories, mut tracker, mut injector) = fixtures();

        let target = injector
            .trigger("crew_meeting", &world, &mut memories, &mut tracker)
            .unwrap();
        assert_eq!(world.agent(&target).unwrap().name, "Cdr. Vikram Sharma");

        assert!(memories.knows_event(&target, "crew_meeting"));
        let record = memories.stream(&target).last().unwrap();
        assert_eq!(record.importance, 9.0);
        assert_eq!(record.propagation_chain, vec![target.clone()]);
        assert!(tracker.knows("crew_meeting", &target));
        assert_eq!(tracker.injection_tick("crew_meeting"), Some(0));
    }

    #[test]
    fn test_trigger_fires_once() {
        let (world, mut memories, mut tracker, mut injector) = fixtures();
        injector
            .trigger("discovery", &world, &mut memories, &mut tracker)
            .unwrap();
        let err = injector
            .trigger("discovery", &world, &mut memories, &mut tracker)
            .unwrap_err();
        assert!(matches!(err, SimError::Validation(_)));
    }

    #[test]
    fn test_unknown_event_and_target() {
        let (world, mut memories, mut tracker, mut injector) = fixtures();
        assert!(injector
            .trigger("meteor_strike", &world, &mut memories, &mut tracker)
            .is_err());

        let event = StationEvent {
            id: "custom".to_string(),
            name: "Custom".to_string(),
            description: String::new(),
            target_agent: "Nobody".to_string(),
            content: "test".to_string(),
            importance: 5.0,
        };
        let err = injector
            .inject(&event, &world, &mut memories, &mut tracker)
            .unwrap_err();
        assert!(matches!(err, SimError::UnknownAgent(_)));
    }
}
