//! Perception
//!
//! Builds the immutable context handed to the reasoning adapter for
//! each agent. Contexts are assembled for every agent before any
//! adapter call runs, so all agents on a tick perceive the same world.

use serde::Serialize;

use crate::agent::AgentId;
use crate::memory::MemoryStore;
use crate::planner::PlanEntry;
use crate::relationship::RelationshipTracker;
use crate::world::WorldState;
use station_events::{ActivityRecord, SimTime};

/// Another agent sharing the room.
#[derive(Debug, Clone, Serialize)]
pub struct NearbyAgent {
    pub agent_id: String,
    pub name: String,
    pub activity: String,
    pub relationship_strength: u8,
}

/// A salient memory included in the context.
#[derive(Debug, Clone, Serialize)]
pub struct SalientMemory {
    pub content: String,
    pub kind: String,
    pub score: f32,
}

/// Everything an adapter sees when deciding for one agent.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionContext {
    pub agent_id: String,
    pub agent_name: String,
    pub role: String,
    pub location: String,
    pub energy: u8,
    pub mood: String,
    pub time: SimTime,
    /// e.g. "Sol 2, 08:00"
    pub time_label: String,
    pub current_plan_entry: Option<PlanEntry>,
    pub plan_summary: String,
    pub nearby_agents: Vec<NearbyAgent>,
    pub salient_memories: Vec<SalientMemory>,
    /// Tail of the public activity feed.
    pub recent_feed: Vec<ActivityRecord>,
}

/// Number of feed entries shown to the adapter.
const FEED_CONTEXT_LEN: usize = 5;

/// Builds the decision context for one agent from the current world.
pub fn build_context(
    agent_id: &AgentId,
    world: &WorldState,
    memories: &MemoryStore,
    relationships: &RelationshipTracker,
    retrieval_k: usize,
) -> Result<DecisionContext, crate::error::SimError> {
    let agent = world.agent(agent_id)?;
    let time = world.time;

    let nearby_agents = world
        .co_located(agent_id)?
        .iter()
        .filter_map(|other_id| world.agent(other_id).ok())
        .map(|other| NearbyAgent {
            agent_id: other.id.0.clone(),
            name: other.name.clone(),
            activity: other.activity.clone(),
            relationship_strength: relationships.strength(agent_id, &other.id),
        })
        .collect();

    // Query with the current situation so retrieval favors memories
    // about this place and moment.
    let query = format!("{} {} {}", agent.location, agent.activity, time.clock.label());
    let salient_memories = memories
        .retrieve(agent_id, &query, retrieval_k, time.tick)
        .iter()
        .map(|s| SalientMemory {
            content: s.record.content.clone(),
            kind: s.record.kind.as_str().to_string(),
            score: s.score,
        })
        .collect();

    let recent_feed = world
        .feed()
        .iter()
        .rev()
        .take(FEED_CONTEXT_LEN)
        .rev()
        .cloned()
        .collect();

    Ok(DecisionContext {
        agent_id: agent.id.0.clone(),
        agent_name: agent.name.clone(),
        role: agent.role.title().to_string(),
        location: agent.location.clone(),
        energy: agent.energy,
        mood: agent.mood.as_str().to_string(),
        time,
        time_label: time.clock.label(),
        current_plan_entry: agent
            .plan
            .current_entry(time.clock.hour, time.clock.minute)
            .cloned(),
        plan_summary: agent.plan.summary(),
        nearby_agents,
        salient_memories,
        recent_feed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{AgentState, Personality, Role};
    use crate::config::{MemoryConfig, RelationshipConfig};
    use crate::memory::MemoryInput;
    use crate::planner::generate_daily_plan;
    use crate::setup::create_station_map;

    fn fixtures() -> (WorldState, MemoryStore, RelationshipTracker) {
        let mut world = WorldState::new(create_station_map(), 24, 50);
        for (name, seq, role, room) in [
            ("Dr. Ananya Iyer", 2, Role::Botanist, "Agri Lab"),
            ("Kabir Saxena", 7, Role::Geologist, "Agri Lab"),
        ] {
            let id = AgentId::generate(name, seq);
            let mut agent = AgentState::new(id.clone(), name, role, Personality::default(), room);
            agent.plan = generate_daily_plan(42, &id, role, 1);
            world.spawn(agent).unwrap();
        }
        (
            world,
            MemoryStore::new(MemoryConfig::default()),
            RelationshipTracker::new(RelationshipConfig::default()),
        )
    }

    #[test]
    fn test_context_sees_co_located_agents_and_plan() {
        let (mut world, memories, relationships) = fixtures();
        world.time = SimTime::from_tick(8, 24);
        let iyer = AgentId::generate("Dr. Ananya Iyer", 2);

        let ctx = build_context(&iyer, &world, &memories, &relationships, 5).unwrap();
        assert_eq!(ctx.location, "Agri Lab");
        assert_eq!(ctx.nearby_agents.len(), 1);
        assert_eq!(ctx.nearby_agents[0].name, "Kabir Saxena");
        let entry = ctx.current_plan_entry.unwrap();
        assert_eq!(entry.description, "Morning plant checks");
        assert_eq!(ctx.time_label, "Sol 1, 08:00");
    }

    #[test]
    fn test_context_includes_salient_memories() {
        let (mut world, mut memories, relationships) = fixtures();
        world.time = SimTime::from_tick(10, 24);
        let iyer = AgentId::generate("Dr. Ananya Iyer", 2);
        memories
            .add(
                &iyer,
                MemoryInput::observation("hydroponics yield is up this week", 6.0, 9)
                    .at("Agri Lab"),
            )
            .unwrap();

        let ctx = build_context(&iyer, &world, &memories, &relationships, 5).unwrap();
        assert_eq!(ctx.salient_memories.len(), 1);
        assert!(ctx.salient_memories[0].content.contains("hydroponics"));
    }

    #[test]
    fn test_unknown_agent_is_an_error() {
        let (world, memories, relationships) = fixtures();
        let ghost = AgentId("agent_ghost_0099".to_string());
        assert!(build_context(&ghost, &world, &memories, &relationships, 5).is_err());
    }
}
