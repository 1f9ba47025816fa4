//! Reasoning Adapters
//!
//! The seam between the deterministic world and whatever decides for
//! the agents. The engine builds a DecisionContext per agent, fans the
//! calls out concurrently under a timeout, and commits the returned
//! decisions serially. Adapters never see mutable world state.
//!
//! The stub adapters here are deliberately simple: ScriptedAdapter
//! follows the daily plan for deterministic runs, TalkativeAdapter
//! always strikes up a conversation and exists mainly to exercise
//! information propagation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::perception::DecisionContext;
use station_events::ActionKind;

/// The decision an adapter returns for one agent on one tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub action: ActionKind,
    /// Room name for move, agent name or id for talk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// What the agent says, for talk.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dialogue: Option<String>,
    /// Inner monologue, surfaced in the activity feed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thought: Option<String>,
}

impl Decision {
    pub fn rest() -> Self {
        Self {
            action: ActionKind::Rest,
            target: None,
            dialogue: None,
            thought: None,
        }
    }

    pub fn observe() -> Self {
        Self {
            action: ActionKind::Observe,
            target: None,
            dialogue: None,
            thought: None,
        }
    }

    pub fn work() -> Self {
        Self {
            action: ActionKind::Work,
            target: None,
            dialogue: None,
            thought: None,
        }
    }

    pub fn move_to(room: impl Into<String>) -> Self {
        Self {
            action: ActionKind::Move,
            target: Some(room.into()),
            dialogue: None,
            thought: None,
        }
    }

    pub fn talk_to(target: impl Into<String>, dialogue: impl Into<String>) -> Self {
        Self {
            action: ActionKind::Talk,
            target: Some(target.into()),
            dialogue: Some(dialogue.into()),
            thought: None,
        }
    }

    pub fn with_thought(mut self, thought: impl Into<String>) -> Self {
        self.thought = Some(thought.into());
        self
    }
}

/// Decides what one agent does on one tick.
///
/// Implementations must be cheap to share; the engine holds one adapter
/// behind an Arc and calls it concurrently for every agent.
#[async_trait]
pub trait ReasoningAdapter: Send + Sync {
    async fn decide(&self, ctx: &DecisionContext) -> Result<Decision, SimError>;

    /// Short label for logs.
    fn name(&self) -> &str {
        "adapter"
    }
}

/// Follows the daily plan exactly. The workhorse for deterministic runs
/// and tests.
#[derive(Debug, Default)]
pub struct ScriptedAdapter;

#[async_trait]
impl ReasoningAdapter for ScriptedAdapter {
    async fn decide(&self, ctx: &DecisionContext) -> Result<Decision, SimError> {
        let Some(entry) = &ctx.current_plan_entry else {
            return Ok(Decision::rest());
        };

        let decision = match entry.action {
            ActionKind::Move => {
                if ctx.location == entry.location {
                    // Already there, settle into the slot's purpose
                    Decision::observe()
                } else {
                    Decision::move_to(entry.location.clone())
                }
            }
            ActionKind::Work => {
                if ctx.location == entry.location {
                    Decision::work()
                } else {
                    Decision::move_to(entry.location.clone())
                }
            }
            ActionKind::Rest => {
                if ctx.location == entry.location {
                    Decision::rest()
                } else {
                    Decision::move_to(entry.location.clone())
                }
            }
            ActionKind::Talk => match ctx.nearby_agents.first() {
                Some(other) => Decision::talk_to(
                    other.name.clone(),
                    format!("How are things going, {}?", other.name),
                ),
                None => Decision::observe(),
            },
            ActionKind::Observe => Decision::observe(),
        };
        Ok(decision.with_thought(entry.description.clone()))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Talks to the first co-located agent every tick, sharing the most
/// salient memory. Used to exercise information propagation.
#[derive(Debug, Default)]
pub struct TalkativeAdapter;

#[async_trait]
impl ReasoningAdapter for TalkativeAdapter {
    async fn decide(&self, ctx: &DecisionContext) -> Result<Decision, SimError> {
        match ctx.nearby_agents.first() {
            Some(other) => {
                let dialogue = match ctx.salient_memories.first() {
                    Some(memory) => format!("Did you hear? {}", memory.content),
                    None => "Quiet shift so far.".to_string(),
                };
                Ok(Decision::talk_to(other.name.clone(), dialogue))
            }
            None => Ok(Decision::observe()),
        }
    }

    fn name(&self) -> &str {
        "talkative"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::perception::NearbyAgent;
    use station_events::SimTime;

    fn ctx_at(location: &str) -> DecisionContext {
        DecisionContext {
            agent_id: "agent_ananya_0002".to_string(),
            agent_name: "Dr. Ananya Iyer".to_string(),
            role: "Botanist/Life Support".to_string(),
            location: location.to_string(),
            energy: 80,
            mood: "content".to_string(),
            time: SimTime::from_tick(8, 24),
            time_label: "Sol 1, 08:00".to_string(),
            current_plan_entry: None,
            plan_summary: "No plan for today.".to_string(),
            nearby_agents: Vec::new(),
            salient_memories: Vec::new(),
            recent_feed: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_scripted_rests_without_a_plan() {
        let decision = ScriptedAdapter.decide(&ctx_at("Agri Lab")).await.unwrap();
        assert_eq!(decision.action, ActionKind::Rest);
    }

    #[tokio::test]
    async fn test_talkative_talks_when_not_alone() {
        let mut ctx = ctx_at("Mess Hall");
        ctx.nearby_agents.push(NearbyAgent {
            agent_id: "agent_priya_0004".to_string(),
            name: "Priya Nair".to_string(),
            activity: "idle".to_string(),
            relationship_strength: 0,
        });
        let decision = TalkativeAdapter.decide(&ctx).await.unwrap();
        assert_eq!(decision.action, ActionKind::Talk);
        assert_eq!(decision.target.as_deref(), Some("Priya Nair"));

        let alone = TalkativeAdapter.decide(&ctx_at("Mess Hall")).await.unwrap();
        assert_eq!(alone.action, ActionKind::Observe);
    }

    #[test]
    fn test_decision_serialization_shape() {
        let decision = Decision::talk_to("Priya Nair", "Good morning");
        let json = serde_json::to_string(&decision).unwrap();
        assert!(json.contains(r#""action":"talk""#));
        assert!(json.contains(r#""target":"Priya Nair""#));
        // Absent fields stay out of the wire form
        let rest = serde_json::to_string(&Decision::rest()).unwrap();
        assert_eq!(rest, r#"{"action":"rest"}"#);
    }
}
