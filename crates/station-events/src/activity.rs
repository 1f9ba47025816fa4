//! Activity Record Types
//!
//! The outward-facing, append-only record of what each agent did on a
//! tick. Presentation layers consume a bounded stream of these; analytics
//! may retain the full history.

use serde::{Deserialize, Serialize};

use crate::time::SimTime;

/// The five actions an agent can take on a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Move,
    Talk,
    Work,
    Rest,
    Observe,
}

impl ActionKind {
    /// Returns all action kinds.
    pub fn all() -> &'static [ActionKind] {
        &[
            ActionKind::Move,
            ActionKind::Talk,
            ActionKind::Work,
            ActionKind::Rest,
            ActionKind::Observe,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Move => "move",
            ActionKind::Talk => "talk",
            ActionKind::Work => "work",
            ActionKind::Rest => "rest",
            ActionKind::Observe => "observe",
        }
    }
}

/// One entry in the activity feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Stable id of the acting agent.
    pub agent_id: String,
    /// Display name of the acting agent.
    pub agent_name: String,
    pub action: ActionKind,
    /// Room the agent was in when the action committed.
    pub location: String,
    /// Human-readable outcome, e.g. `Said to Priya Nair: "..."`.
    pub details: String,
    /// Inner monologue reported by the reasoning backend, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thought: Option<String>,
    pub time: SimTime,
    /// Set when the intended action could not be carried out and was
    /// downgraded or defaulted.
    #[serde(default)]
    pub failed: bool,
}

impl ActivityRecord {
    pub fn new(
        agent_id: impl Into<String>,
        agent_name: impl Into<String>,
        action: ActionKind,
        location: impl Into<String>,
        details: impl Into<String>,
        time: SimTime,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            agent_name: agent_name.into(),
            action,
            location: location.into(),
            details: details.into(),
            thought: None,
            time,
            failed: false,
        }
    }

    pub fn with_thought(mut self, thought: impl Into<String>) -> Self {
        self.thought = Some(thought.into());
        self
    }

    /// Marks this record as a soft failure.
    pub fn failed(mut self) -> Self {
        self.failed = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::TICKS_PER_SOL;

    #[test]
    fn test_action_kind_serialization() {
        assert_eq!(serde_json::to_string(&ActionKind::Move).unwrap(), r#""move""#);
        assert_eq!(
            serde_json::to_string(&ActionKind::Observe).unwrap(),
            r#""observe""#
        );
    }

    #[test]
    fn test_activity_record_serialization() {
        let record = ActivityRecord::new(
            "agent_vikram_0001",
            "Cdr. Vikram Sharma",
            ActionKind::Talk,
            "Mission Control",
            "Said to Rohan Pillai: \"Status report?\"",
            SimTime::from_tick(8, TICKS_PER_SOL),
        )
        .with_thought("I should check on comms.");

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("agent_vikram_0001"));
        assert!(json.contains(r#""action":"talk""#));
        assert!(json.contains(r#""failed":false"#));

        let parsed: ActivityRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.action, ActionKind::Talk);
        assert_eq!(parsed.time.tick, 8);
    }

    #[test]
    fn test_failed_marker() {
        let record = ActivityRecord::new(
            "agent_tara_0003",
            "TARA",
            ActionKind::Rest,
            "Mission Control",
            "Reasoning timed out",
            SimTime::start(),
        )
        .failed();
        assert!(record.failed);
    }
}
