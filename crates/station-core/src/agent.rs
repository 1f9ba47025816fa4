//! Agent State
//!
//! Identity, roles, personality, and the per-agent mutable state owned by
//! the engine. Agent ids are the map keys everywhere; display names are a
//! presentation concern.

use serde::{Deserialize, Serialize};

use crate::planner::DailyPlan;

/// Stable opaque agent identifier, e.g. "agent_vikram_0001".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(pub String);

impl AgentId {
    /// Builds an id from a display name and registration sequence number.
    ///
    /// The slug is the first name token that is not a title
    /// abbreviation, lowercased, so "Cdr. Vikram Sharma" becomes
    /// "agent_vikram_0001".
    pub fn generate(name: &str, seq: u32) -> Self {
        let slug: String = name
            .split_whitespace()
            .find(|token| !token.ends_with('.'))
            .unwrap_or("agent")
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        Self(format!("agent_{}_{:04}", slug, seq))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Crew roles at the station. Unknown roles fall back to the Systems
/// Engineer schedule in the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    MissionCommander,
    Botanist,
    AiAssistant,
    WelfareOfficer,
    SystemsEngineer,
    FlightSurgeon,
    Geologist,
    CommsOfficer,
}

impl Role {
    pub fn title(&self) -> &'static str {
        match self {
            Role::MissionCommander => "Mission Commander",
            Role::Botanist => "Botanist/Life Support",
            Role::AiAssistant => "AI Assistant",
            Role::WelfareOfficer => "Crew Welfare Officer",
            Role::SystemsEngineer => "Systems Engineer",
            Role::FlightSurgeon => "Flight Surgeon",
            Role::Geologist => "Geologist/Mining Lead",
            Role::CommsOfficer => "Communications Officer",
        }
    }
}

/// Five-factor personality, each dimension in [0, 1].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Personality {
    pub openness: f32,
    pub conscientiousness: f32,
    pub extraversion: f32,
    pub agreeableness: f32,
    pub neuroticism: f32,
}

impl Personality {
    pub fn new(
        openness: f32,
        conscientiousness: f32,
        extraversion: f32,
        agreeableness: f32,
        neuroticism: f32,
    ) -> Self {
        Self {
            openness: openness.clamp(0.0, 1.0),
            conscientiousness: conscientiousness.clamp(0.0, 1.0),
            extraversion: extraversion.clamp(0.0, 1.0),
            agreeableness: agreeableness.clamp(0.0, 1.0),
            neuroticism: neuroticism.clamp(0.0, 1.0),
        }
    }
}

impl Default for Personality {
    fn default() -> Self {
        Self {
            openness: 0.5,
            conscientiousness: 0.5,
            extraversion: 0.5,
            agreeableness: 0.5,
            neuroticism: 0.5,
        }
    }
}

/// Coarse mood derived from energy and recent interactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Content,
    Focused,
    Tired,
    Exhausted,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Content => "content",
            Mood::Focused => "focused",
            Mood::Tired => "tired",
            Mood::Exhausted => "exhausted",
        }
    }
}

/// Mutable per-agent state, exclusively owned by the engine during a
/// tick. External consumers only ever see snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    pub id: AgentId,
    pub name: String,
    pub role: Role,
    pub personality: Personality,
    pub location: String,
    pub activity: String,
    pub mood: Mood,
    /// 0..=100
    pub energy: u8,
    pub plan: DailyPlan,
}

impl AgentState {
    pub fn new(
        id: AgentId,
        name: impl Into<String>,
        role: Role,
        personality: Personality,
        location: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            role,
            personality,
            location: location.into(),
            activity: "idle".to_string(),
            mood: Mood::Content,
            energy: 100,
            plan: DailyPlan::empty(),
        }
    }

    /// Spends energy, saturating at zero.
    pub fn spend_energy(&mut self, amount: u8) {
        self.energy = self.energy.saturating_sub(amount);
    }

    /// Recovers energy, capped at 100.
    pub fn recover_energy(&mut self, amount: u8) {
        self.energy = self.energy.saturating_add(amount).min(100);
    }

    /// Recomputes mood from the current energy level.
    pub fn refresh_mood(&mut self, tired_threshold: u8, exhausted_threshold: u8) {
        self.mood = if self.energy < exhausted_threshold {
            Mood::Exhausted
        } else if self.energy < tired_threshold {
            Mood::Tired
        } else if self.activity.starts_with("working") {
            Mood::Focused
        } else {
            Mood::Content
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_id_generate() {
        let id = AgentId::generate("Cdr. Vikram Sharma", 1);
        assert_eq!(id.as_str(), "agent_vikram_0001");

        // Title abbreviations never leak into the id
        let id = AgentId::generate("Dr. Ananya Iyer", 2);
        assert_eq!(id.as_str(), "agent_ananya_0002");

        let id = AgentId::generate("TARA", 3);
        assert_eq!(id.as_str(), "agent_tara_0003");
    }

    #[test]
    fn test_energy_clamps() {
        let mut agent = AgentState::new(
            AgentId::generate("TARA", 3),
            "TARA",
            Role::AiAssistant,
            Personality::default(),
            "Mission Control",
        );
        agent.energy = 3;
        agent.spend_energy(10);
        assert_eq!(agent.energy, 0);
        agent.recover_energy(250);
        assert_eq!(agent.energy, 100);
        // Large gains on an already charged agent must not wrap
        agent.energy = 90;
        agent.recover_energy(200);
        assert_eq!(agent.energy, 100);
    }

    #[test]
    fn test_mood_from_energy() {
        let mut agent = AgentState::new(
            AgentId::generate("Priya Nair", 4),
            "Priya Nair",
            Role::WelfareOfficer,
            Personality::default(),
            "Mess Hall",
        );
        agent.energy = 5;
        agent.refresh_mood(30, 10);
        assert_eq!(agent.mood, Mood::Exhausted);
        agent.energy = 20;
        agent.refresh_mood(30, 10);
        assert_eq!(agent.mood, Mood::Tired);
        agent.energy = 80;
        agent.activity = "working on plant checks".to_string();
        agent.refresh_mood(30, 10);
        assert_eq!(agent.mood, Mood::Focused);
    }

    #[test]
    fn test_personality_clamped() {
        let p = Personality::new(1.5, -0.2, 0.5, 0.5, 0.5);
        assert_eq!(p.openness, 1.0);
        assert_eq!(p.conscientiousness, 0.0);
    }
}
