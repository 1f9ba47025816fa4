//! Daily Planner
//!
//! Generates a role-based schedule for each agent at the start of every
//! sol. Plans are advisory: the reasoning backend sees the current entry
//! as context and may deviate from it. A seeded variation picks the
//! evening activity so two crews with different seeds do not live
//! identical days, while the same seed always reproduces the same plans.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::agent::{AgentId, Role};
use station_events::{ActionKind, PlanEntrySnapshot};

/// One scheduled activity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanEntry {
    /// Start of the slot, "HH:MM".
    pub time_slot: String,
    pub action: ActionKind,
    pub location: String,
    pub description: String,
    pub completed: bool,
}

impl PlanEntry {
    fn new(time_slot: &str, action: ActionKind, location: &str, description: &str) -> Self {
        Self {
            time_slot: time_slot.to_string(),
            action,
            location: location.to_string(),
            description: description.to_string(),
            completed: false,
        }
    }

    /// Minutes since midnight of the slot start. Malformed slots sort
    /// to the start of the sol rather than being dropped.
    pub fn slot_minutes(&self) -> u32 {
        let mut parts = self.time_slot.splitn(2, ':');
        let hours: u32 = parts.next().and_then(|h| h.parse().ok()).unwrap_or(0);
        let minutes: u32 = parts.next().and_then(|m| m.parse().ok()).unwrap_or(0);
        hours * 60 + minutes
    }
}

/// An agent's schedule for one sol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyPlan {
    /// Sol the plan was generated for. Plans are discarded, never
    /// carried over, at the sol boundary.
    pub sol: u32,
    pub entries: Vec<PlanEntry>,
}

impl DailyPlan {
    /// A plan with no entries, used before the first sol boundary
    /// generation runs.
    pub fn empty() -> Self {
        Self {
            sol: 0,
            entries: Vec::new(),
        }
    }

    /// The entry in effect at the given time of day, i.e. the latest
    /// entry whose slot has started. None before the first slot.
    pub fn current_entry(&self, hour: u8, minute: u8) -> Option<&PlanEntry> {
        let now = hour as u32 * 60 + minute as u32;
        self.entries
            .iter()
            .filter(|e| e.slot_minutes() <= now)
            .max_by_key(|e| e.slot_minutes())
    }

    /// Marks the entry in effect at the given time as completed.
    /// Idempotent; a no-op when no entry is in effect.
    pub fn mark_completed(&mut self, hour: u8, minute: u8) {
        let now = hour as u32 * 60 + minute as u32;
        if let Some(entry) = self
            .entries
            .iter_mut()
            .filter(|e| e.slot_minutes() <= now)
            .max_by_key(|e| e.slot_minutes())
        {
            entry.completed = true;
        }
    }

    /// Short text form for reasoning prompts, first few entries only.
    pub fn summary(&self) -> String {
        if self.entries.is_empty() {
            return "No plan for today.".to_string();
        }
        let mut out = format!("Plan for sol {}:\n", self.sol);
        for entry in self.entries.iter().take(5) {
            out.push_str(&format!(
                "- {}: {} at {}\n",
                entry.time_slot, entry.description, entry.location
            ));
        }
        out
    }

    pub fn snapshot(&self) -> Vec<PlanEntrySnapshot> {
        self.entries
            .iter()
            .map(|e| PlanEntrySnapshot {
                time_slot: e.time_slot.clone(),
                location: e.location.clone(),
                description: e.description.clone(),
                completed: e.completed,
            })
            .collect()
    }
}

/// Evening options the seeded variation chooses between.
const EVENING_VARIANTS: &[(&str, &str)] = &[
    ("Rec Room", "Board games with the crew"),
    ("Rec Room", "Movie night"),
    ("Observatory", "Earthrise watching"),
    ("Mess Hall", "Late tea and conversation"),
];

/// Generates the daily plan for one agent.
///
/// Deterministic in (seed, agent id, sol): the schedule template comes
/// from the role, and the 19:00 leisure slot is drawn from a small
/// variant pool with an rng derived from all three inputs.
pub fn generate_daily_plan(seed: u64, agent_id: &AgentId, role: Role, sol: u32) -> DailyPlan {
    let mut entries = role_template(role);

    // The AI assistant has no leisure slot to vary.
    if role != Role::AiAssistant {
        let mut rng = SmallRng::seed_from_u64(plan_rng_seed(seed, agent_id, sol));
        let (location, description) = EVENING_VARIANTS[rng.gen_range(0..EVENING_VARIANTS.len())];
        if let Some(evening) = entries.iter_mut().find(|e| e.time_slot == "19:00") {
            evening.location = location.to_string();
            evening.description = description.to_string();
        }
    }

    DailyPlan { sol, entries }
}

fn plan_rng_seed(seed: u64, agent_id: &AgentId, sol: u32) -> u64 {
    // FNV-1a over the agent id, folded with seed and sol.
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in agent_id.as_str().bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash ^ seed.rotate_left(17) ^ (sol as u64).wrapping_mul(0x9e3779b97f4a7c15)
}

fn role_template(role: Role) -> Vec<PlanEntry> {
    use ActionKind::{Move, Rest, Talk, Work};
    match role {
        Role::MissionCommander => vec![
            PlanEntry::new("06:00", Rest, "Crew Quarters", "Wake up and prepare"),
            PlanEntry::new("07:00", Move, "Mess Hall", "Breakfast with crew"),
            PlanEntry::new("08:00", Work, "Mission Control", "Morning briefing and status check"),
            PlanEntry::new("10:00", Move, "Power Station", "Station inspection rounds"),
            PlanEntry::new("12:00", Move, "Mess Hall", "Lunch"),
            PlanEntry::new("13:00", Work, "Mission Control", "Communications with Earth"),
            PlanEntry::new("15:00", Talk, "Mess Hall", "Check on crew members"),
            PlanEntry::new("18:00", Move, "Mess Hall", "Dinner"),
            PlanEntry::new("19:00", Move, "Rec Room", "Crew meeting or relaxation"),
            PlanEntry::new("22:00", Rest, "Crew Quarters", "Sleep"),
        ],
        Role::Botanist => vec![
            PlanEntry::new("06:00", Rest, "Crew Quarters", "Wake up"),
            PlanEntry::new("07:00", Move, "Mess Hall", "Breakfast"),
            PlanEntry::new("08:00", Work, "Agri Lab", "Morning plant checks"),
            PlanEntry::new("10:00", Work, "Agri Lab", "Experiment maintenance"),
            PlanEntry::new("12:00", Move, "Mess Hall", "Lunch"),
            PlanEntry::new("13:00", Work, "Agri Lab", "Afternoon experiments"),
            PlanEntry::new("15:00", Work, "Agri Lab", "Data recording"),
            PlanEntry::new("18:00", Move, "Mess Hall", "Dinner"),
            PlanEntry::new("19:00", Move, "Rec Room", "Relaxation"),
            PlanEntry::new("22:00", Rest, "Crew Quarters", "Sleep"),
        ],
        Role::AiAssistant => vec![
            PlanEntry::new("00:00", Work, "Mission Control", "Systems monitoring"),
            PlanEntry::new("06:00", Work, "Mission Control", "Morning diagnostics"),
            PlanEntry::new("08:00", Work, "Mission Control", "Assist crew with tasks"),
            PlanEntry::new("12:00", Work, "Mission Control", "Midday status report"),
            PlanEntry::new("18:00", Work, "Mission Control", "Evening systems check"),
        ],
        Role::WelfareOfficer => vec![
            PlanEntry::new("06:00", Rest, "Crew Quarters", "Wake up"),
            PlanEntry::new("07:00", Move, "Mess Hall", "Breakfast and crew mood check"),
            PlanEntry::new("08:00", Talk, "Mess Hall", "Individual check-ins"),
            PlanEntry::new("10:00", Work, "Medical Bay", "Mental health documentation"),
            PlanEntry::new("12:00", Move, "Mess Hall", "Lunch with crew"),
            PlanEntry::new("14:00", Talk, "Rec Room", "Counseling sessions"),
            PlanEntry::new("16:00", Work, "Rec Room", "Organize activity"),
            PlanEntry::new("18:00", Move, "Mess Hall", "Dinner"),
            PlanEntry::new("19:00", Move, "Rec Room", "Group activity"),
            PlanEntry::new("22:00", Rest, "Crew Quarters", "Sleep"),
        ],
        Role::SystemsEngineer => vec![
            PlanEntry::new("06:00", Rest, "Crew Quarters", "Wake up"),
            PlanEntry::new("07:00", Move, "Mess Hall", "Breakfast"),
            PlanEntry::new("08:00", Work, "Mission Control", "Systems check"),
            PlanEntry::new("10:00", Work, "Power Station", "Maintenance rounds"),
            PlanEntry::new("12:00", Move, "Mess Hall", "Lunch"),
            PlanEntry::new("13:00", Work, "Crew Quarters", "Life support maintenance"),
            PlanEntry::new("15:00", Work, "Mission Control", "Repairs and updates"),
            PlanEntry::new("18:00", Move, "Mess Hall", "Dinner"),
            PlanEntry::new("19:00", Move, "Rec Room", "Relaxation"),
            PlanEntry::new("22:00", Rest, "Crew Quarters", "Sleep"),
        ],
        Role::FlightSurgeon => vec![
            PlanEntry::new("06:00", Rest, "Crew Quarters", "Wake up"),
            PlanEntry::new("07:00", Move, "Mess Hall", "Breakfast"),
            PlanEntry::new("08:00", Work, "Medical Bay", "Medical supplies inventory"),
            PlanEntry::new("09:00", Talk, "Medical Bay", "Crew health check-ups"),
            PlanEntry::new("12:00", Move, "Mess Hall", "Lunch"),
            PlanEntry::new("13:00", Work, "Medical Bay", "Medical records update"),
            PlanEntry::new("15:00", Work, "Medical Bay", "Research and monitoring"),
            PlanEntry::new("18:00", Move, "Mess Hall", "Dinner"),
            PlanEntry::new("19:00", Move, "Rec Room", "Relaxation"),
            PlanEntry::new("22:00", Rest, "Crew Quarters", "Sleep"),
        ],
        Role::Geologist => vec![
            PlanEntry::new("06:00", Rest, "Crew Quarters", "Wake up"),
            PlanEntry::new("07:00", Move, "Mess Hall", "Breakfast"),
            PlanEntry::new("08:00", Work, "Mining Tunnel", "Mining operations"),
            PlanEntry::new("10:00", Work, "Mining Tunnel", "Sample collection"),
            PlanEntry::new("12:00", Move, "Mess Hall", "Lunch"),
            PlanEntry::new("13:00", Work, "Mining Tunnel", "Afternoon mining"),
            PlanEntry::new("16:00", Work, "Agri Lab", "Sample analysis"),
            PlanEntry::new("18:00", Move, "Mess Hall", "Dinner"),
            PlanEntry::new("19:00", Move, "Rec Room", "Relaxation"),
            PlanEntry::new("22:00", Rest, "Crew Quarters", "Sleep"),
        ],
        Role::CommsOfficer => vec![
            PlanEntry::new("06:00", Rest, "Crew Quarters", "Wake up"),
            PlanEntry::new("07:00", Move, "Mess Hall", "Breakfast"),
            PlanEntry::new("08:00", Work, "Comms Tower", "Morning Earth transmission"),
            PlanEntry::new("10:00", Work, "Comms Tower", "Equipment maintenance"),
            PlanEntry::new("12:00", Move, "Mess Hall", "Lunch"),
            PlanEntry::new("13:00", Work, "Comms Tower", "Afternoon communications"),
            PlanEntry::new("15:00", Talk, "Mess Hall", "Relay messages to crew"),
            PlanEntry::new("18:00", Move, "Mess Hall", "Dinner"),
            PlanEntry::new("19:00", Move, "Rec Room", "Social time"),
            PlanEntry::new("22:00", Rest, "Crew Quarters", "Sleep"),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> AgentId {
        AgentId::generate("Dr. Ananya Iyer", 2)
    }

    #[test]
    fn test_plan_is_deterministic() {
        let a = generate_daily_plan(42, &id(), Role::Botanist, 1);
        let b = generate_daily_plan(42, &id(), Role::Botanist, 1);
        assert_eq!(a.entries.len(), b.entries.len());
        for (x, y) in a.entries.iter().zip(&b.entries) {
            assert_eq!(x.time_slot, y.time_slot);
            assert_eq!(x.description, y.description);
            assert_eq!(x.location, y.location);
        }
    }

    #[test]
    fn test_different_sols_can_differ_only_in_evening() {
        let sol1 = generate_daily_plan(42, &id(), Role::Botanist, 1);
        let sol2 = generate_daily_plan(42, &id(), Role::Botanist, 2);
        for (x, y) in sol1.entries.iter().zip(&sol2.entries) {
            if x.time_slot != "19:00" {
                assert_eq!(x.description, y.description);
            }
        }
    }

    #[test]
    fn test_current_entry_picks_latest_started_slot() {
        let plan = generate_daily_plan(42, &id(), Role::Botanist, 1);
        let entry = plan.current_entry(9, 30).unwrap();
        assert_eq!(entry.time_slot, "08:00");
        assert_eq!(entry.description, "Morning plant checks");

        // Before the first slot there is nothing in effect
        assert!(plan.current_entry(3, 0).is_none());

        // Past the last slot the sleep entry holds
        let entry = plan.current_entry(23, 45).unwrap();
        assert_eq!(entry.time_slot, "22:00");
    }

    #[test]
    fn test_mark_completed_idempotent() {
        let mut plan = generate_daily_plan(42, &id(), Role::Botanist, 1);
        plan.mark_completed(8, 0);
        plan.mark_completed(8, 0);
        let entry = plan.current_entry(8, 0).unwrap();
        assert!(entry.completed);
        assert_eq!(plan.entries.iter().filter(|e| e.completed).count(), 1);
    }

    #[test]
    fn test_ai_assistant_runs_around_the_clock() {
        let plan = generate_daily_plan(42, &AgentId::generate("TARA", 3), Role::AiAssistant, 1);
        let entry = plan.current_entry(2, 0).unwrap();
        assert_eq!(entry.action, ActionKind::Work);
        assert_eq!(entry.location, "Mission Control");
    }

    #[test]
    fn test_empty_plan_has_no_current_entry() {
        let plan = DailyPlan::empty();
        assert!(plan.current_entry(12, 0).is_none());
        assert_eq!(plan.summary(), "No plan for today.");
    }
}
