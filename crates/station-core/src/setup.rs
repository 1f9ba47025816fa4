//! World Setup
//!
//! Builds the station map and the crew roster. The station is a
//! twelve-room pressurized complex arranged around Mission Control;
//! the crew is eight members, each with a role, a personality, and a
//! fixed starting room.

use crate::agent::{AgentId, AgentState, Personality, Role};
use crate::planner::generate_daily_plan;
use crate::station::{Room, StationMap};

/// Builds the station map.
pub fn create_station_map() -> StationMap {
    let mut map = StationMap::new();

    let rooms: &[(&str, &[&str])] = &[
        ("Mission Control", &["Comms Tower", "Crew Quarters", "Mess Hall", "Power Station"]),
        ("Agri Lab", &["Mess Hall", "Medical Bay"]),
        ("Mess Hall", &["Mission Control", "Agri Lab", "Rec Room", "Crew Quarters"]),
        ("Rec Room", &["Mess Hall", "Observatory", "Crew Quarters"]),
        ("Crew Quarters", &["Mission Control", "Mess Hall", "Rec Room", "Medical Bay"]),
        ("Medical Bay", &["Crew Quarters", "Agri Lab"]),
        ("Comms Tower", &["Mission Control", "Observatory"]),
        ("Mining Tunnel", &["Hangar Bay", "Power Station"]),
        ("Hangar Bay", &["Mining Tunnel", "Robotics Workshop", "Power Station"]),
        ("Observatory", &["Rec Room", "Comms Tower"]),
        ("Power Station", &["Mission Control", "Mining Tunnel", "Hangar Bay", "Robotics Workshop"]),
        ("Robotics Workshop", &["Hangar Bay", "Power Station"]),
    ];

    for (name, adjacent) in rooms {
        map.register(
            Room::new(*name).with_adjacent(adjacent.iter().map(|s| s.to_string()).collect()),
        );
    }
    map
}

/// Crew roster definition: name, role, personality, starting room.
fn roster() -> Vec<(&'static str, Role, Personality, &'static str)> {
    vec![
        (
            "Cdr. Vikram Sharma",
            Role::MissionCommander,
            Personality::new(0.6, 0.9, 0.5, 0.7, 0.3),
            "Mission Control",
        ),
        (
            "Dr. Ananya Iyer",
            Role::Botanist,
            Personality::new(0.8, 0.7, 0.6, 0.9, 0.4),
            "Agri Lab",
        ),
        (
            "TARA",
            Role::AiAssistant,
            Personality::new(0.9, 0.95, 0.4, 0.8, 0.1),
            "Mission Control",
        ),
        (
            "Priya Nair",
            Role::WelfareOfficer,
            Personality::new(0.8, 0.7, 0.7, 0.95, 0.3),
            "Mess Hall",
        ),
        (
            "Aditya Reddy",
            Role::SystemsEngineer,
            Personality::new(0.5, 0.85, 0.4, 0.6, 0.5),
            "Crew Quarters",
        ),
        (
            "Dr. Arjun Menon",
            Role::FlightSurgeon,
            Personality::new(0.7, 0.9, 0.5, 0.75, 0.2),
            "Medical Bay",
        ),
        (
            "Kabir Saxena",
            Role::Geologist,
            Personality::new(0.9, 0.5, 0.7, 0.4, 0.6),
            "Mining Tunnel",
        ),
        (
            "Rohan Pillai",
            Role::CommsOfficer,
            Personality::new(0.8, 0.6, 0.9, 0.85, 0.55),
            "Comms Tower",
        ),
    ]
}

/// Creates the eight crew members with their sol 1 plans in place.
pub fn create_crew(seed: u64) -> Vec<AgentState> {
    roster()
        .into_iter()
        .enumerate()
        .map(|(index, (name, role, personality, room))| {
            let id = AgentId::generate(name, index as u32 + 1);
            let mut agent = AgentState::new(id.clone(), name, role, personality, room);
            agent.plan = generate_daily_plan(seed, &id, role, 1);
            agent
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crew_roster() {
        let crew = create_crew(42);
        assert_eq!(crew.len(), 8);
        assert_eq!(crew[0].name, "Cdr. Vikram Sharma");
        assert_eq!(crew[0].id.as_str(), "agent_vikram_0001");
        assert_eq!(crew[0].location, "Mission Control");
        assert_eq!(crew[2].name, "TARA");
        assert_eq!(crew[2].role, Role::AiAssistant);
        // Everyone starts with a plan for sol 1
        assert!(crew.iter().all(|a| !a.plan.entries.is_empty()));
        assert!(crew.iter().all(|a| a.plan.sol == 1));
    }

    #[test]
    fn test_starting_rooms_exist() {
        let map = create_station_map();
        for agent in create_crew(42) {
            assert!(map.contains(&agent.location), "missing {}", agent.location);
        }
    }

    #[test]
    fn test_adjacency_is_symmetric() {
        let map = create_station_map();
        for name in map.room_names() {
            let room = map.get(name).unwrap();
            for neighbor in &room.adjacent {
                let other = map.get(neighbor).expect("adjacent room registered");
                assert!(
                    other.adjacent.contains(name),
                    "{} -> {} not symmetric",
                    name,
                    neighbor
                );
            }
        }
    }
}
