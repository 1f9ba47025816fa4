//! Simulation Time Types
//!
//! Handles station time with both a monotonic tick counter and a
//! human-readable sol clock.
//!
//! # Example
//!
//! ```
//! use station_events::{SimTime, SolClock};
//!
//! let time = SimTime::from_tick(30, 24);
//! assert_eq!(time.tick, 30);
//! assert_eq!(time.clock.to_string(), "sol_2.06:00");
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Default number of ticks per simulated sol (1 tick = 1 hour).
pub const TICKS_PER_SOL: u64 = 24;

/// Hour at which the station night ends.
pub const NIGHT_END_HOUR: u8 = 6;

/// Hour at which the station night begins.
pub const NIGHT_START_HOUR: u8 = 22;

/// Human-readable station clock.
///
/// Serializes to strings like "sol_3.14:30".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SolClock {
    /// Sol (station day), starting at 1.
    pub sol: u32,
    pub hour: u8,
    pub minute: u8,
}

impl SolClock {
    /// Creates a new SolClock.
    pub fn new(sol: u32, hour: u8, minute: u8) -> Self {
        Self { sol, hour, minute }
    }

    /// Clock at the start of the simulation.
    pub fn start() -> Self {
        Self {
            sol: 1,
            hour: 0,
            minute: 0,
        }
    }

    /// Derives the clock from a tick counter.
    ///
    /// Each tick covers `24 * 60 / ticks_per_sol` minutes; `ticks_per_sol`
    /// must be nonzero.
    pub fn from_tick(tick: u64, ticks_per_sol: u64) -> Self {
        let minutes_per_tick = 24 * 60 / ticks_per_sol;
        let total_minutes = tick * minutes_per_tick;
        let sol = (total_minutes / (24 * 60)) as u32 + 1;
        let minute_of_sol = total_minutes % (24 * 60);
        Self {
            sol,
            hour: (minute_of_sol / 60) as u8,
            minute: (minute_of_sol % 60) as u8,
        }
    }

    /// Returns true during the station night (before 06:00 or from 22:00).
    pub fn is_night(&self) -> bool {
        self.hour < NIGHT_END_HOUR || self.hour >= NIGHT_START_HOUR
    }

    /// Human-friendly label, e.g. "Sol 3, 14:30".
    pub fn label(&self) -> String {
        format!("Sol {}, {:02}:{:02}", self.sol, self.hour, self.minute)
    }
}

impl fmt::Display for SolClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sol_{}.{:02}:{:02}", self.sol, self.hour, self.minute)
    }
}

/// Error type for parsing SolClock from strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseClockError {
    InvalidFormat(String),
    InvalidSol(String),
    InvalidHour(String),
    InvalidMinute(String),
}

impl fmt::Display for ParseClockError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseClockError::InvalidFormat(s) => {
                write!(f, "invalid clock format: '{}', expected 'sol_N.HH:MM'", s)
            }
            ParseClockError::InvalidSol(s) => write!(f, "invalid sol: '{}'", s),
            ParseClockError::InvalidHour(s) => write!(f, "invalid hour: '{}'", s),
            ParseClockError::InvalidMinute(s) => write!(f, "invalid minute: '{}'", s),
        }
    }
}

impl std::error::Error for ParseClockError {}

impl FromStr for SolClock {
    type Err = ParseClockError;

    /// Parses a SolClock from a string like "sol_3.14:30".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix("sol_")
            .ok_or_else(|| ParseClockError::InvalidFormat(s.to_string()))?;
        let (sol_part, clock_part) = rest
            .split_once('.')
            .ok_or_else(|| ParseClockError::InvalidFormat(s.to_string()))?;
        let sol = sol_part
            .parse::<u32>()
            .map_err(|_| ParseClockError::InvalidSol(sol_part.to_string()))?;
        let (hour_part, minute_part) = clock_part
            .split_once(':')
            .ok_or_else(|| ParseClockError::InvalidFormat(s.to_string()))?;
        let hour = hour_part
            .parse::<u8>()
            .map_err(|_| ParseClockError::InvalidHour(hour_part.to_string()))?;
        if hour > 23 {
            return Err(ParseClockError::InvalidHour(hour_part.to_string()));
        }
        let minute = minute_part
            .parse::<u8>()
            .map_err(|_| ParseClockError::InvalidMinute(minute_part.to_string()))?;
        if minute > 59 {
            return Err(ParseClockError::InvalidMinute(minute_part.to_string()));
        }
        Ok(SolClock { sol, hour, minute })
    }
}

// SolClock serializes as a plain string, not an object.
impl Serialize for SolClock {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for SolClock {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A point in simulation time.
///
/// Contains both a monotonic tick counter and the derived station clock.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimTime {
    /// Monotonically increasing simulation tick.
    pub tick: u64,
    /// Human-readable station clock.
    pub clock: SolClock,
}

impl SimTime {
    /// Creates a SimTime from a tick counter.
    pub fn from_tick(tick: u64, ticks_per_sol: u64) -> Self {
        Self {
            tick,
            clock: SolClock::from_tick(tick, ticks_per_sol),
        }
    }

    /// Time at the start of the simulation.
    pub fn start() -> Self {
        Self {
            tick: 0,
            clock: SolClock::start(),
        }
    }

    /// Sol index of this time (starting at 1).
    pub fn sol(&self) -> u32 {
        self.clock.sol
    }

    /// Hour of the sol.
    pub fn hour(&self) -> u8 {
        self.clock.hour
    }
}
