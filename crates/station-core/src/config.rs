//! Configuration System
//!
//! Loads tuning parameters from station.toml for adjustment without
//! recompiling. Every weight, decay rate, and pacing knob is surfaced
//! here with a documented default.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::SimError;

/// Default tuning file path
pub const DEFAULT_CONFIG_PATH: &str = "station.toml";

/// Top-level configuration structure
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub simulation: SimulationConfig,
    pub memory: MemoryConfig,
    pub relationship: RelationshipConfig,
    pub energy: EnergyConfig,
    pub reasoning: ReasoningConfig,
}

/// Tick loop parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Ticks per simulated sol (1 tick = 1 hour at the default).
    pub ticks_per_sol: u64,
    /// Wall-clock pacing between ticks when running free.
    pub tick_interval_ms: u64,
    /// Number of records kept in the live activity feed.
    pub activity_feed_limit: usize,
    /// Default number of ticks to run when none is given.
    pub default_ticks: u64,
}

/// Memory retrieval and decay parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Blended-score weight on recency.
    pub recency_weight: f32,
    /// Blended-score weight on decayed importance.
    pub importance_weight: f32,
    /// Blended-score weight on embedding similarity.
    pub similarity_weight: f32,
    /// Exponential decay rate per tick for recency.
    pub recency_lambda: f32,
    /// Exponential decay rate per tick for importance.
    pub importance_lambda: f32,
    /// Embedding dimensionality for the hashed bag-of-words embedder.
    pub embedding_dim: usize,
    /// Default number of memories retrieved per query.
    pub retrieval_k: usize,
    /// Accumulated-importance threshold that triggers a reflection.
    pub reflection_threshold: f32,
}

/// Relationship update parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelationshipConfig {
    /// Strength delta for a positive interaction.
    pub positive_delta: i8,
    /// Strength delta for a negative interaction (applied as a decrease).
    pub negative_delta: i8,
    /// Familiarity trickle for neutral contact.
    pub neutral_delta: i8,
    /// Smoothing factor for the sentiment trend (0..1, higher = slower).
    pub trend_smoothing: f32,
    /// Smoothed trend above which sentiment reads positive.
    pub positive_threshold: f32,
    /// Smoothed trend below which sentiment reads negative.
    pub negative_threshold: f32,
}

/// Energy and mood parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnergyConfig {
    /// Energy spent per tick of work.
    pub work_cost: u8,
    /// Energy recovered per tick of rest.
    pub rest_gain: u8,
    /// Below this, mood reads tired.
    pub tired_threshold: u8,
    /// Below this, mood reads exhausted.
    pub exhausted_threshold: u8,
}

/// Reasoning adapter parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReasoningConfig {
    /// Per-agent budget for one decide() call.
    pub timeout_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ticks_per_sol: 24,
            tick_interval_ms: 250,
            activity_feed_limit: 50,
            default_ticks: 48,
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            recency_weight: 0.3,
            importance_weight: 0.3,
            similarity_weight: 0.4,
            recency_lambda: 0.05,
            importance_lambda: 0.01,
            embedding_dim: 128,
            retrieval_k: 5,
            reflection_threshold: 30.0,
        }
    }
}

impl Default for RelationshipConfig {
    fn default() -> Self {
        Self {
            positive_delta: 3,
            negative_delta: 5,
            neutral_delta: 1,
            trend_smoothing: 0.7,
            positive_threshold: 0.5,
            negative_threshold: -0.5,
        }
    }
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            work_cost: 5,
            rest_gain: 15,
            tired_threshold: 30,
            exhausted_threshold: 10,
        }
    }
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self { timeout_ms: 2000 }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            memory: MemoryConfig::default(),
            relationship: RelationshipConfig::default(),
            energy: EnergyConfig::default(),
            reasoning: ReasoningConfig::default(),
        }
    }
}

impl SimConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| SimError::Config(format!("read {}: {}", path.as_ref().display(), e)))?;
        toml::from_str(&content).map_err(|e| SimError::Config(e.to_string()))
    }

    /// Load configuration from the default path, or fall back to defaults.
    pub fn load_or_default() -> Self {
        Self::load(DEFAULT_CONFIG_PATH).unwrap_or_else(|e| {
            tracing::warn!("could not load {}: {}. using defaults", DEFAULT_CONFIG_PATH, e);
            Self::default()
        })
    }

    /// Rejects configurations the engine cannot run with.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.simulation.ticks_per_sol == 0 || 24 * 60 % self.simulation.ticks_per_sol != 0 {
            return Err(SimError::Config(
                "ticks_per_sol must be a nonzero divisor of 1440 minutes".to_string(),
            ));
        }
        if self.memory.embedding_dim == 0 {
            return Err(SimError::Config("embedding_dim must be nonzero".to_string()));
        }
        let weight_sum = self.memory.recency_weight
            + self.memory.importance_weight
            + self.memory.similarity_weight;
        if weight_sum <= 0.0 {
            return Err(SimError::Config(
                "retrieval weights must sum to a positive value".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = SimConfig::default();
        assert_eq!(config.simulation.ticks_per_sol, 24);
        assert_eq!(config.memory.retrieval_k, 5);
        assert_eq!(config.relationship.positive_delta, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[memory]\nretrieval_k = 8\n\n[reasoning]\ntimeout_ms = 500"
        )
        .unwrap();

        let config = SimConfig::load(file.path()).unwrap();
        assert_eq!(config.memory.retrieval_k, 8);
        assert_eq!(config.reasoning.timeout_ms, 500);
        // Untouched sections keep their defaults
        assert_eq!(config.simulation.ticks_per_sol, 24);
        assert_eq!(config.memory.recency_weight, 0.3);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = SimConfig::load("/nonexistent/station.toml").unwrap_err();
        assert!(matches!(err, SimError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_bad_ticks_per_sol() {
        let mut config = SimConfig::default();
        config.simulation.ticks_per_sol = 7; // does not divide 1440
        assert!(config.validate().is_err());
        config.simulation.ticks_per_sol = 0;
        assert!(config.validate().is_err());
        config.simulation.ticks_per_sol = 48;
        assert!(config.validate().is_ok());
    }
}
