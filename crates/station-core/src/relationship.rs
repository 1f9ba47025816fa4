//! Relationship Tracker
//!
//! Pairwise strength scores between agents, updated on every
//! interaction and clamped to 0..=100. A smoothed trend of recent
//! outcomes backs the sentiment label so one bad conversation does not
//! flip a long friendship to negative.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::agent::AgentId;
use crate::config::RelationshipConfig;
use station_events::RelationshipSnapshot;

/// Outcome classification of a single interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionOutcome {
    Positive,
    Negative,
    Neutral,
}

/// Reading of one pair's relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

/// Unordered agent pair. (a, b) and (b, a) are the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PairKey(AgentId, AgentId);

impl PairKey {
    fn new(a: &AgentId, b: &AgentId) -> Self {
        if a <= b {
            Self(a.clone(), b.clone())
        } else {
            Self(b.clone(), a.clone())
        }
    }
}

/// State held per pair.
#[derive(Debug, Clone)]
struct Relationship {
    /// 0..=100
    strength: u8,
    /// Exponential moving average of outcome signs in [-1, 1].
    trend: f32,
    last_interaction_tick: u64,
    interaction_count: u32,
}

impl Relationship {
    fn new() -> Self {
        Self {
            strength: 0,
            trend: 0.0,
            last_interaction_tick: 0,
            interaction_count: 0,
        }
    }
}

/// Tracks relationship state for all agent pairs.
///
/// Pairs that have never interacted are not stored; reads of such pairs
/// return the neutral default.
#[derive(Debug, Clone)]
pub struct RelationshipTracker {
    config: RelationshipConfig,
    pairs: HashMap<PairKey, Relationship>,
}

impl RelationshipTracker {
    pub fn new(config: RelationshipConfig) -> Self {
        Self {
            config,
            pairs: HashMap::new(),
        }
    }

    /// Records one interaction between two agents.
    ///
    /// Strength moves by the configured delta for the outcome, clamped
    /// to 0..=100. Self-pairs are ignored. Ids are not checked against
    /// the world here; the engine resolves both parties before calling,
    /// so a talk naming an unknown agent fails as a soft observe and
    /// never reaches the tracker.
    pub fn update(&mut self, a: &AgentId, b: &AgentId, outcome: InteractionOutcome, tick: u64) {
        if a == b {
            return;
        }
        let rel = self
            .pairs
            .entry(PairKey::new(a, b))
            .or_insert_with(Relationship::new);

        let (delta, sign): (i16, f32) = match outcome {
            InteractionOutcome::Positive => (self.config.positive_delta as i16, 1.0),
            InteractionOutcome::Negative => (-(self.config.negative_delta as i16), -1.0),
            InteractionOutcome::Neutral => (self.config.neutral_delta as i16, 0.0),
        };

        rel.strength = (rel.strength as i16 + delta).clamp(0, 100) as u8;
        let alpha = self.config.trend_smoothing;
        rel.trend = alpha * rel.trend + (1.0 - alpha) * sign;
        rel.last_interaction_tick = tick;
        rel.interaction_count += 1;
    }

    /// Current strength for a pair, 0 when they have never interacted.
    pub fn strength(&self, a: &AgentId, b: &AgentId) -> u8 {
        self.pairs
            .get(&PairKey::new(a, b))
            .map(|r| r.strength)
            .unwrap_or(0)
    }

    /// Sentiment label derived from the smoothed trend.
    pub fn sentiment(&self, a: &AgentId, b: &AgentId) -> Sentiment {
        let Some(rel) = self.pairs.get(&PairKey::new(a, b)) else {
            return Sentiment::Neutral;
        };
        if rel.trend > self.config.positive_threshold {
            Sentiment::Positive
        } else if rel.trend < self.config.negative_threshold {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }

    /// Snapshot of one agent's relationships, keyed by the other
    /// agent's id. Only pairs with history appear.
    pub fn snapshot_for(&self, agent: &AgentId) -> HashMap<String, RelationshipSnapshot> {
        let mut out = HashMap::new();
        for (key, rel) in &self.pairs {
            let other = if &key.0 == agent {
                &key.1
            } else if &key.1 == agent {
                &key.0
            } else {
                continue;
            };
            out.insert(
                other.0.clone(),
                RelationshipSnapshot {
                    strength: rel.strength,
                    sentiment: self.sentiment(agent, other).as_str().to_string(),
                    last_interaction_tick: rel.last_interaction_tick,
                    interaction_count: rel.interaction_count,
                },
            );
        }
        out
    }

    pub fn pair_count(&self) -> usize {
        self.pairs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> RelationshipTracker {
        RelationshipTracker::new(RelationshipConfig::default())
    }

    fn crew(n: u32) -> AgentId {
        AgentId::generate("Crew Member", n)
    }

    #[test]
    fn test_unknown_pair_reads_neutral_default() {
        let tracker = tracker();
        assert_eq!(tracker.strength(&crew(1), &crew(2)), 0);
        assert_eq!(tracker.sentiment(&crew(1), &crew(2)), Sentiment::Neutral);
        assert_eq!(tracker.pair_count(), 0);
    }

    #[test]
    fn test_pair_key_is_unordered() {
        let mut tracker = tracker();
        tracker.update(&crew(1), &crew(2), InteractionOutcome::Positive, 1);
        tracker.update(&crew(2), &crew(1), InteractionOutcome::Positive, 2);
        assert_eq!(tracker.pair_count(), 1);
        assert_eq!(tracker.strength(&crew(1), &crew(2)), 6);
        assert_eq!(tracker.strength(&crew(2), &crew(1)), 6);
    }

    #[test]
    fn test_strength_clamps_at_both_ends() {
        let mut tracker = tracker();
        let (a, b) = (crew(1), crew(2));
        for tick in 0..50 {
            tracker.update(&a, &b, InteractionOutcome::Positive, tick);
        }
        assert_eq!(tracker.strength(&a, &b), 100);
        for tick in 50..100 {
            tracker.update(&a, &b, InteractionOutcome::Negative, tick);
        }
        assert_eq!(tracker.strength(&a, &b), 0);
        // Adversarial alternation stays in range
        for tick in 100..200 {
            let outcome = if tick % 2 == 0 {
                InteractionOutcome::Positive
            } else {
                InteractionOutcome::Negative
            };
            tracker.update(&a, &b, outcome, tick);
            assert!(tracker.strength(&a, &b) <= 100);
        }
    }

    #[test]
    fn test_sentiment_follows_trend_not_single_outcome() {
        let mut tracker = tracker();
        let (a, b) = (crew(1), crew(2));
        for tick in 0..10 {
            tracker.update(&a, &b, InteractionOutcome::Positive, tick);
        }
        assert_eq!(tracker.sentiment(&a, &b), Sentiment::Positive);

        // One bad exchange does not flip a warm history negative
        tracker.update(&a, &b, InteractionOutcome::Negative, 10);
        assert_ne!(tracker.sentiment(&a, &b), Sentiment::Negative);

        for tick in 11..25 {
            tracker.update(&a, &b, InteractionOutcome::Negative, tick);
        }
        assert_eq!(tracker.sentiment(&a, &b), Sentiment::Negative);
    }

    #[test]
    fn test_self_pair_ignored() {
        let mut tracker = tracker();
        tracker.update(&crew(1), &crew(1), InteractionOutcome::Positive, 1);
        assert_eq!(tracker.pair_count(), 0);
    }

    #[test]
    fn test_snapshot_for_agent() {
        let mut tracker = tracker();
        tracker.update(&crew(1), &crew(2), InteractionOutcome::Positive, 7);
        tracker.update(&crew(2), &crew(3), InteractionOutcome::Neutral, 8);

        let snap = tracker.snapshot_for(&crew(2));
        assert_eq!(snap.len(), 2);
        let with_one = &snap[crew(1).as_str()];
        assert_eq!(with_one.strength, 3);
        assert_eq!(with_one.last_interaction_tick, 7);
        assert_eq!(with_one.interaction_count, 1);

        // Agent 1 only has the one pair
        assert_eq!(tracker.snapshot_for(&crew(1)).len(), 1);
    }
}
