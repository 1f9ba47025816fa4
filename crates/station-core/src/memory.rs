//! Memory Stream
//!
//! Per-agent append-only memory with importance-weighted decay and
//! blended retrieval. Retrieval scores each candidate as a weighted sum
//! of recency, decayed importance, and embedding similarity; the
//! embedder is a deterministic hashed bag-of-words so identical content
//! always maps to identical vectors regardless of process or platform.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::agent::AgentId;
use crate::config::MemoryConfig;
use crate::error::SimError;
use station_events::MemoryView;

/// Kind of memory record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryKind {
    Observation,
    Conversation,
    Reflection,
    Event,
}

impl MemoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryKind::Observation => "observation",
            MemoryKind::Conversation => "conversation",
            MemoryKind::Reflection => "reflection",
            MemoryKind::Event => "event",
        }
    }
}

/// A single memory entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Monotonic per-store id, later records get larger ids.
    pub id: u64,
    pub kind: MemoryKind,
    pub content: String,
    /// Base importance on the 1..=10 scale, validated at insert.
    pub importance: f32,
    /// Tick the memory was formed at.
    pub tick: u64,
    pub location: String,
    pub related_agents: Vec<AgentId>,
    /// Who this information came from, for second-hand knowledge.
    pub source: Option<AgentId>,
    /// Injected event this memory traces back to, if any.
    pub origin_event: Option<String>,
    /// Chain of agents the information passed through, oldest first.
    pub propagation_chain: Vec<AgentId>,
    #[serde(skip)]
    embedding: Vec<f32>,
}

impl MemoryRecord {
    /// Importance after exponential decay over elapsed ticks.
    pub fn decayed_importance(&self, as_of_tick: u64, lambda: f32) -> f32 {
        let elapsed = as_of_tick.saturating_sub(self.tick) as f32;
        self.importance * (-lambda * elapsed).exp()
    }
}

/// Builder-style input for one memory insert.
#[derive(Debug, Clone)]
pub struct MemoryInput {
    pub kind: MemoryKind,
    pub content: String,
    pub importance: f32,
    pub tick: u64,
    pub location: String,
    pub related_agents: Vec<AgentId>,
    pub source: Option<AgentId>,
    pub origin_event: Option<String>,
    pub propagation_chain: Vec<AgentId>,
}

impl MemoryInput {
    pub fn observation(content: impl Into<String>, importance: f32, tick: u64) -> Self {
        Self {
            kind: MemoryKind::Observation,
            content: content.into(),
            importance,
            tick,
            location: String::new(),
            related_agents: Vec::new(),
            source: None,
            origin_event: None,
            propagation_chain: Vec::new(),
        }
    }

    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn kind(mut self, kind: MemoryKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn involving(mut self, agents: Vec<AgentId>) -> Self {
        self.related_agents = agents;
        self
    }

    pub fn from_source(mut self, source: AgentId) -> Self {
        self.source = Some(source);
        self
    }

    pub fn tracing_event(mut self, event_id: impl Into<String>, chain: Vec<AgentId>) -> Self {
        self.origin_event = Some(event_id.into());
        self.propagation_chain = chain;
        self
    }
}

/// Deterministic text embedder.
///
/// Hashed bag-of-words: each lowercased word is hashed to a bucket and
/// the bucket counts are L2-normalized. Not semantic, but stable and
/// cheap, and similar phrasing lands on overlapping buckets.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }

    pub fn embed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dim];
        for word in text.to_lowercase().split_whitespace() {
            let word: String = word.chars().filter(|c| c.is_alphanumeric()).collect();
            if word.is_empty() {
                continue;
            }
            let bucket = (word_hash(&word) % self.dim as u64) as usize;
            vector[bucket] += 1.0;
        }
        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

/// FNV-1a. Stable across runs and platforms, unlike the std hasher.
fn word_hash(word: &str) -> u64 {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in word.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    // Both vectors are unit length, so the dot product is the cosine.
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// One retrieval hit with its blended score.
#[derive(Debug, Clone)]
pub struct ScoredMemory<'a> {
    pub record: &'a MemoryRecord,
    pub score: f32,
}

/// The memory streams of every agent.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    config: MemoryConfig,
    embedder: HashEmbedder,
    streams: HashMap<AgentId, Vec<MemoryRecord>>,
    next_id: u64,
    /// Importance accumulated since the last reflection, per agent.
    reflection_charge: HashMap<AgentId, f32>,
}

impl MemoryStore {
    pub fn new(config: MemoryConfig) -> Self {
        let embedder = HashEmbedder::new(config.embedding_dim);
        Self {
            config,
            embedder,
            streams: HashMap::new(),
            next_id: 1,
            reflection_charge: HashMap::new(),
        }
    }

    /// Appends a memory to an agent's stream.
    ///
    /// Importance outside 1..=10 is rejected and nothing is written.
    /// Returns the id of the new record.
    pub fn add(&mut self, agent: &AgentId, input: MemoryInput) -> Result<u64, SimError> {
        if !(1.0..=10.0).contains(&input.importance) || !input.importance.is_finite() {
            return Err(SimError::Validation(format!(
                "importance {} outside 1..=10",
                input.importance
            )));
        }

        let id = self.next_id;
        self.next_id += 1;

        let record = MemoryRecord {
            id,
            kind: input.kind,
            content: input.content.clone(),
            importance: input.importance,
            tick: input.tick,
            location: input.location,
            related_agents: input.related_agents,
            source: input.source,
            origin_event: input.origin_event,
            propagation_chain: input.propagation_chain,
            embedding: self.embedder.embed(&input.content),
        };

        *self.reflection_charge.entry(agent.clone()).or_default() += input.importance;
        self.streams.entry(agent.clone()).or_default().push(record);
        Ok(id)
    }

    /// Retrieves the top-k memories for a query at the given tick.
    ///
    /// score = w_r * exp(-lambda_r * age)
    ///       + w_i * decayed_importance / 10
    ///       + w_s * cosine(query, content)
    ///
    /// Ties break toward the newer record, then the higher id, so the
    /// result order is fully deterministic.
    pub fn retrieve(&self, agent: &AgentId, query: &str, k: usize, as_of_tick: u64) -> Vec<ScoredMemory<'_>> {
        let Some(stream) = self.streams.get(agent) else {
            return Vec::new();
        };
        let query_vec = self.embedder.embed(query);
        let w = &self.config;

        let mut scored: Vec<ScoredMemory<'_>> = stream
            .iter()
            .map(|record| {
                let age = as_of_tick.saturating_sub(record.tick) as f32;
                let recency = (-w.recency_lambda * age).exp();
                let importance =
                    record.decayed_importance(as_of_tick, w.importance_lambda) / 10.0;
                let similarity = cosine_similarity(&query_vec, &record.embedding);
                let score = w.recency_weight * recency
                    + w.importance_weight * importance
                    + w.similarity_weight * similarity;
                ScoredMemory { record, score }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(b.record.tick.cmp(&a.record.tick))
                .then(b.record.id.cmp(&a.record.id))
        });
        scored.truncate(k);
        scored
    }

    /// All memories of an agent, oldest first.
    pub fn stream(&self, agent: &AgentId) -> &[MemoryRecord] {
        self.streams.get(agent).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, agent: &AgentId) -> usize {
        self.streams.get(agent).map(Vec::len).unwrap_or(0)
    }

    /// Whether an agent holds any memory tracing back to an event.
    pub fn knows_event(&self, agent: &AgentId, event_id: &str) -> bool {
        self.stream(agent)
            .iter()
            .any(|m| m.origin_event.as_deref() == Some(event_id))
    }

    /// Event ids this agent has memories of, in first-acquired order.
    pub fn known_events(&self, agent: &AgentId) -> Vec<String> {
        let mut seen = Vec::new();
        for record in self.stream(agent) {
            if let Some(event) = &record.origin_event {
                if !seen.contains(event) {
                    seen.push(event.clone());
                }
            }
        }
        seen
    }

    /// Writes a reflection when the accumulated importance since the
    /// last one crosses the configured threshold. The reflection
    /// summarizes the agent's highest-scoring recent memories.
    pub fn maybe_reflect(&mut self, agent: &AgentId, tick: u64, location: &str) -> Option<u64> {
        let charge = self.reflection_charge.get(agent).copied().unwrap_or(0.0);
        if charge < self.config.reflection_threshold {
            return None;
        }

        let salient: Vec<String> = self
            .retrieve(agent, "recent significant moments", 3, tick)
            .iter()
            .map(|s| s.record.content.clone())
            .collect();
        if salient.is_empty() {
            return None;
        }

        let content = format!("Reflecting on recent events: {}", salient.join("; "));
        let input = MemoryInput {
            kind: MemoryKind::Reflection,
            content,
            importance: 8.0,
            tick,
            location: location.to_string(),
            related_agents: Vec::new(),
            source: None,
            origin_event: None,
            propagation_chain: Vec::new(),
        };
        self.reflection_charge.insert(agent.clone(), 0.0);
        // Importance range is fixed here, add cannot fail.
        self.add(agent, input).ok()
    }

    /// Snapshot views of the top memories for one agent.
    pub fn top_views(&self, agent: &AgentId, k: usize, as_of_tick: u64) -> Vec<MemoryView> {
        self.retrieve(agent, "", k, as_of_tick)
            .iter()
            .map(|s| MemoryView {
                id: s.record.id,
                kind: s.record.kind.as_str().to_string(),
                content: s.record.content.clone(),
                importance: s.record.importance,
                decayed_importance: s
                    .record
                    .decayed_importance(as_of_tick, self.config.importance_lambda),
                tick: s.record.tick,
                source: s.record.source.as_ref().map(|a| a.0.clone()),
                score: s.score,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        MemoryStore::new(MemoryConfig::default())
    }

    fn crew(n: u32) -> AgentId {
        AgentId::generate("Crew Member", n)
    }

    #[test]
    fn test_add_validates_importance() {
        let mut store = store();
        let agent = crew(1);
        assert!(store
            .add(&agent, MemoryInput::observation("saw a meteor", 5.0, 0))
            .is_ok());
        let err = store
            .add(&agent, MemoryInput::observation("impossible", 0.5, 0))
            .unwrap_err();
        assert!(matches!(err, SimError::Validation(_)));
        let err = store
            .add(&agent, MemoryInput::observation("impossible", 11.0, 0))
            .unwrap_err();
        assert!(matches!(err, SimError::Validation(_)));
        // Nothing partial was written
        assert_eq!(store.count(&agent), 1);
    }

    #[test]
    fn test_embedder_is_deterministic() {
        let embedder = HashEmbedder::new(128);
        let a = embedder.embed("the oxygen garden needs attention");
        let b = embedder.embed("the oxygen garden needs attention");
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_retrieval_prefers_similar_content() {
        let mut store = store();
        let agent = crew(1);
        store
            .add(&agent, MemoryInput::observation("checked the solar panels", 5.0, 10))
            .unwrap();
        store
            .add(&agent, MemoryInput::observation("water recycler filter replaced", 5.0, 10))
            .unwrap();

        let hits = store.retrieve(&agent, "solar panels inspection", 1, 10);
        assert_eq!(hits[0].record.content, "checked the solar panels");
    }

    #[test]
    fn test_retrieval_is_deterministic_and_tie_breaks_newer() {
        let mut store = store();
        let agent = crew(1);
        // Identical content and importance at different ticks
        store
            .add(&agent, MemoryInput::observation("routine check", 5.0, 1))
            .unwrap();
        store
            .add(&agent, MemoryInput::observation("unrelated thing entirely", 5.0, 2))
            .unwrap();
        store
            .add(&agent, MemoryInput::observation("routine check", 5.0, 3))
            .unwrap();

        let first = store.retrieve(&agent, "routine check", 3, 3);
        let second = store.retrieve(&agent, "routine check", 3, 3);
        let ids: Vec<u64> = first.iter().map(|s| s.record.id).collect();
        assert_eq!(ids, second.iter().map(|s| s.record.id).collect::<Vec<_>>());
        // Newer of the two identical records wins
        assert_eq!(first[0].record.tick, 3);
    }

    #[test]
    fn test_importance_decays_over_time() {
        let mut store = store();
        let agent = crew(1);
        store
            .add(&agent, MemoryInput::observation("launch day", 10.0, 0))
            .unwrap();
        let record = &store.stream(&agent)[0];
        let fresh = record.decayed_importance(0, 0.01);
        let aged = record.decayed_importance(200, 0.01);
        assert!((fresh - 10.0).abs() < 1e-5);
        assert!(aged < fresh);
        assert!(aged > 0.0);
    }

    #[test]
    fn test_reflection_fires_after_threshold() {
        let mut store = store();
        let agent = crew(1);
        // Default threshold is 30.0; four importance-8 memories cross it
        for i in 0..4 {
            store
                .add(
                    &agent,
                    MemoryInput::observation(format!("significant moment {}", i), 8.0, i),
                )
                .unwrap();
        }
        let id = store.maybe_reflect(&agent, 5, "Crew Quarters");
        assert!(id.is_some());
        let last = store.stream(&agent).last().unwrap();
        assert_eq!(last.kind, MemoryKind::Reflection);
        assert_eq!(last.importance, 8.0);

        // Charge resets, an immediate second reflection does not fire
        assert!(store.maybe_reflect(&agent, 5, "Crew Quarters").is_none());
    }

    #[test]
    fn test_knows_event_via_origin_tag() {
        let mut store = store();
        let agent = crew(1);
        store
            .add(
                &agent,
                MemoryInput::observation("heard about the supply shortage", 7.0, 4)
                    .kind(MemoryKind::Conversation)
                    .tracing_event("supply_shortage", vec![crew(2)]),
            )
            .unwrap();
        assert!(store.knows_event(&agent, "supply_shortage"));
        assert!(!store.knows_event(&agent, "crew_meeting"));
        assert_eq!(store.known_events(&agent), vec!["supply_shortage"]);
    }
}
