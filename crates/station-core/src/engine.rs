//! Simulation Engine
//!
//! Drives the tick loop. Each tick advances station time, regenerates
//! plans at the sol boundary, builds a frozen perception context for
//! every agent, fans the reasoning calls out concurrently under a
//! timeout, then commits the decisions one at a time in registration
//! order against the single world state. A failed or timed-out
//! reasoning call costs that agent its turn (it rests), never the tick.
//!
//! After the commit phase the occupancy invariant is checked; a
//! violation rolls the whole tick back to the pre-tick snapshot and
//! retries once before surfacing as fatal.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::agent::AgentId;
use crate::analytics::PropagationTracker;
use crate::config::SimConfig;
use crate::error::SimError;
use crate::events::{EventInjector, StationEvent};
use crate::memory::{MemoryInput, MemoryKind, MemoryStore};
use crate::perception::{build_context, DecisionContext};
use crate::planner::generate_daily_plan;
use crate::reasoning::{Decision, ReasoningAdapter};
use crate::relationship::{InteractionOutcome, RelationshipTracker};
use crate::setup::{create_crew, create_station_map};
use crate::world::WorldState;
use station_events::{
    ActionKind, ActivityRecord, AgentView, PropagationReport, SimTime, WorldSnapshot,
};

/// Lifecycle of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunState {
    Stopped = 0,
    Running = 1,
    Paused = 2,
}

impl RunState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => RunState::Running,
            2 => RunState::Paused,
            _ => RunState::Stopped,
        }
    }
}

/// Shared handle for pausing, resuming, and stopping a running engine
/// from another task.
#[derive(Debug, Clone, Default)]
pub struct ControlHandle {
    state: Arc<AtomicU8>,
}

impl ControlHandle {
    pub fn state(&self) -> RunState {
        RunState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn pause(&self) {
        // Pausing a stopped engine is a no-op
        let _ = self.state.compare_exchange(
            RunState::Running as u8,
            RunState::Paused as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }

    pub fn resume(&self) {
        let _ = self.state.compare_exchange(
            RunState::Paused as u8,
            RunState::Running as u8,
            Ordering::SeqCst,
            Ordering::SeqCst,
        );
    }

    pub fn stop(&self) {
        self.state.store(RunState::Stopped as u8, Ordering::SeqCst);
    }

    fn set_running(&self) {
        self.state.store(RunState::Running as u8, Ordering::SeqCst);
    }
}

/// Everything that mutates during a tick, cloneable as one unit so a
/// failed tick can be rolled back wholesale.
#[derive(Clone)]
struct SimState {
    world: WorldState,
    memories: MemoryStore,
    relationships: RelationshipTracker,
    tracker: PropagationTracker,
}

pub struct SimulationEngine {
    config: SimConfig,
    seed: u64,
    adapter: Arc<dyn ReasoningAdapter>,
    state: SimState,
    injector: EventInjector,
    control: ControlHandle,
}

impl SimulationEngine {
    /// Builds an engine with the standard station and crew.
    pub fn new(config: SimConfig, seed: u64, adapter: Arc<dyn ReasoningAdapter>) -> Result<Self, SimError> {
        config.validate()?;
        let mut world = WorldState::new(
            create_station_map(),
            config.simulation.ticks_per_sol,
            config.simulation.activity_feed_limit,
        );
        for agent in create_crew(seed) {
            world.spawn(agent)?;
        }
        world.check_invariants()?;

        Ok(Self {
            state: SimState {
                world,
                memories: MemoryStore::new(config.memory.clone()),
                relationships: RelationshipTracker::new(config.relationship.clone()),
                tracker: PropagationTracker::new(),
            },
            injector: EventInjector::new(),
            control: ControlHandle::default(),
            config,
            seed,
            adapter,
        })
    }

    pub fn control_handle(&self) -> ControlHandle {
        self.control.clone()
    }

    pub fn time(&self) -> SimTime {
        self.state.world.time
    }

    pub fn world_snapshot(&self) -> WorldSnapshot {
        let mut snapshot = self.state.world.snapshot();
        snapshot.is_running = self.control.state() == RunState::Running;
        snapshot
    }

    /// Full view of one agent: state, top memories, relationships, plan.
    pub fn agent_view(&self, target: &str) -> Result<AgentView, SimError> {
        let id = self
            .state
            .world
            .resolve_agent(target)
            .cloned()
            .ok_or_else(|| SimError::UnknownAgent(target.to_string()))?;
        let agent = self.state.world.agent(&id)?;
        Ok(AgentView {
            agent: crate::world::agent_snapshot(agent),
            top_memories: self.state.memories.top_views(
                &id,
                self.config.memory.retrieval_k,
                self.state.world.time.tick,
            ),
            relationships: self.state.relationships.snapshot_for(&id),
            plan: agent.plan.snapshot(),
        })
    }

    /// Triggers a catalog event.
    pub fn trigger_event(&mut self, event_id: &str) -> Result<AgentId, SimError> {
        self.injector.trigger(
            event_id,
            &self.state.world,
            &mut self.state.memories,
            &mut self.state.tracker,
        )
    }

    /// Injects a custom event.
    pub fn inject_event(&mut self, event: &StationEvent) -> Result<AgentId, SimError> {
        self.injector.inject(
            event,
            &self.state.world,
            &mut self.state.memories,
            &mut self.state.tracker,
        )
    }

    pub fn trace_propagation(&self, event_id: &str) -> PropagationReport {
        self.state.tracker.trace(event_id)
    }

    pub fn event_catalog(&self) -> &[StationEvent] {
        self.injector.catalog()
    }

    /// Bounded live activity feed.
    pub fn activity_feed(&self) -> &[ActivityRecord] {
        self.state.world.feed()
    }

    /// Full activity history for the run.
    pub fn activity_history(&self) -> &[ActivityRecord] {
        self.state.world.history()
    }

    /// Runs for the given number of ticks, honoring the control handle
    /// and pacing ticks by the configured interval.
    pub async fn run(&mut self, ticks: u64) -> Result<(), SimError> {
        self.control.set_running();
        self.state.world.is_running = true;
        info!(ticks, seed = self.seed, "simulation starting");

        let mut remaining = ticks;
        while remaining > 0 {
            match self.control.state() {
                RunState::Stopped => break,
                RunState::Paused => {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    continue;
                }
                RunState::Running => {}
            }
            self.step().await?;
            remaining -= 1;
            if remaining > 0 && self.config.simulation.tick_interval_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.simulation.tick_interval_ms))
                    .await;
            }
        }

        self.control.stop();
        self.state.world.is_running = false;
        info!(tick = self.state.world.time.tick, "simulation stopped");
        Ok(())
    }

    /// Advances the simulation by exactly one tick.
    pub async fn step(&mut self) -> Result<(), SimError> {
        let checkpoint = self.state.clone();
        match self.run_tick().await {
            Ok(()) => Ok(()),
            Err(err) if matches!(err, SimError::InvariantViolation(_)) => {
                warn!(%err, "tick failed consistency check, retrying from checkpoint");
                self.state = checkpoint.clone();
                match self.run_tick().await {
                    Ok(()) => Ok(()),
                    Err(retry_err) => {
                        self.state = checkpoint;
                        Err(retry_err)
                    }
                }
            }
            Err(err) => {
                self.state = checkpoint;
                Err(err)
            }
        }
    }

    async fn run_tick(&mut self) -> Result<(), SimError> {
        let previous_sol = self.state.world.time.clock.sol;
        let next_tick = self.state.world.time.tick + 1;
        self.state.world.time = SimTime::from_tick(next_tick, self.config.simulation.ticks_per_sol);
        let time = self.state.world.time;

        // New sol: yesterday's plans are discarded, never carried over
        if time.clock.sol != previous_sol {
            debug!(sol = time.clock.sol, "sol boundary, regenerating plans");
            let roster: Vec<AgentId> = self.state.world.roster().to_vec();
            for id in roster {
                let role = self.state.world.agent(&id)?.role;
                let plan = generate_daily_plan(self.seed, &id, role, time.clock.sol);
                self.state.world.agent_mut(&id)?.plan = plan;
            }
        }

        // Perception phase: every agent sees the same frozen world
        let roster: Vec<AgentId> = self.state.world.roster().to_vec();
        let mut contexts = Vec::with_capacity(roster.len());
        for id in &roster {
            contexts.push(build_context(
                id,
                &self.state.world,
                &self.state.memories,
                &self.state.relationships,
                self.config.memory.retrieval_k,
            )?);
        }

        // Reasoning phase: concurrent, each call under the timeout
        let decisions = self.collect_decisions(contexts).await;

        // Commit phase: serial, in registration order
        let mut conversed: HashSet<(AgentId, AgentId)> = HashSet::new();
        for (id, outcome) in roster.iter().zip(decisions) {
            match outcome {
                Ok(decision) => self.commit_decision(id, decision, &mut conversed)?,
                Err(err) => {
                    debug!(agent = %id, %err, "reasoning failed, agent rests");
                    self.commit_forced_rest(id, &err)?;
                }
            }
        }

        // Housekeeping: mood, reflections
        for id in &roster {
            let (tired, exhausted) = (
                self.config.energy.tired_threshold,
                self.config.energy.exhausted_threshold,
            );
            let agent = self.state.world.agent_mut(id)?;
            agent.refresh_mood(tired, exhausted);
            let location = agent.location.clone();
            self.state.memories.maybe_reflect(id, time.tick, &location);
        }

        self.state.world.check_invariants()?;
        debug!(tick = time.tick, clock = %time.clock, "tick committed");
        Ok(())
    }

    async fn collect_decisions(
        &self,
        contexts: Vec<DecisionContext>,
    ) -> Vec<Result<Decision, SimError>> {
        let timeout = Duration::from_millis(self.config.reasoning.timeout_ms);
        let count = contexts.len();
        let mut join_set = JoinSet::new();
        for (index, ctx) in contexts.into_iter().enumerate() {
            let adapter = Arc::clone(&self.adapter);
            join_set.spawn(async move {
                let agent = ctx.agent_name.clone();
                let result = match tokio::time::timeout(timeout, adapter.decide(&ctx)).await {
                    Ok(result) => result,
                    Err(_) => Err(SimError::ReasoningTimeout {
                        agent,
                        timeout_ms: timeout.as_millis() as u64,
                    }),
                };
                (index, result)
            });
        }

        let mut decisions: Vec<Result<Decision, SimError>> = Vec::new();
        decisions.resize_with(count, || Ok(Decision::rest()));
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((index, result)) => decisions[index] = result,
                Err(join_err) => {
                    // A panicked adapter task cannot be attributed to an
                    // index, so it is logged and the default rest stands.
                    warn!(%join_err, "reasoning task panicked");
                }
            }
        }
        decisions
    }

    fn commit_decision(
        &mut self,
        id: &AgentId,
        decision: Decision,
        conversed: &mut HashSet<(AgentId, AgentId)>,
    ) -> Result<(), SimError> {
        match decision.action {
            ActionKind::Move => self.commit_move(id, decision),
            ActionKind::Talk => self.commit_talk(id, decision, conversed),
            ActionKind::Work => self.commit_work(id, decision),
            ActionKind::Rest => self.commit_rest(id, decision),
            ActionKind::Observe => self.commit_observe(id, decision),
        }
    }

    fn commit_move(&mut self, id: &AgentId, decision: Decision) -> Result<(), SimError> {
        let time = self.state.world.time;
        let target = decision.target.clone().unwrap_or_default();
        match self.state.world.move_agent(id, &target) {
            Ok(()) => {
                let agent = self.state.world.agent_mut(id)?;
                agent.activity = format!("moving to {}", agent.location);
                let record = self.base_record(id, ActionKind::Move, format!("Moved to {}", self.state.world.agent(id)?.location), time, decision.thought)?;
                self.state.world.record_activity(record);
                Ok(())
            }
            Err(err) if err.is_action_local() => {
                // Bad destination costs the turn, not the tick
                let record = self
                    .base_record(
                        id,
                        ActionKind::Observe,
                        format!("Could not move: {}", err),
                        time,
                        decision.thought,
                    )?
                    .failed();
                self.state.world.record_activity(record);
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn commit_talk(
        &mut self,
        id: &AgentId,
        decision: Decision,
        conversed: &mut HashSet<(AgentId, AgentId)>,
    ) -> Result<(), SimError> {
        let time = self.state.world.time;
        let target = decision.target.clone().unwrap_or_default();

        let Some(listener) = self.state.world.resolve_agent(&target).cloned() else {
            let record = self
                .base_record(
                    id,
                    ActionKind::Observe,
                    format!("Looked for {} but no such crew member exists", target),
                    time,
                    decision.thought,
                )?
                .failed();
            self.state.world.record_activity(record);
            return Ok(());
        };

        // Talking to someone elsewhere degrades to observing; the
        // intent is recorded as a soft failure
        let co_located = self.state.world.co_located(id)?.contains(&listener);
        if !co_located || listener == *id {
            let listener_name = self.state.world.agent(&listener)?.name.clone();
            let record = self
                .base_record(
                    id,
                    ActionKind::Observe,
                    format!("Wanted to talk to {} but they are not here", listener_name),
                    time,
                    decision.thought,
                )?
                .failed();
            self.state.world.record_activity(record);
            return Ok(());
        }

        // Each pair converses once per tick; the mirrored decision
        // becomes a quiet continuation
        let pair = if id <= &listener {
            (id.clone(), listener.clone())
        } else {
            (listener.clone(), id.clone())
        };
        if conversed.contains(&pair) {
            let listener_name = self.state.world.agent(&listener)?.name.clone();
            let record = self.base_record(
                id,
                ActionKind::Observe,
                format!("Continued the conversation with {}", listener_name),
                time,
                decision.thought,
            )?;
            self.state.world.record_activity(record);
            return Ok(());
        }
        conversed.insert(pair);

        let dialogue = decision
            .dialogue
            .clone()
            .unwrap_or_else(|| "...".to_string());
        let speaker_name = self.state.world.agent(id)?.name.clone();
        let listener_name = self.state.world.agent(&listener)?.name.clone();
        let location = self.state.world.agent(id)?.location.clone();

        // Both participants remember the exchange on the same tick. The
        // listener's record is the stronger one: hearing something new
        // lands harder than saying it.
        self.state.memories.add(
            id,
            MemoryInput {
                kind: MemoryKind::Conversation,
                content: format!("I told {}: \"{}\"", listener_name, dialogue),
                importance: 5.0,
                tick: time.tick,
                location: location.clone(),
                related_agents: vec![listener.clone()],
                source: None,
                origin_event: None,
                propagation_chain: Vec::new(),
            },
        )?;

        // Only the first piece of injected information the listener
        // lacks passes in one exchange; the rest waits for a later
        // conversation. The acquisition record and the tagged listener
        // memory always travel together, so the trace never claims
        // knowledge the listener cannot retell.
        let mut passed_event: Option<(String, Vec<AgentId>)> = None;
        for event_id in self.state.memories.known_events(id) {
            if self.state.memories.knows_event(&listener, &event_id) {
                continue;
            }
            self.state.tracker.record_acquisition(
                &event_id,
                &listener,
                &listener_name,
                id,
                time.tick,
            );
            let mut chain = self
                .state
                .memories
                .stream(id)
                .iter()
                .find(|m| m.origin_event.as_deref() == Some(event_id.as_str()))
                .map(|m| m.propagation_chain.clone())
                .unwrap_or_default();
            if chain.last() != Some(id) {
                chain.push(id.clone());
            }
            chain.push(listener.clone());
            passed_event = Some((event_id, chain));
            break;
        }

        let (origin_event, propagation_chain) = match passed_event {
            Some((event, chain)) => (Some(event), chain),
            None => (None, Vec::new()),
        };
        self.state.memories.add(
            &listener,
            MemoryInput {
                kind: MemoryKind::Conversation,
                content: format!("{} told me: \"{}\"", speaker_name, dialogue),
                importance: 7.0,
                tick: time.tick,
                location,
                related_agents: vec![id.clone()],
                source: Some(id.clone()),
                origin_event,
                propagation_chain,
            },
        )?;

        self.state
            .relationships
            .update(id, &listener, InteractionOutcome::Positive, time.tick);

        {
            let agent = self.state.world.agent_mut(id)?;
            agent.activity = format!("talking to {}", listener_name);
        }
        let record = self.base_record(
            id,
            ActionKind::Talk,
            format!("Said to {}: \"{}\"", listener_name, dialogue),
            time,
            decision.thought,
        )?;
        self.state.world.record_activity(record);
        Ok(())
    }

    fn commit_work(&mut self, id: &AgentId, decision: Decision) -> Result<(), SimError> {
        let time = self.state.world.time;
        let work_cost = self.config.energy.work_cost;
        let description = {
            let agent = self.state.world.agent_mut(id)?;
            agent.spend_energy(work_cost);
            let description = agent
                .plan
                .current_entry(time.clock.hour, time.clock.minute)
                .map(|e| e.description.clone())
                .unwrap_or_else(|| "station duties".to_string());
            agent.activity = format!("working: {}", description);
            agent.plan.mark_completed(time.clock.hour, time.clock.minute);
            description
        };
        let record = self.base_record(
            id,
            ActionKind::Work,
            format!("Working on {}", description),
            time,
            decision.thought,
        )?;
        self.state.world.record_activity(record);
        Ok(())
    }

    fn commit_rest(&mut self, id: &AgentId, decision: Decision) -> Result<(), SimError> {
        let time = self.state.world.time;
        let rest_gain = self.config.energy.rest_gain;
        {
            let agent = self.state.world.agent_mut(id)?;
            agent.recover_energy(rest_gain);
            agent.activity = "resting".to_string();
        }
        let record =
            self.base_record(id, ActionKind::Rest, "Resting", time, decision.thought)?;
        self.state.world.record_activity(record);
        Ok(())
    }

    fn commit_observe(&mut self, id: &AgentId, decision: Decision) -> Result<(), SimError> {
        let time = self.state.world.time;
        let (location, others) = {
            let agent = self.state.world.agent(id)?;
            (agent.location.clone(), self.state.world.co_located(id)?)
        };
        let details = if others.is_empty() {
            format!("Observing the quiet {}", location)
        } else {
            format!("Observing activity in the {}", location)
        };

        // Observations feed the memory stream at modest importance
        self.state.memories.add(
            id,
            MemoryInput::observation(details.clone(), 3.0, time.tick)
                .at(location)
                .involving(others),
        )?;
        {
            let agent = self.state.world.agent_mut(id)?;
            agent.activity = "observing".to_string();
        }
        let record =
            self.base_record(id, ActionKind::Observe, details, time, decision.thought)?;
        self.state.world.record_activity(record);
        Ok(())
    }

    /// A reasoning failure defaults the agent to rest for the tick.
    fn commit_forced_rest(&mut self, id: &AgentId, err: &SimError) -> Result<(), SimError> {
        let time = self.state.world.time;
        let rest_gain = self.config.energy.rest_gain;
        {
            let agent = self.state.world.agent_mut(id)?;
            agent.recover_energy(rest_gain);
            agent.activity = "resting".to_string();
        }
        let record = self
            .base_record(id, ActionKind::Rest, format!("Resting ({})", err), time, None)?
            .failed();
        self.state.world.record_activity(record);
        Ok(())
    }

    fn base_record(
        &self,
        id: &AgentId,
        action: ActionKind,
        details: impl Into<String>,
        time: SimTime,
        thought: Option<String>,
    ) -> Result<ActivityRecord, SimError> {
        let agent = self.state.world.agent(id)?;
        let mut record = ActivityRecord::new(
            id.as_str(),
            agent.name.clone(),
            action,
            agent.location.clone(),
            details,
            time,
        );
        if let Some(thought) = thought {
            record = record.with_thought(thought);
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reasoning::{ScriptedAdapter, TalkativeAdapter};

    fn engine() -> SimulationEngine {
        let mut config = SimConfig::default();
        config.simulation.tick_interval_ms = 0;
        SimulationEngine::new(config, 42, Arc::new(ScriptedAdapter)).unwrap()
    }

    #[tokio::test]
    async fn test_step_advances_time_and_keeps_invariants() {
        let mut engine = engine();
        assert_eq!(engine.time().tick, 0);
        engine.step().await.unwrap();
        assert_eq!(engine.time().tick, 1);
        let snapshot = engine.world_snapshot();
        assert_eq!(snapshot.agents.len(), 8);
        // Occupancy is the exact inverse of agent locations
        for agent in &snapshot.agents {
            assert!(snapshot.occupancy[&agent.location].contains(&agent.agent_id));
        }
    }

    #[tokio::test]
    async fn test_run_honors_tick_count_and_stops() {
        let mut engine = engine();
        engine.run(5).await.unwrap();
        assert_eq!(engine.time().tick, 5);
        assert_eq!(engine.control_handle().state(), RunState::Stopped);
        assert!(!engine.world_snapshot().is_running);
    }

    #[test]
    fn test_control_handle_transitions() {
        let control = ControlHandle::default();
        assert_eq!(control.state(), RunState::Stopped);
        // Pausing a stopped engine stays stopped
        control.pause();
        assert_eq!(control.state(), RunState::Stopped);
        control.set_running();
        control.pause();
        assert_eq!(control.state(), RunState::Paused);
        control.resume();
        assert_eq!(control.state(), RunState::Running);
        control.stop();
        assert_eq!(control.state(), RunState::Stopped);
    }

    #[tokio::test]
    async fn test_sol_boundary_regenerates_plans() {
        let mut engine = engine();
        let sharma = AgentId::generate("Cdr. Vikram Sharma", 1);
        // Run across the sol boundary (ticks_per_sol = 24)
        for _ in 0..25 {
            engine.step().await.unwrap();
        }
        assert_eq!(engine.time().clock.sol, 2);
        assert_eq!(engine.state.world.agent(&sharma).unwrap().plan.sol, 2);
    }

    #[tokio::test]
    async fn test_one_event_passes_per_conversation() {
        let mut config = SimConfig::default();
        config.simulation.tick_interval_ms = 0;
        let mut engine = SimulationEngine::new(config, 42, Arc::new(TalkativeAdapter)).unwrap();

        // Sharma holds two injected events before anyone hears him
        engine.trigger_event("crew_meeting").unwrap();
        let briefing = StationEvent {
            id: "sealed_briefing".to_string(),
            name: "Sealed Briefing".to_string(),
            description: "Private orders from Earth".to_string(),
            target_agent: "Cdr. Vikram Sharma".to_string(),
            content: "Earth sent sealed orders for the next supply window.".to_string(),
            importance: 8.0,
        };
        engine.inject_event(&briefing).unwrap();

        // TARA shares Mission Control with Sharma and hears him every tick
        let tara = AgentId::generate("TARA", 3);
        engine.step().await.unwrap();
        assert!(engine.state.memories.knows_event(&tara, "crew_meeting"));
        assert!(!engine.state.memories.knows_event(&tara, "sealed_briefing"));
        assert!(engine
            .trace_propagation("sealed_briefing")
            .acquisition_for(tara.as_str())
            .is_none());

        // The second conversation carries the remaining event; the
        // trace stays in lockstep with the memories backing it
        engine.step().await.unwrap();
        assert!(engine.state.memories.knows_event(&tara, "sealed_briefing"));
        let report = engine.trace_propagation("sealed_briefing");
        let acq = report.acquisition_for(tara.as_str()).unwrap();
        assert_eq!(acq.tick, 2);
        assert_eq!(acq.from.as_deref(), Some("agent_vikram_0001"));
    }

    #[tokio::test]
    async fn test_scripted_crew_follows_plan() {
        let mut engine = engine();
        // By 09:00 the morning work slot has been reached and settled into
        for _ in 0..9 {
            engine.step().await.unwrap();
        }
        let view = engine.agent_view("Dr. Ananya Iyer").unwrap();
        assert_eq!(view.agent.location, "Agri Lab");
        assert!(view.agent.activity.starts_with("working"));
    }
}
