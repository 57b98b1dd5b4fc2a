//! # Allocator Loop
//!
//! The background control loop that drains the FIFO into agents. Each tick:
//!
//! 1. Resolve the team on duty; warn and skip the tick when no shift window
//!    covers the current time (self-heals once the clock moves on).
//! 2. During office hours, if no agent on the active team is available and
//!    the queue has reached primary capacity, borrow the overflow team for
//!    this tick only — nothing persistent changes.
//! 3. Walk agents in ascending skill-level ordinal (juniors first, a
//!    deliberate behavior hold) and give each available agent at most one
//!    session from the head of the queue.
//!
//! The agent slot is reserved with a CAS *before* the session is dequeued,
//! so a session is never considered assigned without a capacity debit and
//! an agent is never bound beyond its maximum. A reservation is handed back
//! when the queue turns out to be empty or the dequeued session was already
//! evicted (such sessions are dropped, never requeued).
//!
//! Tick failures are logged at the loop boundary and the loop continues.

use std::sync::Arc;

use chrono::{Local, NaiveTime};
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::agent::Agent;
use crate::capacity;
use crate::engine::ChatEngine;
use crate::error::Result;

/// The agent allocation control loop
pub struct AllocatorLoop;

impl AllocatorLoop {
    /// Run until `cancel` fires. The inter-tick wait is interruptible; a
    /// cancellation observed mid-wait exits promptly with no partial work
    /// (each bind is a complete unit).
    pub async fn run(engine: Arc<ChatEngine>, cancel: CancellationToken) {
        info!("🔄 Starting allocator loop for automatic chat distribution");
        let mut ticker = interval(engine.config().general.allocator_interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Allocator loop cancelled; exiting");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = Self::allocate_once(&engine) {
                        error!("Error in allocator tick: {}", e);
                    }
                }
            }
        }
    }

    /// One allocation pass against the local clock
    pub fn allocate_once(engine: &ChatEngine) -> Result<()> {
        Self::allocate_once_at(engine, Local::now().time())
    }

    /// One allocation pass at an injected time-of-day
    pub fn allocate_once_at(engine: &ChatEngine, now: NaiveTime) -> Result<()> {
        let directory = engine.directory();
        let Some(mut team) = directory.active_team_at(now) else {
            warn!("No active team found for the current time");
            return Ok(());
        };

        // Borrow the overflow team for this tick only
        let primary = capacity::team_capacity(team);
        if team.shift().shift_type().is_overflow_eligible()
            && !team.has_available_agent()
            && engine.queue().queue_len() >= primary
        {
            if let Some(overflow) = directory.overflow_team() {
                info!(
                    "Overflow team '{}' used for this tick ({} agents)",
                    overflow.name(),
                    overflow.agents().len()
                );
                team = overflow;
            }
        }

        // Ascending level ordinal: juniors get work first
        let mut agents: Vec<&Agent> = team.agents().iter().collect();
        agents.sort_by_key(|a| a.level());

        for agent in agents {
            if !agent.try_acquire() {
                debug!(
                    "Agent {} (level {:?}) is not available for chat",
                    agent.id(),
                    agent.level()
                );
                continue;
            }

            let Some(session_id) = engine.queue().dequeue() else {
                // Nothing left to assign; hand the reservation back
                agent.release();
                break;
            };

            if engine.queue().bind_agent(&session_id, agent.id().clone()) {
                info!("Agent {} assigned to chat {}", agent.id(), session_id);
            } else {
                // Dequeued a session that was evicted (or purged) while
                // waiting; drop it and hand the reservation back
                debug!("Dropping dequeued chat {} (no longer active)", session_id);
                agent.release();
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentLevel;
    use crate::config::{EngineConfig, TeamConfig};
    use crate::shift::ShiftType;

    fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    fn office_config(agents: Vec<AgentLevel>) -> EngineConfig {
        EngineConfig::default().with_teams(vec![TeamConfig {
            name: "Day".to_string(),
            shift_type: ShiftType::OfficeHours,
            start: hms(0, 0, 0),
            end: hms(23, 59, 59),
            agents,
        }])
    }

    #[test]
    fn assigns_queued_sessions_to_agents() {
        let engine = ChatEngine::new(office_config(vec![AgentLevel::Junior])).unwrap();
        let noon = hms(12, 0, 0);
        let id = engine
            .admit_at("alice", noon)
            .session_id()
            .cloned()
            .unwrap();

        AllocatorLoop::allocate_once_at(&engine, noon).unwrap();

        let session = engine.find_session(&id).unwrap();
        assert!(session.agent.is_some());
        let team = engine.directory().active_team_at(noon).unwrap();
        assert_eq!(team.agents()[0].current_sessions(), 1);
    }

    #[test]
    fn juniors_are_assigned_before_seniors() {
        let engine = ChatEngine::new(office_config(vec![
            AgentLevel::Senior,
            AgentLevel::Junior,
        ]))
        .unwrap();
        let noon = hms(12, 0, 0);
        let id = engine
            .admit_at("alice", noon)
            .session_id()
            .cloned()
            .unwrap();

        AllocatorLoop::allocate_once_at(&engine, noon).unwrap();

        let team = engine.directory().active_team_at(noon).unwrap();
        let junior = team
            .agents()
            .iter()
            .find(|a| a.level() == AgentLevel::Junior)
            .unwrap();
        let senior = team
            .agents()
            .iter()
            .find(|a| a.level() == AgentLevel::Senior)
            .unwrap();

        assert_eq!(junior.current_sessions(), 1);
        assert_eq!(senior.current_sessions(), 0);
        assert_eq!(
            engine.find_session(&id).unwrap().agent.as_ref(),
            Some(junior.id())
        );
    }

    #[test]
    fn each_agent_takes_at_most_one_session_per_tick() {
        let engine = ChatEngine::new(office_config(vec![AgentLevel::Junior])).unwrap();
        let noon = hms(12, 0, 0);
        for i in 0..3 {
            engine.admit_at(&format!("user-{i}"), noon);
        }

        AllocatorLoop::allocate_once_at(&engine, noon).unwrap();
        assert_eq!(engine.queue().queue_len(), 2);

        AllocatorLoop::allocate_once_at(&engine, noon).unwrap();
        assert_eq!(engine.queue().queue_len(), 1);
    }

    #[test]
    fn full_agent_is_skipped() {
        let engine = ChatEngine::new(office_config(vec![AgentLevel::Junior])).unwrap();
        let noon = hms(12, 0, 0);
        let team = engine.directory().active_team_at(noon).unwrap();
        let agent = &team.agents()[0];
        while agent.try_acquire() {}
        assert!(!agent.is_available());

        engine.admit_at("alice", noon);
        AllocatorLoop::allocate_once_at(&engine, noon).unwrap();

        // Session stays queued; capacity never exceeded
        assert_eq!(engine.queue().queue_len(), 1);
        assert_eq!(agent.current_sessions(), agent.max_sessions());
    }

    #[test]
    fn evicted_sessions_are_dropped_not_reassigned() {
        let config = office_config(vec![AgentLevel::Junior]);
        let staleness = config.general.staleness_threshold;
        let miss_limit = config.general.missed_poll_limit;
        let engine = ChatEngine::new(config).unwrap();
        let noon = hms(12, 0, 0);
        let id = engine
            .admit_at("alice", noon)
            .session_id()
            .cloned()
            .unwrap();

        // Evict while still queued
        let later = chrono::Utc::now() + chrono::TimeDelta::seconds(120);
        for _ in 0..miss_limit {
            engine
                .queue()
                .evict_stale_at(later, staleness, miss_limit, |_| {});
        }
        assert!(!engine.find_session(&id).unwrap().is_active);

        AllocatorLoop::allocate_once_at(&engine, noon).unwrap();

        // Dropped from the FIFO, never bound, no capacity consumed
        assert_eq!(engine.queue().queue_len(), 0);
        assert!(engine.find_session(&id).unwrap().agent.is_none());
        let team = engine.directory().active_team_at(noon).unwrap();
        assert_eq!(team.agents()[0].current_sessions(), 0);
    }

    #[test]
    fn overflow_team_borrowed_when_primary_is_saturated() {
        let primary_agents = vec![AgentLevel::Junior]; // capacity 6, max 4 chats
        let config = EngineConfig::default().with_teams(vec![
            TeamConfig {
                name: "Day".to_string(),
                shift_type: ShiftType::OfficeHours,
                start: hms(0, 0, 0),
                end: hms(23, 59, 59),
                agents: primary_agents,
            },
            TeamConfig {
                name: "Spill".to_string(),
                shift_type: ShiftType::Overflow,
                start: hms(0, 0, 0),
                end: hms(23, 59, 59),
                agents: vec![AgentLevel::Mid],
            },
        ]);
        let engine = ChatEngine::new(config).unwrap();
        let noon = hms(12, 0, 0);

        // Saturate the primary agent (4 slots) and fill the queue to primary
        // capacity (6)
        let team = engine.directory().active_team_at(noon).unwrap();
        let primary_agent = &team.agents()[0];
        while primary_agent.try_acquire() {}
        for i in 0..6 {
            assert!(engine.admit_at(&format!("user-{i}"), noon).is_admitted());
        }

        AllocatorLoop::allocate_once_at(&engine, noon).unwrap();

        // The overflow agent picked up one chat
        let overflow = engine.directory().overflow_team().unwrap();
        assert_eq!(overflow.agents()[0].current_sessions(), 1);
        assert_eq!(engine.queue().queue_len(), 5);
    }

    #[test]
    fn no_active_team_is_a_clean_noop() {
        let engine = ChatEngine::new(
            EngineConfig::default().with_teams(vec![TeamConfig {
                name: "Day".to_string(),
                shift_type: ShiftType::OfficeHours,
                start: hms(8, 0, 0),
                end: hms(16, 0, 0),
                agents: vec![AgentLevel::Mid],
            }]),
        )
        .unwrap();

        // 20:00 is outside the only window
        assert!(AllocatorLoop::allocate_once_at(&engine, hms(20, 0, 0)).is_ok());
    }
}
