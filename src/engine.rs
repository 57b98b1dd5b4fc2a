//! # Chat Engine Core
//!
//! [`ChatEngine`] is the process-lifetime core that the transport layer and
//! both background loops operate through. It is constructed once at startup,
//! wrapped in an `Arc`, and handed into each loop and entry point by
//! explicit composition — there is no ambient/global lookup.
//!
//! ## Examples
//!
//! ```rust
//! use chat_engine::config::EngineConfig;
//! use chat_engine::engine::ChatEngine;
//! use chat_engine::queue::AdmissionDecision;
//! use chrono::NaiveTime;
//!
//! let engine = ChatEngine::new(EngineConfig::default()).unwrap();
//!
//! // Admit during office hours
//! let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
//! match engine.admit_at("customer-1", noon) {
//!     AdmissionDecision::Admitted(id) => {
//!         engine.record_poll(&id);
//!         assert_eq!(engine.all_sessions().len(), 1);
//!     }
//!     AdmissionDecision::Rejected => unreachable!("queue is empty"),
//! }
//! ```

use std::sync::Arc;

use chrono::{Local, NaiveTime};
use tracing::debug;

use crate::capacity;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::queue::{AdmissionDecision, ChatQueue, ChatSession, QueueStats, SessionId};
use crate::team::TeamDirectory;

/// System-wide counters exposed for monitoring
#[derive(Debug, Clone, Copy)]
pub struct EngineStats {
    /// Sessions waiting for an agent
    pub queued: usize,
    /// Active sessions (assigned or waiting)
    pub active_sessions: usize,
    /// Evicted sessions retained in the roster
    pub evicted_sessions: usize,
    /// Agents on the currently active team able to take another chat
    pub available_agents: usize,
}

/// The shared core: configuration, team directory, and session queue
pub struct ChatEngine {
    config: EngineConfig,
    directory: Arc<TeamDirectory>,
    queue: ChatQueue,
}

impl ChatEngine {
    /// Build the engine from configuration. Fails on an empty team roster.
    pub fn new(config: EngineConfig) -> Result<Self> {
        let directory = Arc::new(TeamDirectory::from_config(&config.teams)?);
        Ok(Self {
            config,
            directory,
            queue: ChatQueue::new(),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn directory(&self) -> &Arc<TeamDirectory> {
        &self.directory
    }

    pub fn queue(&self) -> &ChatQueue {
        &self.queue
    }

    /// Admit a chat request for `user_id` (local clock).
    ///
    /// Capacity is computed against the team on duty at call time. When no
    /// team is on duty the primary capacity is zero, so requests are
    /// rejected unless an earlier daytime overflow has already ratcheted
    /// the sticky ceiling above the current queue length — the raised
    /// ceiling applies for the life of the instance, shift coverage gaps
    /// included.
    pub fn admit(&self, user_id: &str) -> AdmissionDecision {
        self.admit_at(user_id, Local::now().time())
    }

    /// [`admit`](Self::admit) with an injected time-of-day
    pub fn admit_at(&self, user_id: &str, now: NaiveTime) -> AdmissionDecision {
        let (primary, daytime) = match self.directory.active_team_at(now) {
            Some(team) => (
                capacity::team_capacity(team),
                team.shift().shift_type().is_overflow_eligible(),
            ),
            None => {
                debug!("No team on duty at {}; admission rejected", now);
                (0, false)
            }
        };
        let overflow = self
            .directory
            .overflow_team()
            .map(capacity::team_capacity)
            .unwrap_or(0);

        self.queue.admit(
            user_id,
            primary,
            capacity::combined_ceiling(primary, overflow),
            daytime,
        )
    }

    /// Record a client poll; unknown or inactive sessions are a no-op
    pub fn record_poll(&self, id: &SessionId) {
        self.queue.record_poll(id);
    }

    /// Full roster in admission order, including evicted entries
    pub fn all_sessions(&self) -> Vec<ChatSession> {
        self.queue.all_sessions()
    }

    /// Active sessions in admission order
    pub fn active_sessions(&self) -> Vec<ChatSession> {
        self.queue.active_sessions()
    }

    /// Snapshot of a single session
    pub fn find_session(&self, id: &SessionId) -> Option<ChatSession> {
        self.queue.find(id)
    }

    /// Point-in-time system counters
    pub fn stats(&self) -> EngineStats {
        let QueueStats {
            queued,
            active,
            evicted,
            ..
        } = self.queue.stats();
        let available_agents = self
            .directory
            .active_team()
            .map(|t| t.available_agent_count())
            .unwrap_or(0);
        EngineStats {
            queued,
            active_sessions: active,
            evicted_sessions: evicted,
            available_agents,
        }
    }
}
