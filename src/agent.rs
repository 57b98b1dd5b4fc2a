//! # Agent Types
//!
//! Agents are the human chat handlers. Each agent has a skill level with a
//! fixed efficiency coefficient, which in turn determines how many chats the
//! agent can hold concurrently. The live chat count is an atomic counter so
//! the allocator loop and the liveness monitor can mutate it from independent
//! tasks without external locking.
//!
//! ## Capacity Model
//!
//! | Level    | Efficiency | Max concurrent chats |
//! |----------|------------|----------------------|
//! | Junior   | 0.4        | 4                    |
//! | Mid      | 0.6        | 6                    |
//! | Senior   | 0.8        | 8                    |
//! | TeamLead | 0.5        | 5                    |
//!
//! Max capacity is `round(efficiency * 10)`.
//!
//! ## Examples
//!
//! ```rust
//! use chat_engine::agent::{Agent, AgentLevel};
//!
//! let agent = Agent::new(AgentLevel::Junior);
//! assert_eq!(agent.max_sessions(), 4);
//! assert!(agent.is_available());
//!
//! // Reserve all four slots
//! for _ in 0..4 {
//!     assert!(agent.try_acquire());
//! }
//! assert!(!agent.is_available());
//! assert!(!agent.try_acquire());
//!
//! // Releasing one slot makes the agent available again
//! agent.release();
//! assert_eq!(agent.current_sessions(), 3);
//! assert!(agent.is_available());
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an agent
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub String);

impl AgentId {
    /// Generate a fresh random agent ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AgentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Agent skill tiers, in ascending ordinal order.
///
/// The allocator assigns chats in this declaration order (juniors first).
/// The ordering is load-bearing: changing the declaration order changes
/// assignment priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgentLevel {
    Junior,
    Mid,
    Senior,
    TeamLead,
}

impl AgentLevel {
    /// Per-level throughput coefficient used for capacity sizing
    pub fn efficiency(&self) -> f64 {
        match self {
            AgentLevel::Junior => 0.4,
            AgentLevel::Mid => 0.6,
            AgentLevel::Senior => 0.8,
            AgentLevel::TeamLead => 0.5,
        }
    }
}

/// A human chat agent with an atomic concurrent-session counter.
///
/// Agents are owned by their [`Team`](crate::team::Team) for the process
/// lifetime; sessions refer back to them by [`AgentId`] only.
#[derive(Debug)]
pub struct Agent {
    id: AgentId,
    level: AgentLevel,
    current_sessions: AtomicU32,
}

impl Agent {
    /// Create an agent with a generated ID
    pub fn new(level: AgentLevel) -> Self {
        Self::with_id(AgentId::new(), level)
    }

    /// Create an agent with an explicit ID (useful for tests and config)
    pub fn with_id(id: AgentId, level: AgentLevel) -> Self {
        Self {
            id,
            level,
            current_sessions: AtomicU32::new(0),
        }
    }

    /// Agent identity
    pub fn id(&self) -> &AgentId {
        &self.id
    }

    /// Skill level
    pub fn level(&self) -> AgentLevel {
        self.level
    }

    /// Maximum concurrent sessions: `round(efficiency * 10)`
    pub fn max_sessions(&self) -> u32 {
        (self.level.efficiency() * 10.0).round() as u32
    }

    /// Current number of bound sessions
    pub fn current_sessions(&self) -> u32 {
        self.current_sessions.load(Ordering::SeqCst)
    }

    /// Whether the agent can take another chat
    pub fn is_available(&self) -> bool {
        self.current_sessions() < self.max_sessions()
    }

    /// Atomically reserve one session slot.
    ///
    /// Returns `false` if the agent is already at capacity. The CAS loop
    /// guarantees the counter never exceeds [`max_sessions`](Self::max_sessions)
    /// even with the allocator and monitor running concurrently.
    pub fn try_acquire(&self) -> bool {
        let max = self.max_sessions();
        self.current_sessions
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                if n < max {
                    Some(n + 1)
                } else {
                    None
                }
            })
            .is_ok()
    }

    /// Release one session slot. Saturates at zero.
    pub fn release(&self) {
        let _ = self
            .current_sessions
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_sessions_follows_efficiency() {
        assert_eq!(Agent::new(AgentLevel::Junior).max_sessions(), 4);
        assert_eq!(Agent::new(AgentLevel::Mid).max_sessions(), 6);
        assert_eq!(Agent::new(AgentLevel::Senior).max_sessions(), 8);
        assert_eq!(Agent::new(AgentLevel::TeamLead).max_sessions(), 5);
    }

    #[test]
    fn acquire_stops_at_capacity() {
        let agent = Agent::new(AgentLevel::Junior);
        for _ in 0..4 {
            assert!(agent.try_acquire());
        }
        assert!(!agent.try_acquire());
        assert_eq!(agent.current_sessions(), 4);
        assert!(!agent.is_available());
    }

    #[test]
    fn release_never_goes_below_zero() {
        let agent = Agent::new(AgentLevel::Mid);
        agent.release();
        assert_eq!(agent.current_sessions(), 0);

        assert!(agent.try_acquire());
        agent.release();
        agent.release();
        assert_eq!(agent.current_sessions(), 0);
    }

    #[test]
    fn busy_agent_becomes_available_after_release() {
        // The max=4 scenario: full agent reports unavailable, one release
        // brings it back
        let agent = Agent::new(AgentLevel::Junior);
        for _ in 0..4 {
            assert!(agent.try_acquire());
        }
        assert!(!agent.is_available());

        agent.release();
        assert_eq!(agent.current_sessions(), 3);
        assert!(agent.is_available());
    }

    #[test]
    fn level_ordinal_order_is_junior_first() {
        // Assignment priority depends on this ordering
        let mut levels = vec![
            AgentLevel::TeamLead,
            AgentLevel::Senior,
            AgentLevel::Junior,
            AgentLevel::Mid,
        ];
        levels.sort();
        assert_eq!(
            levels,
            vec![
                AgentLevel::Junior,
                AgentLevel::Mid,
                AgentLevel::Senior,
                AgentLevel::TeamLead,
            ]
        );
    }
}
