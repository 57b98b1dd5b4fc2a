//! # Session Queue & Roster
//!
//! The admission-controlled heart of the engine. Two structures live here:
//!
//! - a strict FIFO of pending session ids, internally synchronized so the
//!   admission entry point and the allocator loop can append/remove
//!   concurrently, and
//! - the roster of every session ever admitted (active and evicted),
//!   indexed by [`SessionId`]. Per-session field updates go through the
//!   roster's sharded entry locks, so a poll racing the staleness sweep
//!   leaves the session either freshly polled or evicted, never corrupted.
//!
//! Admission is a synchronous capacity check plus FIFO append; it never
//! blocks. Concurrent admissions racing near the boundary may both observe a
//! length under the ceiling — a brief, bounded over-admission accepted by
//! design, since capacity is a soft staffing target rather than a hard
//! resource limit.
//!
//! Once a daytime admission spills past primary capacity, the effective
//! ceiling is ratcheted up to the combined overflow ceiling for the life of
//! the instance. It is never recomputed back down.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::agent::AgentId;

/// Unique identifier for a chat session
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a fresh random session ID
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A chat session record.
///
/// Owned exclusively by the [`ChatQueue`] roster for the process lifetime.
/// The `agent` field is a non-owning back-reference; clearing or keeping it
/// has no effect on agent lifetime.
#[derive(Debug, Clone)]
pub struct ChatSession {
    pub id: SessionId,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub last_polled_at: DateTime<Utc>,
    pub missed_polls: u32,
    pub is_active: bool,
    pub agent: Option<AgentId>,
}

impl ChatSession {
    fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: SessionId::new(),
            user_id: user_id.into(),
            created_at: now,
            last_polled_at: now,
            missed_polls: 0,
            is_active: true,
            agent: None,
        }
    }
}

/// Outcome of an admission attempt.
///
/// Rejection is an expected, frequent outcome — a value the caller checks,
/// never an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionDecision {
    /// The session was admitted and queued
    Admitted(SessionId),
    /// The queue is at capacity and no overflow applies
    Rejected,
}

impl AdmissionDecision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, AdmissionDecision::Admitted(_))
    }

    /// The admitted session id, if any
    pub fn session_id(&self) -> Option<&SessionId> {
        match self {
            AdmissionDecision::Admitted(id) => Some(id),
            AdmissionDecision::Rejected => None,
        }
    }
}

/// Point-in-time counters for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStats {
    /// Sessions waiting in the FIFO
    pub queued: usize,
    /// Active sessions in the roster
    pub active: usize,
    /// Evicted sessions still in the roster
    pub evicted: usize,
    /// Total roster size
    pub total: usize,
}

/// The bounded FIFO plus the full session roster
pub struct ChatQueue {
    /// Pending session ids in admission order
    fifo: Mutex<VecDeque<SessionId>>,

    /// Every session ever admitted, active or evicted
    roster: DashMap<SessionId, ChatSession>,

    /// Admission order of roster entries, for ordered listings
    order: Mutex<Vec<SessionId>>,

    /// Sticky raised ceiling; 0 until the first overflow admission
    raised_ceiling: AtomicUsize,
}

impl ChatQueue {
    pub fn new() -> Self {
        Self {
            fifo: Mutex::new(VecDeque::new()),
            roster: DashMap::new(),
            order: Mutex::new(Vec::new()),
            raised_ceiling: AtomicUsize::new(0),
        }
    }

    /// Number of sessions waiting in the FIFO
    pub fn queue_len(&self) -> usize {
        self.fifo.lock().len()
    }

    /// The effective capacity ceiling given the primary capacity computed
    /// for this admission: the sticky raised ceiling never drops back down.
    fn effective_ceiling(&self, primary: usize) -> usize {
        primary.max(self.raised_ceiling.load(Ordering::SeqCst))
    }

    /// Attempt to admit a new session.
    ///
    /// `primary` is the active team's capacity, `overflow_ceiling` the
    /// combined primary + overflow capacity, and `daytime` whether the
    /// active shift is overflow-eligible. The capacity check and the FIFO
    /// append are not one atomic unit; the resulting bounded over-admission
    /// under contention is accepted (see module docs).
    pub fn admit(
        &self,
        user_id: &str,
        primary: usize,
        overflow_ceiling: usize,
        daytime: bool,
    ) -> AdmissionDecision {
        self.admit_at(user_id, primary, overflow_ceiling, daytime, Utc::now())
    }

    /// [`admit`](Self::admit) with an injected timestamp
    pub fn admit_at(
        &self,
        user_id: &str,
        primary: usize,
        overflow_ceiling: usize,
        daytime: bool,
        now: DateTime<Utc>,
    ) -> AdmissionDecision {
        let len = self.queue_len();
        if len >= self.effective_ceiling(primary) {
            if !daytime {
                debug!("Admission rejected: queue at capacity outside office hours");
                return AdmissionDecision::Rejected;
            }
            // Degenerate configuration: overflow adds nothing
            if primary >= overflow_ceiling || len >= overflow_ceiling {
                debug!("Admission rejected: combined overflow ceiling reached");
                return AdmissionDecision::Rejected;
            }
            // One-way ratchet for the life of this instance
            self.raised_ceiling
                .fetch_max(overflow_ceiling, Ordering::SeqCst);
            info!(
                "Queue ceiling raised to overflow capacity {} (was {})",
                overflow_ceiling, primary
            );
        }

        let session = ChatSession::new(user_id, now);
        let id = session.id.clone();
        self.roster.insert(id.clone(), session);
        self.order.lock().push(id.clone());
        self.fifo.lock().push_back(id.clone());
        debug!("Admitted chat {} for user {}", id, user_id);
        AdmissionDecision::Admitted(id)
    }

    /// Remove and return the head of the FIFO. The roster entry stays.
    pub fn dequeue(&self) -> Option<SessionId> {
        self.fifo.lock().pop_front()
    }

    /// Snapshot of a session by id
    pub fn find(&self, id: &SessionId) -> Option<ChatSession> {
        self.roster.get(id).map(|entry| entry.clone())
    }

    /// All sessions in admission order, active and evicted
    pub fn all_sessions(&self) -> Vec<ChatSession> {
        let order = self.order.lock();
        order
            .iter()
            .filter_map(|id| self.roster.get(id).map(|e| e.clone()))
            .collect()
    }

    /// Active sessions in admission order
    pub fn active_sessions(&self) -> Vec<ChatSession> {
        self.all_sessions()
            .into_iter()
            .filter(|s| s.is_active)
            .collect()
    }

    /// Record a client poll: reset the miss counter and refresh the poll
    /// timestamp. Unknown or inactive sessions are a no-op.
    pub fn record_poll(&self, id: &SessionId) {
        self.record_poll_at(id, Utc::now());
    }

    /// [`record_poll`](Self::record_poll) with an injected timestamp
    pub fn record_poll_at(&self, id: &SessionId, now: DateTime<Utc>) {
        if let Some(mut entry) = self.roster.get_mut(id) {
            let session = entry.value_mut();
            if session.is_active {
                session.missed_polls = 0;
                session.last_polled_at = now;
            }
        }
    }

    /// Bind an agent to a session. Returns `false` if the session is
    /// unknown or no longer active; the active check runs under the roster
    /// entry lock, so a bind racing the staleness sweep either lands before
    /// the eviction (and the sweep releases the slot) or is refused (and
    /// the caller keeps the reservation to hand back). Does not touch agent
    /// load; the caller reserves the agent slot before binding so no
    /// session is ever considered assigned without a capacity debit.
    pub fn bind_agent(&self, id: &SessionId, agent_id: AgentId) -> bool {
        match self.roster.get_mut(id) {
            Some(mut entry) if entry.value().is_active => {
                entry.value_mut().agent = Some(agent_id);
                true
            }
            _ => false,
        }
    }

    /// Sweep all active sessions for staleness.
    ///
    /// A session idle longer than `staleness` accrues one missed poll per
    /// sweep; at `miss_limit` it is marked inactive (terminal) and
    /// `on_evict` is invoked with its bound agent, if any, while the roster
    /// entry lock is still held — eviction and capacity release form one
    /// logically atomic step and fire exactly once per session.
    ///
    /// Returns the number of sessions evicted by this sweep.
    pub fn evict_stale_at(
        &self,
        now: DateTime<Utc>,
        staleness: Duration,
        miss_limit: u32,
        mut on_evict: impl FnMut(&AgentId),
    ) -> usize {
        let ids: Vec<SessionId> = self.order.lock().clone();
        let mut evicted = 0;

        for id in ids {
            let Some(mut entry) = self.roster.get_mut(&id) else {
                continue;
            };
            let session = entry.value_mut();
            if !session.is_active {
                continue;
            }

            let idle = now
                .signed_duration_since(session.last_polled_at)
                .to_std()
                .unwrap_or_default();
            if idle <= staleness {
                continue;
            }

            session.missed_polls += 1;
            if session.missed_polls >= miss_limit {
                session.is_active = false;
                if let Some(agent_id) = session.agent.as_ref() {
                    on_evict(agent_id);
                }
                warn!(
                    "Chat {} marked inactive after {} missed polls",
                    id, session.missed_polls
                );
                evicted += 1;
            } else {
                warn!(
                    "Chat {} missed a poll ({}/{})",
                    id, session.missed_polls, miss_limit
                );
            }
        }

        evicted
    }

    /// Remove all inactive sessions from the roster. Never invoked by any
    /// loop; this is the manual hook against unbounded roster growth.
    pub fn purge_inactive(&self) -> usize {
        let mut order = self.order.lock();
        let before = order.len();
        self.roster.retain(|_, session| session.is_active);
        order.retain(|id| self.roster.contains_key(id));
        before - order.len()
    }

    /// Point-in-time counters
    pub fn stats(&self) -> QueueStats {
        let sessions = self.all_sessions();
        let active = sessions.iter().filter(|s| s.is_active).count();
        QueueStats {
            queued: self.queue_len(),
            active,
            evicted: sessions.len() - active,
            total: sessions.len(),
        }
    }
}

impl Default for ChatQueue {
    fn default() -> Self {
        Self::new()
    }
}
