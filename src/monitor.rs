//! # Liveness Monitor Loop
//!
//! The background control loop that evicts sessions whose clients stopped
//! polling. Each tick sweeps the active roster: sessions idle past the
//! staleness threshold accrue one missed poll, and at the configured limit
//! they are marked inactive (terminal) with the bound agent's capacity
//! handed back in the same entry-locked step — an eviction can never leak a
//! slot by releasing twice or not at all.
//!
//! Capacity release goes through
//! [`TeamDirectory::release_agent_at`](crate::team::TeamDirectory::release_agent_at),
//! which looks only at the currently active team and silently no-ops after
//! a shift change (a deliberate behavior hold, see DESIGN.md).
//!
//! Every tenth tick the monitor logs a status summary, so an idle deployment
//! still shows a heartbeat in the logs.

use std::sync::Arc;

use chrono::{Local, NaiveTime, Utc};
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::engine::ChatEngine;
use crate::error::Result;

/// Log a status summary every this many ticks
const STATUS_LOG_EVERY: u64 = 10;

/// The liveness monitoring control loop
pub struct LivenessMonitor;

impl LivenessMonitor {
    /// Run until `cancel` fires. The inter-tick wait is interruptible, and
    /// every per-session mutation inside a tick is a complete unit of work.
    pub async fn run(engine: Arc<ChatEngine>, cancel: CancellationToken) {
        info!("👀 Starting liveness monitor loop");
        let mut ticker = interval(engine.config().general.monitor_interval);
        let mut ticks: u64 = 0;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Liveness monitor cancelled; exiting");
                    break;
                }
                _ = ticker.tick() => {
                    ticks += 1;
                    if let Err(e) = Self::sweep_once(&engine) {
                        error!("Error in liveness sweep: {}", e);
                    }
                    if ticks % STATUS_LOG_EVERY == 0 {
                        let stats = engine.stats();
                        info!(
                            "📊 Status - queued: {}, active: {}, evicted: {}, agents available: {}",
                            stats.queued,
                            stats.active_sessions,
                            stats.evicted_sessions,
                            stats.available_agents
                        );
                    }
                }
            }
        }
    }

    /// One staleness sweep against the local clock
    pub fn sweep_once(engine: &ChatEngine) -> Result<()> {
        Self::sweep_once_at(engine, Utc::now(), Local::now().time())
    }

    /// One staleness sweep with injected timestamps. `now` drives staleness
    /// arithmetic; `time_of_day` drives the team lookup for capacity release.
    pub fn sweep_once_at(
        engine: &ChatEngine,
        now: chrono::DateTime<Utc>,
        time_of_day: NaiveTime,
    ) -> Result<()> {
        let general = &engine.config().general;
        let directory = engine.directory().clone();

        let evicted = engine.queue().evict_stale_at(
            now,
            general.staleness_threshold,
            general.missed_poll_limit,
            |agent_id| directory.release_agent_at(agent_id, time_of_day),
        );

        if evicted > 0 {
            info!("Evicted {} stale chat session(s)", evicted);
        }
        Ok(())
    }
}
