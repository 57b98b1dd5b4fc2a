//! # Engine Configuration
//!
//! Configuration is fixed at process start and not hot-reloadable. It covers
//! the two background loop cadences, the liveness thresholds, and the team
//! roster (name, shift window, agent levels per team).
//!
//! The default configuration reproduces a four-team deployment: a daytime
//! team (08:00-16:00), a night team (17:00-00:00, wrapping), an
//! early-morning team (00:00-08:00), and a junior-staffed overflow team
//! reachable only through daytime overflow. Note the default windows leave
//! 16:00-17:00 uncovered; full-day coverage is the operator's responsibility
//! and the loops log a warning per tick while no team is on duty.
//!
//! # Examples
//!
//! ```rust
//! use chat_engine::config::EngineConfig;
//! use std::time::Duration;
//!
//! let config = EngineConfig::default()
//!     .with_allocator_interval(Duration::from_millis(250))
//!     .with_staleness_threshold(Duration::from_secs(5));
//!
//! assert_eq!(config.general.staleness_threshold, Duration::from_secs(5));
//! assert_eq!(config.teams.teams.len(), 4);
//! ```

use std::path::Path;
use std::time::Duration;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::agent::AgentLevel;
use crate::error::Result;
use crate::shift::ShiftType;

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Loop cadences and liveness thresholds
    #[serde(default)]
    pub general: GeneralConfig,

    /// Team roster
    #[serde(default)]
    pub teams: TeamsConfig,
}

/// Loop and liveness settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Allocator loop tick interval
    pub allocator_interval: Duration,

    /// Liveness monitor tick interval
    pub monitor_interval: Duration,

    /// Idle time after which a session accrues a missed poll
    pub staleness_threshold: Duration,

    /// Missed polls at which a session is evicted
    pub missed_poll_limit: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            allocator_interval: Duration::from_secs(1),
            monitor_interval: Duration::from_secs(1),
            staleness_threshold: Duration::from_secs(10),
            missed_poll_limit: 3,
        }
    }
}

/// One team's roster entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamConfig {
    pub name: String,
    pub shift_type: ShiftType,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub agents: Vec<AgentLevel>,
}

/// The full team roster
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamsConfig {
    pub teams: Vec<TeamConfig>,
}

impl Default for TeamsConfig {
    fn default() -> Self {
        use AgentLevel::*;

        let hm = |h: u32, m: u32| NaiveTime::from_hms_opt(h, m, 0).expect("valid time of day");

        Self {
            teams: vec![
                TeamConfig {
                    name: "Team A".to_string(),
                    shift_type: ShiftType::OfficeHours,
                    start: hm(8, 0),
                    end: hm(16, 0),
                    agents: vec![TeamLead, Mid, Mid, Junior],
                },
                TeamConfig {
                    name: "Team B".to_string(),
                    shift_type: ShiftType::Night,
                    start: hm(17, 0),
                    end: hm(0, 0),
                    agents: vec![Senior, Mid, Junior, Junior],
                },
                TeamConfig {
                    name: "Team C".to_string(),
                    shift_type: ShiftType::EarlyMorning,
                    start: hm(0, 0),
                    end: hm(8, 0),
                    agents: vec![Mid, Mid],
                },
                TeamConfig {
                    name: "Team Overflow".to_string(),
                    shift_type: ShiftType::Overflow,
                    start: hm(8, 0),
                    end: hm(17, 0),
                    agents: vec![Junior, Junior, Junior, Junior, Junior, Junior],
                },
            ],
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&contents)?;
        Ok(config)
    }

    /// Set the allocator tick interval
    pub fn with_allocator_interval(mut self, interval: Duration) -> Self {
        self.general.allocator_interval = interval;
        self
    }

    /// Set the liveness monitor tick interval
    pub fn with_monitor_interval(mut self, interval: Duration) -> Self {
        self.general.monitor_interval = interval;
        self
    }

    /// Set the staleness threshold
    pub fn with_staleness_threshold(mut self, threshold: Duration) -> Self {
        self.general.staleness_threshold = threshold;
        self
    }

    /// Set the missed-poll eviction limit
    pub fn with_missed_poll_limit(mut self, limit: u32) -> Self {
        self.general.missed_poll_limit = limit;
        self
    }

    /// Replace the team roster
    pub fn with_teams(mut self, teams: Vec<TeamConfig>) -> Self {
        self.teams = TeamsConfig { teams };
        self
    }
}
