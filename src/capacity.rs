//! # Capacity Calculator
//!
//! Queue capacity is derived from a team's staffed throughput, not its
//! headcount: each skill level contributes `efficiency * count * 10`, the
//! contributions are summed and multiplied by a 1.5 queue buffer, then
//! truncated to an integer. A team of seniors therefore admits more queued
//! work than the same number of juniors.
//!
//! The same function sizes the overflow team; its result is added to the
//! primary capacity to form the combined overflow-admitted ceiling.

use std::collections::HashMap;

use crate::agent::AgentLevel;
use crate::team::Team;

/// Queue-to-capacity buffer: sessions may queue briefly before being served
pub const QUEUE_BUFFER_FACTOR: f64 = 1.5;

/// Capacity contribution of a single team.
///
/// Groups agents by level, sums `efficiency * count * 10` per level, applies
/// the 1.5 buffer and truncates.
pub fn team_capacity(team: &Team) -> usize {
    let mut counts: HashMap<AgentLevel, usize> = HashMap::new();
    for agent in team.agents() {
        *counts.entry(agent.level()).or_insert(0) += 1;
    }

    let staffed: f64 = counts
        .iter()
        .map(|(level, count)| level.efficiency() * *count as f64 * 10.0)
        .sum();

    (staffed * QUEUE_BUFFER_FACTOR) as usize
}

/// The combined ceiling admitted during daytime overflow
pub fn combined_ceiling(primary: usize, overflow: usize) -> usize {
    primary + overflow
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Agent;
    use crate::shift::{Shift, ShiftType};
    use chrono::NaiveTime;

    fn team_of(levels: &[AgentLevel]) -> Team {
        let shift = Shift::new(
            ShiftType::OfficeHours,
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
        );
        Team::new(
            "test",
            shift,
            levels.iter().map(|l| Agent::new(*l)).collect(),
        )
    }

    #[test]
    fn junior_plus_mid_is_fifteen() {
        // (0.4*1*10 + 0.6*1*10) * 1.5 = 15
        let team = team_of(&[AgentLevel::Junior, AgentLevel::Mid]);
        assert_eq!(team_capacity(&team), 15);
    }

    #[test]
    fn repeated_levels_scale_by_count() {
        // (0.5*1*10 + 0.6*2*10 + 0.4*1*10) * 1.5 = 31.5 -> 31
        let team = team_of(&[
            AgentLevel::TeamLead,
            AgentLevel::Mid,
            AgentLevel::Mid,
            AgentLevel::Junior,
        ]);
        assert_eq!(team_capacity(&team), 31);
    }

    #[test]
    fn empty_team_has_zero_capacity() {
        let team = team_of(&[]);
        assert_eq!(team_capacity(&team), 0);
    }

    #[test]
    fn combined_ceiling_is_additive() {
        assert_eq!(combined_ceiling(31, 36), 67);
    }
}
