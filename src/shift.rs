//! # Shift Windows
//!
//! A [`Shift`] is a time-of-day window during which a team is on duty.
//! Windows may wrap past midnight: when `start > end`, "active" means
//! `now >= start || now <= end`. Only [`ShiftType::OfficeHours`] shifts are
//! eligible for overflow admission; the dedicated overflow team carries the
//! [`ShiftType::Overflow`] tag and is never selected by the primary
//! resolution rule in [`TeamDirectory`](crate::team::TeamDirectory).

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Shift categories.
///
/// The type drives two policy decisions: overflow admission is only allowed
/// while an `OfficeHours` team is on duty, and `Overflow`-tagged teams are
/// excluded from primary shift resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShiftType {
    /// Ordinary daytime shift; the only overflow-eligible kind
    OfficeHours,
    /// Evening shift, typically wrapping toward midnight
    Night,
    /// Early-morning shift
    EarlyMorning,
    /// Tag for the dedicated overflow team
    Overflow,
}

impl ShiftType {
    /// Whether admissions above primary capacity may spill into the
    /// overflow team while this shift is on duty
    pub fn is_overflow_eligible(&self) -> bool {
        matches!(self, ShiftType::OfficeHours)
    }
}

/// A time-of-day window with a shift type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    shift_type: ShiftType,
    start: NaiveTime,
    end: NaiveTime,
}

impl Shift {
    pub fn new(shift_type: ShiftType, start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            shift_type,
            start,
            end,
        }
    }

    pub fn shift_type(&self) -> ShiftType {
        self.shift_type
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Whether `now` falls inside this window.
    ///
    /// `start > end` means the window wraps past midnight, e.g. a 17:00-00:00
    /// night shift is active at 23:00 and at 00:00 but not at 12:00.
    /// Both bounds are inclusive.
    pub fn contains(&self, now: NaiveTime) -> bool {
        if self.start <= self.end {
            now >= self.start && now <= self.end
        } else {
            now >= self.start || now <= self.end
        }
    }
}
