//! # Slot planning
//!
//! A tutor publishes one availability window per date. The window is cut into
//! fixed-length slots, walking forward from the start time and emitting a slot
//! only while the whole slot still fits before the end time:
//!
//! ```text
//! 09:00 ─────────────── 11:30
//! [09:00,10:00) [10:00,11:00) [11:00,11:30) <- remainder
//! ```
//!
//! What happens to the remainder is a [`TrailingRemainder`] policy. `Drop`
//! keeps only the whole slots (two here); `Reject` refuses the window.
//!
//! Expiry is a plain comparison of the slot's end against a wall-clock
//! instant in the deployment timezone. Stored records carry no timezone, so
//! callers must hand in `now` already converted to local time.

use std::{fmt, str::FromStr};

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::errors::{SessionError, SessionResult};

pub const DEFAULT_SLOT_MINUTES: i64 = 60;

/// What to do with a tail of the window shorter than one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrailingRemainder {
    #[default]
    Drop,
    Reject,
}

impl FromStr for TrailingRemainder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drop" => Ok(TrailingRemainder::Drop),
            "reject" => Ok(TrailingRemainder::Reject),
            other => Err(format!("unknown trailing remainder policy '{}'", other)),
        }
    }
}

impl fmt::Display for TrailingRemainder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrailingRemainder::Drop => f.write_str("drop"),
            TrailingRemainder::Reject => f.write_str("reject"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotPolicy {
    pub slot_minutes: i64,
    pub trailing: TrailingRemainder,
}

impl Default for SlotPolicy {
    fn default() -> Self {
        Self {
            slot_minutes: DEFAULT_SLOT_MINUTES,
            trailing: TrailingRemainder::Drop,
        }
    }
}

impl SlotPolicy {
    pub fn slot_length(&self) -> Duration {
        Duration::minutes(self.slot_minutes)
    }

    /// Checks a start/end pair against this policy without planning slots.
    pub fn validate_range(&self, start: NaiveTime, end: NaiveTime) -> SessionResult<()> {
        if end <= start {
            return Err(SessionError::validation("End time must be after start time"));
        }

        let minutes = (end - start).num_minutes();
        if minutes < self.slot_minutes {
            return Err(SessionError::Validation(format!(
                "Time range must be at least {} minutes",
                self.slot_minutes
            )));
        }

        if self.trailing == TrailingRemainder::Reject && minutes % self.slot_minutes != 0 {
            return Err(SessionError::Validation(format!(
                "Time range must be a whole multiple of {} minutes",
                self.slot_minutes
            )));
        }

        Ok(())
    }
}

/// One slot cut from a window, numbered from 1 in time order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedSlot {
    pub sequence: u32,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

/// Cuts `[start, end)` on `date` into consecutive slots of the policy length.
pub fn plan_slots(
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    policy: &SlotPolicy,
) -> SessionResult<Vec<PlannedSlot>> {
    policy.validate_range(start, end)?;

    let length = policy.slot_length();
    let window_end = date.and_time(end);
    let mut cursor = date.and_time(start);
    let mut sequence = 1;
    let mut slots = Vec::new();

    while cursor + length <= window_end {
        let slot_end = cursor + length;
        slots.push(PlannedSlot {
            sequence,
            start_time: cursor.time(),
            end_time: slot_end.time(),
        });
        cursor = slot_end;
        sequence += 1;
    }

    Ok(slots)
}

/// Key of an availability window: tutor id followed by the fixed-width date.
pub fn availability_key(tutor_id: &str, date: &str) -> String {
    format!("{}{}", tutor_id, date)
}

pub fn slot_id(sequence: u32, date: &str, tutor_id: &str) -> String {
    format!("S{}{}{}", sequence, date, tutor_id)
}

/// A slot is expired once `now` is strictly past its end.
pub fn is_expired(date: NaiveDate, end_time: NaiveTime, now: NaiveDateTime) -> bool {
    now > date.and_time(end_time)
}
