use std::{fmt, str::FromStr};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::{availability::AvailabilityWindow, time_format::hh_mm};
use crate::slotting::{self, PlannedSlot};

/// Lifecycle of a bookable slot.
///
/// ```text
/// OPEN ──booking confirmed──▶ BOOKED
///   │                           │
///   └────────end passed────▶ EXPIRED ◀──end passed
/// ```
///
/// `EXPIRED` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SlotStatus {
    Open,
    Booked,
    Expired,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Open => "OPEN",
            SlotStatus::Booked => "BOOKED",
            SlotStatus::Expired => "EXPIRED",
        }
    }

    pub fn can_transition_to(&self, next: SlotStatus) -> bool {
        matches!(
            (self, next),
            (SlotStatus::Open, SlotStatus::Booked)
                | (SlotStatus::Open, SlotStatus::Expired)
                | (SlotStatus::Booked, SlotStatus::Expired)
        )
    }

    pub fn is_terminal(&self) -> bool {
        *self == SlotStatus::Expired
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(SlotStatus::Open),
            "BOOKED" => Ok(SlotStatus::Booked),
            "EXPIRED" => Ok(SlotStatus::Expired),
            other => Err(format!("unknown slot status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub id: String,
    pub tutor_id: String,
    pub date: NaiveDate,
    #[serde(with = "hh_mm")]
    pub start_time: NaiveTime,
    #[serde(with = "hh_mm")]
    pub end_time: NaiveTime,
    pub status: SlotStatus,
}

impl Slot {
    /// Builds the OPEN slot record for one planned interval of `window`.
    pub fn from_plan(window: &AvailabilityWindow, planned: &PlannedSlot) -> Self {
        Self {
            id: slotting::slot_id(planned.sequence, &window.date_string(), &window.tutor_id),
            tutor_id: window.tutor_id.clone(),
            date: window.date,
            start_time: planned.start_time,
            end_time: planned.end_time,
            status: SlotStatus::Open,
        }
    }

    pub fn is_expired_at(&self, now: NaiveDateTime) -> bool {
        slotting::is_expired(self.date, self.end_time, now)
    }
}

/// Outcome of one expiry sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepSummary {
    /// Slots loaded by the scan (all non-expired slots).
    pub processed: usize,
    /// Slots whose status was set to EXPIRED.
    pub expired: usize,
    /// Slots past their end whose update failed.
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpireSlotsResponse {
    pub message: String,
    pub results: SweepSummary,
}
