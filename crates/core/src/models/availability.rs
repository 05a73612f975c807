use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::{
    required,
    time_format::{self, hh_mm},
};
use crate::{
    errors::{SessionError, SessionResult},
    slotting,
};

/// Raw body of a create-availability request.
///
/// Every field is optional here so that a missing field surfaces as a
/// validation message rather than a deserialization failure. The tutor id is
/// accepted under all the names older clients send.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAvailabilityRequest {
    #[serde(alias = "id", alias = "teacherId", alias = "tutorid", alias = "userid")]
    pub tutor_id: Option<String>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl CreateAvailabilityRequest {
    /// Normalizes the request into a window with parsed date and times.
    ///
    /// Range checks (ordering, minimum length) depend on the slot policy and
    /// happen when the window is planned.
    pub fn validate(self) -> SessionResult<AvailabilityWindow> {
        let tutor_id = required(self.tutor_id, "Tutor ID is required")?;
        let date = required(self.date, "Date is required")?;
        let start_time = required(self.start_time, "Start time is required")?;
        let end_time = required(self.end_time, "End time is required")?;

        let start_time = time_format::parse_time(&start_time).ok_or_else(|| {
            SessionError::validation("Invalid start time format. Please use 24-hour format (HH:MM)")
        })?;
        let end_time = time_format::parse_time(&end_time).ok_or_else(|| {
            SessionError::validation("Invalid end time format. Please use 24-hour format (HH:MM)")
        })?;
        let date = time_format::parse_date(&date)
            .ok_or_else(|| SessionError::validation("Invalid date format. Please use YYYY-MM-DD"))?;

        Ok(AvailabilityWindow {
            tutor_id,
            date,
            start_time,
            end_time,
        })
    }
}

/// A tutor's published availability for one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityWindow {
    pub tutor_id: String,
    pub date: NaiveDate,
    #[serde(with = "hh_mm")]
    pub start_time: NaiveTime,
    #[serde(with = "hh_mm")]
    pub end_time: NaiveTime,
}

impl AvailabilityWindow {
    pub fn key(&self) -> String {
        slotting::availability_key(&self.tutor_id, &self.date_string())
    }

    pub fn date_string(&self) -> String {
        time_format::format_date(self.date)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAvailabilityResponse {
    pub success: bool,
    pub message: String,
    pub slots_created: usize,
}
