use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{required, time_format};
use crate::errors::{SessionError, SessionResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BookingStatus {
    Pending,
    Confirm,
    Reject,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirm => "CONFIRM",
            BookingStatus::Reject => "REJECT",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(BookingStatus::Pending),
            "CONFIRM" => Ok(BookingStatus::Confirm),
            "REJECT" => Ok(BookingStatus::Reject),
            other => Err(format!("unknown booking status '{}'", other)),
        }
    }
}

/// A tutor's answer to a pending booking request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingAction {
    Confirm,
    Reject,
}

impl BookingAction {
    pub fn resulting_status(&self) -> BookingStatus {
        match self {
            BookingAction::Confirm => BookingStatus::Confirm,
            BookingAction::Reject => BookingStatus::Reject,
        }
    }

    pub fn past_tense(&self) -> &'static str {
        match self {
            BookingAction::Confirm => "confirmed",
            BookingAction::Reject => "rejected",
        }
    }
}

impl FromStr for BookingAction {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CONFIRM" => Ok(BookingAction::Confirm),
            "REJECT" => Ok(BookingAction::Reject),
            _ => Err(SessionError::Validation(format!(
                "Invalid action: {}. Must be one of: CONFIRM, REJECT",
                s
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub booking_id: String,
    pub tutor_id: String,
    pub learner_id: String,
    pub slot_id: String,
    pub slot_date: NaiveDate,
    pub status: BookingStatus,
    pub requested_at: DateTime<Utc>,
}

impl Booking {
    pub fn new_id() -> String {
        format!("b{}", Uuid::new_v4().simple())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[serde(alias = "tutorid", alias = "teacherId")]
    pub tutor_id: Option<String>,
    #[serde(alias = "studentid", alias = "studentId")]
    pub learner_id: Option<String>,
    #[serde(alias = "slotid")]
    pub slot_id: Option<String>,
    pub slot_date: Option<String>,
}

/// A validated booking request, before an id and timestamp are assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBooking {
    pub tutor_id: String,
    pub learner_id: String,
    pub slot_id: String,
    pub slot_date: NaiveDate,
}

impl CreateBookingRequest {
    pub fn validate(self) -> SessionResult<NewBooking> {
        let tutor_id = required(self.tutor_id, "Missing required field: tutorId")?;
        let learner_id = required(self.learner_id, "Missing required field: learnerId")?;
        let slot_id = required(self.slot_id, "Missing required field: slotId")?;
        let slot_date = required(self.slot_date, "Missing required field: slotDate")?;
        let slot_date = time_format::parse_date(&slot_date)
            .ok_or_else(|| SessionError::validation("Invalid date format for slotDate"))?;

        Ok(NewBooking {
            tutor_id,
            learner_id,
            slot_id,
            slot_date,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingResponse {
    pub success: bool,
    pub message: String,
    pub booking_id: String,
}

/// Body of a tutor's response to a booking.
///
/// Only `action` is required. The ids, when sent, must match the stored
/// booking.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDecisionRequest {
    #[serde(alias = "tutorid", alias = "teacherId")]
    pub tutor_id: Option<String>,
    #[serde(alias = "studentid", alias = "studentId")]
    pub learner_id: Option<String>,
    #[serde(alias = "slotid")]
    pub slot_id: Option<String>,
    pub action: Option<String>,
}

impl BookingDecisionRequest {
    pub fn action(&self) -> SessionResult<BookingAction> {
        let action = required(self.action.clone(), "Missing required field: action")?;
        action.parse()
    }

    /// Checks any ids supplied with the decision against the stored booking.
    pub fn check_matches(&self, booking: &Booking) -> SessionResult<()> {
        let pairs = [
            ("tutorId", self.tutor_id.as_deref(), booking.tutor_id.as_str()),
            ("learnerId", self.learner_id.as_deref(), booking.learner_id.as_str()),
            ("slotId", self.slot_id.as_deref(), booking.slot_id.as_str()),
        ];

        for (field, sent, stored) in pairs {
            if let Some(sent) = sent.map(str::trim).filter(|s| !s.is_empty()) {
                if sent != stored {
                    return Err(SessionError::Validation(format!(
                        "{} '{}' does not match booking {}",
                        field, sent, booking.booking_id
                    )));
                }
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDecisionResponse {
    pub success: bool,
    pub message: String,
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingBookingsQuery {
    #[serde(alias = "tutorid", alias = "teacherId")]
    pub tutor_id: Option<String>,
    #[serde(alias = "studentid", alias = "studentId")]
    pub learner_id: Option<String>,
}

impl PendingBookingsQuery {
    pub fn validate(self) -> SessionResult<(String, String)> {
        let tutor_id = required(self.tutor_id, "Tutor ID is required")?;
        let learner_id = required(self.learner_id, "Learner ID is required")?;
        Ok((tutor_id, learner_id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorBookingsResponse {
    pub bookings: Vec<Booking>,
}
