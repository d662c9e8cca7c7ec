// libs/appointment-cell/src/models.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_email: String,
    pub patient_id: Uuid,
    pub date: NaiveDate,
    /// Serialized as HH:MM:SS; full precision is always persisted.
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub timezone: String,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    /// Prior windows, oldest first; appended on every reschedule.
    pub previous_slots: Vec<AppointmentSlot>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppointmentSlot {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Booked,
    Rescheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    /// Terminal states are never re-entered and accept no further actions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }

    /// Whether this status still reserves calendar time for the doctor.
    pub fn occupies_calendar(&self) -> bool {
        matches!(self, AppointmentStatus::Booked | AppointmentStatus::Rescheduled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Booked => write!(f, "booked"),
            AppointmentStatus::Rescheduled => write!(f, "rescheduled"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

// ==============================================================================
// REQUEST/QUERY MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub doctor_email: String,
    pub patient_name: String,
    pub patient_mobile_number: Option<String>,
    pub patient_email: Option<String>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub timezone: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RescheduleAppointmentRequest {
    pub new_date: NaiveDate,
    pub new_start_time: NaiveTime,
    pub new_end_time: NaiveTime,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelAppointmentRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteAppointmentRequest {
    pub notes: Option<String>,
}

/// Day partition relative to the caller's current date; a read-side
/// projection, recomputed per request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DayBucket {
    Today,
    Upcoming,
    Past,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentSearchQuery {
    pub doctor_email: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<AppointmentStatus>,
    pub when: Option<DayBucket>,
    pub search: Option<String>,
    pub limit: Option<usize>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found: {0}")]
    NotFound(Uuid),

    #[error("Doctor not found: {0}")]
    DoctorNotFound(String),

    #[error("Appointment cannot be modified in current status: {0}")]
    InvalidTransition(AppointmentStatus),

    #[error("Time slot conflicts with another appointment")]
    SlotConflict,

    #[error("Invalid appointment time: {0}")]
    InvalidTime(String),

    #[error("Validation error: {0}")]
    Validation(String),
}
