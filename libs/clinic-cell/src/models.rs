// libs/clinic-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==============================================================================
// CORE DIRECTORY MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Clinic {
    pub id: Uuid,
    pub name: String,
    pub timezone: String,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A practitioner record. The email is the natural key; there is no separate
/// surrogate identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub email: String,
    pub name: String,
    pub specialization: String,
    pub experience_years: i32,
    pub languages: Vec<String>,
    pub consultation_type: ConsultationType,
    pub timezone: String,
    pub is_active: bool,
    pub clinic_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConsultationType {
    RemoteVideo,
    RemoteAudio,
}

impl fmt::Display for ConsultationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsultationType::RemoteVideo => write!(f, "remote_video"),
            ConsultationType::RemoteAudio => write!(f, "remote_audio"),
        }
    }
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClinicRequest {
    pub name: String,
    pub timezone: String,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateClinicRequest {
    pub name: Option<String>,
    pub timezone: Option<String>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDoctorRequest {
    pub email: String,
    pub name: String,
    pub specialization: String,
    pub experience_years: Option<i32>,
    pub languages: Option<Vec<String>>,
    pub consultation_type: Option<ConsultationType>,
    pub timezone: Option<String>,
    pub clinic_id: Option<Uuid>,
}

/// Body of `PUT /doctors/{email}`: (re)assign a doctor to a clinic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignDoctorRequest {
    pub clinic_id: Uuid,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateDoctorRequest {
    pub name: Option<String>,
    pub specialization: Option<String>,
    pub experience_years: Option<i32>,
    pub languages: Option<Vec<String>>,
    pub consultation_type: Option<ConsultationType>,
    pub timezone: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DoctorFilter {
    pub clinic_id: Option<Uuid>,
    pub active_only: Option<bool>,
    pub limit: Option<usize>,
}

/// Outcome of a clinic deletion; `removed_doctors` is non-zero only for a
/// forced cascade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicDeletion {
    pub clinic: Clinic,
    pub removed_doctors: usize,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum DirectoryError {
    #[error("Clinic not found: {0}")]
    ClinicNotFound(Uuid),

    #[error("Doctor not found: {0}")]
    DoctorNotFound(String),

    #[error("Clinic name already in use: {0}")]
    DuplicateClinicName(String),

    #[error("Doctor already registered: {0}")]
    DuplicateDoctor(String),

    #[error("Clinic has {count} assigned doctor(s); pass force=true to cascade")]
    ClinicHasDoctors { count: usize },

    #[error("Validation error: {0}")]
    Validation(String),
}
