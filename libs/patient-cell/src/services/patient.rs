use std::sync::OnceLock;

use chrono::Utc;
use regex::Regex;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{CreatePatientRequest, Patient, PatientError, UpdatePatientRequest};

/// Patient records, created implicitly by the booking flow and keyed by
/// normalized mobile number when one is known.
pub struct PatientService {
    inner: RwLock<Vec<Patient>>,
}

fn non_phone_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^\d+]").expect("static pattern"))
}

fn digits_only() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\D").expect("static pattern"))
}

/// Normalize a mobile number to 10 digits or `+91XXXXXXXXXX`.
///
/// Common separators (`987-654-3210`, `987 654 3210`) are stripped. With a
/// leading plus the number must be exactly `+91` and 10 digits; without one
/// it must be exactly 10 digits. Anything else is rejected.
pub fn normalize_mobile(value: &str) -> Result<String, PatientError> {
    let mut cleaned = non_phone_chars().replace_all(value, "").to_string();
    if cleaned.starts_with("++") {
        cleaned.remove(0);
    }
    let has_plus = cleaned.starts_with('+');
    let digits = digits_only().replace_all(&cleaned, "").to_string();

    if has_plus {
        if digits.len() == 12 && digits.starts_with("91") {
            return Ok(format!("+{}", digits));
        }
    } else if digits.len() == 10 {
        return Ok(digits);
    }

    Err(PatientError::Validation(
        "mobile_number must be 10 digits, with optional +91 prefix".to_string(),
    ))
}

impl PatientService {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Vec::new()),
        }
    }

    /// Find an existing patient by mobile number (email as fallback) or
    /// create one. The scheduling flow never fails a booking because the
    /// patient is new.
    pub async fn create_or_lookup(
        &self,
        request: CreatePatientRequest,
    ) -> Result<Patient, PatientError> {
        let name = request.name.trim().to_string();
        if name.is_empty() {
            return Err(PatientError::Validation("name must not be empty".to_string()));
        }

        let mobile = match &request.mobile_number {
            Some(raw) => Some(normalize_mobile(raw)?),
            None => None,
        };
        let email = request.email.map(|e| e.trim().to_lowercase());

        let mut patients = self.inner.write().await;

        if let Some(mobile) = &mobile {
            if let Some(existing) = patients
                .iter()
                .find(|p| p.mobile_number.as_deref() == Some(mobile.as_str()))
            {
                debug!("Patient lookup hit by mobile for {}", existing.id);
                return Ok(existing.clone());
            }
        } else if let Some(email) = &email {
            if let Some(existing) = patients
                .iter()
                .find(|p| p.email.as_deref() == Some(email.as_str()))
            {
                debug!("Patient lookup hit by email for {}", existing.id);
                return Ok(existing.clone());
            }
        }

        let now = Utc::now();
        let patient = Patient {
            id: Uuid::new_v4(),
            name,
            mobile_number: mobile,
            email,
            created_at: now,
            updated_at: now,
        };

        info!("Created patient {}", patient.id);
        patients.push(patient.clone());
        Ok(patient)
    }

    pub async fn get_patient(&self, patient_id: Uuid) -> Result<Patient, PatientError> {
        self.inner
            .read()
            .await
            .iter()
            .find(|p| p.id == patient_id)
            .cloned()
            .ok_or(PatientError::NotFound(patient_id))
    }

    pub async fn update_patient(
        &self,
        patient_id: Uuid,
        request: UpdatePatientRequest,
    ) -> Result<Patient, PatientError> {
        let mobile = match &request.mobile_number {
            Some(raw) => Some(normalize_mobile(raw)?),
            None => None,
        };

        let mut patients = self.inner.write().await;
        let patient = patients
            .iter_mut()
            .find(|p| p.id == patient_id)
            .ok_or(PatientError::NotFound(patient_id))?;

        if let Some(name) = request.name {
            patient.name = name;
        }
        if let Some(mobile) = mobile {
            patient.mobile_number = Some(mobile);
        }
        if let Some(email) = request.email {
            patient.email = Some(email.trim().to_lowercase());
        }
        patient.updated_at = Utc::now();

        Ok(patient.clone())
    }

    /// Case-insensitive substring match over name, mobile number, and email.
    /// Used by the scheduling read side for free-text search.
    pub async fn matching_ids(&self, query: &str) -> Vec<Uuid> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        self.inner
            .read()
            .await
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.mobile_number
                        .as_deref()
                        .map(|m| m.contains(&needle))
                        .unwrap_or(false)
                    || p.email
                        .as_deref()
                        .map(|e| e.contains(&needle))
                        .unwrap_or(false)
            })
            .map(|p| p.id)
            .collect()
    }
}

impl Default for PatientService {
    fn default() -> Self {
        Self::new()
    }
}
