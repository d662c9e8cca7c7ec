use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::{
    AssignDoctorRequest, Clinic, ClinicDeletion, ConsultationType, CreateClinicRequest,
    CreateDoctorRequest, DirectoryError, Doctor, DoctorFilter, UpdateClinicRequest,
    UpdateDoctorRequest,
};

/// The clinic/doctor directory.
///
/// Both record collections live behind a single lock so that a forced cascade
/// delete is atomic with respect to readers: no request can observe doctors
/// whose clinic is already gone, or the reverse. Vectors keep insertion
/// order, which doctor listings expose.
pub struct DirectoryService {
    inner: RwLock<DirectoryInner>,
}

#[derive(Default)]
struct DirectoryInner {
    clinics: Vec<Clinic>,
    doctors: Vec<Doctor>,
}

const DEFAULT_DOCTOR_LIMIT: usize = 100;

impl DirectoryService {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(DirectoryInner::default()),
        }
    }

    // ==========================================================================
    // CLINICS
    // ==========================================================================

    pub async fn create_clinic(
        &self,
        request: CreateClinicRequest,
    ) -> Result<Clinic, DirectoryError> {
        let name = request.name.trim().to_string();
        let timezone = request.timezone.trim().to_string();

        if name.is_empty() {
            return Err(DirectoryError::Validation("name must not be empty".to_string()));
        }
        if timezone.is_empty() {
            return Err(DirectoryError::Validation("timezone must not be empty".to_string()));
        }

        let mut inner = self.inner.write().await;

        if inner
            .clinics
            .iter()
            .any(|c| c.name.eq_ignore_ascii_case(&name))
        {
            return Err(DirectoryError::DuplicateClinicName(name));
        }

        let now = Utc::now();
        let clinic = Clinic {
            id: Uuid::new_v4(),
            name,
            timezone,
            address: request.address,
            is_active: request.is_active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };

        info!("Created clinic {} ({})", clinic.name, clinic.id);
        inner.clinics.push(clinic.clone());
        Ok(clinic)
    }

    pub async fn update_clinic(
        &self,
        clinic_id: Uuid,
        request: UpdateClinicRequest,
    ) -> Result<Clinic, DirectoryError> {
        let mut inner = self.inner.write().await;

        // Validate everything before touching the record so a failed update
        // leaves the clinic unchanged.
        if !inner.clinics.iter().any(|c| c.id == clinic_id) {
            return Err(DirectoryError::ClinicNotFound(clinic_id));
        }
        if let Some(name) = &request.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(DirectoryError::Validation("name must not be empty".to_string()));
            }
            if inner
                .clinics
                .iter()
                .any(|c| c.id != clinic_id && c.name.eq_ignore_ascii_case(name))
            {
                return Err(DirectoryError::DuplicateClinicName(name.to_string()));
            }
        }
        if let Some(timezone) = &request.timezone {
            if timezone.trim().is_empty() {
                return Err(DirectoryError::Validation("timezone must not be empty".to_string()));
            }
        }

        let clinic = inner
            .clinics
            .iter_mut()
            .find(|c| c.id == clinic_id)
            .ok_or(DirectoryError::ClinicNotFound(clinic_id))?;

        if let Some(name) = request.name {
            clinic.name = name.trim().to_string();
        }
        if let Some(timezone) = request.timezone {
            clinic.timezone = timezone.trim().to_string();
        }
        if let Some(address) = request.address {
            clinic.address = Some(address);
        }
        if let Some(is_active) = request.is_active {
            clinic.is_active = is_active;
        }
        clinic.updated_at = Utc::now();

        debug!("Updated clinic {}", clinic_id);
        Ok(clinic.clone())
    }

    /// Delete a clinic. Without `force` the call fails while any doctor still
    /// references the clinic; with `force` those doctors are removed in the
    /// same critical section, so the cascade is all-or-nothing.
    pub async fn delete_clinic(
        &self,
        clinic_id: Uuid,
        force: bool,
    ) -> Result<ClinicDeletion, DirectoryError> {
        let mut inner = self.inner.write().await;

        let position = inner
            .clinics
            .iter()
            .position(|c| c.id == clinic_id)
            .ok_or(DirectoryError::ClinicNotFound(clinic_id))?;

        let assigned = inner
            .doctors
            .iter()
            .filter(|d| d.clinic_id == Some(clinic_id))
            .count();

        if assigned > 0 && !force {
            warn!(
                "Refusing to delete clinic {} with {} assigned doctor(s)",
                clinic_id, assigned
            );
            return Err(DirectoryError::ClinicHasDoctors { count: assigned });
        }

        inner.doctors.retain(|d| d.clinic_id != Some(clinic_id));
        let clinic = inner.clinics.remove(position);

        info!(
            "Deleted clinic {} ({}), cascaded {} doctor(s)",
            clinic.name, clinic_id, assigned
        );
        Ok(ClinicDeletion {
            clinic,
            removed_doctors: assigned,
        })
    }

    pub async fn list_clinics(&self) -> Vec<Clinic> {
        self.inner.read().await.clinics.clone()
    }

    pub async fn get_clinic(&self, clinic_id: Uuid) -> Result<Clinic, DirectoryError> {
        self.inner
            .read()
            .await
            .clinics
            .iter()
            .find(|c| c.id == clinic_id)
            .cloned()
            .ok_or(DirectoryError::ClinicNotFound(clinic_id))
    }

    // ==========================================================================
    // DOCTORS
    // ==========================================================================

    pub async fn create_doctor(
        &self,
        request: CreateDoctorRequest,
    ) -> Result<Doctor, DirectoryError> {
        let email = request.email.trim().to_lowercase();
        let name = request.name.trim().to_string();

        if email.is_empty() || !email.contains('@') {
            return Err(DirectoryError::Validation(format!(
                "invalid doctor email: {:?}",
                request.email
            )));
        }
        if name.is_empty() {
            return Err(DirectoryError::Validation("name must not be empty".to_string()));
        }

        let mut inner = self.inner.write().await;

        if inner.doctors.iter().any(|d| d.email == email) {
            return Err(DirectoryError::DuplicateDoctor(email));
        }

        // A clinic reference must point at an existing clinic (active or not).
        if let Some(clinic_id) = request.clinic_id {
            if !inner.clinics.iter().any(|c| c.id == clinic_id) {
                return Err(DirectoryError::ClinicNotFound(clinic_id));
            }
        }

        let now = Utc::now();
        let doctor = Doctor {
            email,
            name,
            specialization: request.specialization,
            experience_years: request.experience_years.unwrap_or(0),
            languages: request.languages.unwrap_or_default(),
            consultation_type: request
                .consultation_type
                .unwrap_or(ConsultationType::RemoteVideo),
            timezone: request.timezone.unwrap_or_else(|| "UTC".to_string()),
            is_active: true,
            clinic_id: request.clinic_id,
            created_at: now,
            updated_at: now,
        };

        info!("Created doctor {}", doctor.email);
        inner.doctors.push(doctor.clone());
        Ok(doctor)
    }

    /// Set or overwrite the doctor's clinic reference. A doctor belongs to at
    /// most one clinic, so reassignment replaces the previous reference.
    pub async fn assign_doctor(
        &self,
        email: &str,
        request: AssignDoctorRequest,
    ) -> Result<Doctor, DirectoryError> {
        let email = email.trim().to_lowercase();
        let mut inner = self.inner.write().await;

        if !inner.clinics.iter().any(|c| c.id == request.clinic_id) {
            return Err(DirectoryError::ClinicNotFound(request.clinic_id));
        }

        let doctor = inner
            .doctors
            .iter_mut()
            .find(|d| d.email == email)
            .ok_or_else(|| DirectoryError::DoctorNotFound(email.clone()))?;

        doctor.clinic_id = Some(request.clinic_id);
        doctor.updated_at = Utc::now();

        info!("Assigned doctor {} to clinic {}", email, request.clinic_id);
        Ok(doctor.clone())
    }

    pub async fn update_doctor(
        &self,
        email: &str,
        request: UpdateDoctorRequest,
    ) -> Result<Doctor, DirectoryError> {
        let email = email.trim().to_lowercase();
        let mut inner = self.inner.write().await;

        let doctor = inner
            .doctors
            .iter_mut()
            .find(|d| d.email == email)
            .ok_or_else(|| DirectoryError::DoctorNotFound(email.clone()))?;

        if let Some(name) = request.name {
            doctor.name = name;
        }
        if let Some(specialization) = request.specialization {
            doctor.specialization = specialization;
        }
        if let Some(experience_years) = request.experience_years {
            doctor.experience_years = experience_years;
        }
        if let Some(languages) = request.languages {
            doctor.languages = languages;
        }
        if let Some(consultation_type) = request.consultation_type {
            doctor.consultation_type = consultation_type;
        }
        if let Some(timezone) = request.timezone {
            doctor.timezone = timezone;
        }
        if let Some(is_active) = request.is_active {
            doctor.is_active = is_active;
        }
        doctor.updated_at = Utc::now();

        debug!("Updated doctor {}", email);
        Ok(doctor.clone())
    }

    /// Remove a doctor record. The system exposes no "unassigned but alive"
    /// state, so detaching from a clinic and deletion are the same operation.
    pub async fn remove_doctor(&self, email: &str) -> Result<Doctor, DirectoryError> {
        let email = email.trim().to_lowercase();
        let mut inner = self.inner.write().await;

        let position = inner
            .doctors
            .iter()
            .position(|d| d.email == email)
            .ok_or_else(|| DirectoryError::DoctorNotFound(email.clone()))?;

        let doctor = inner.doctors.remove(position);
        info!("Removed doctor {}", email);
        Ok(doctor)
    }

    /// Insertion-ordered listing, optionally narrowed to a clinic and to
    /// active doctors, bounded by `limit`.
    pub async fn list_doctors(&self, filter: DoctorFilter) -> Vec<Doctor> {
        let inner = self.inner.read().await;
        let limit = filter.limit.unwrap_or(DEFAULT_DOCTOR_LIMIT);

        inner
            .doctors
            .iter()
            .filter(|d| match filter.clinic_id {
                Some(clinic_id) => d.clinic_id == Some(clinic_id),
                None => true,
            })
            .filter(|d| !filter.active_only.unwrap_or(false) || d.is_active)
            .take(limit)
            .cloned()
            .collect()
    }

    pub async fn get_doctor(&self, email: &str) -> Result<Doctor, DirectoryError> {
        let email = email.trim().to_lowercase();
        self.inner
            .read()
            .await
            .doctors
            .iter()
            .find(|d| d.email == email)
            .cloned()
            .ok_or(DirectoryError::DoctorNotFound(email))
    }

    pub async fn doctor_exists(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.inner
            .read()
            .await
            .doctors
            .iter()
            .any(|d| d.email == email)
    }
}

impl Default for DirectoryService {
    fn default() -> Self {
        Self::new()
    }
}
