// libs/appointment-cell/src/services/scheduling.rs
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use clinic_cell::services::directory::DirectoryService;
use patient_cell::models::{CreatePatientRequest, PatientError};
use patient_cell::services::patient::PatientService;

use crate::models::{
    Appointment, AppointmentError, AppointmentSearchQuery, AppointmentSlot, AppointmentStatus,
    BookAppointmentRequest, CancelAppointmentRequest, CompleteAppointmentRequest,
    RescheduleAppointmentRequest,
};
use crate::services::conflict::find_conflict;
use crate::services::lifecycle::{AppointmentAction, AppointmentLifecycleService};
use crate::services::projection::{bucket_for, sort_for_listing};

/// The appointment store and its lifecycle operations.
///
/// All appointments sit behind one lock. Every transition re-reads the
/// current status inside the write-lock critical section, so two racing
/// transitions serialize and the loser observes the winner's state; the
/// reschedule overlap check and the write share the same section, so two
/// reschedules can never both claim one slot. Appointments are never
/// physically deleted, only moved to a terminal status.
pub struct AppointmentService {
    directory: Arc<DirectoryService>,
    patients: Arc<PatientService>,
    lifecycle: AppointmentLifecycleService,
    inner: RwLock<Vec<Appointment>>,
}

const DEFAULT_LIST_LIMIT: usize = 200;

fn map_patient_error(e: PatientError) -> AppointmentError {
    match e {
        PatientError::Validation(msg) => AppointmentError::Validation(msg),
        PatientError::NotFound(id) => {
            AppointmentError::Validation(format!("Patient not found: {}", id))
        }
    }
}

impl AppointmentService {
    pub fn new(directory: Arc<DirectoryService>, patients: Arc<PatientService>) -> Self {
        Self {
            directory,
            patients,
            lifecycle: AppointmentLifecycleService::new(),
            inner: RwLock::new(Vec::new()),
        }
    }

    /// Book a new appointment. The doctor must exist in the directory (a
    /// read-only reference check); the patient is created implicitly if
    /// unknown.
    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let doctor = self
            .directory
            .get_doctor(&request.doctor_email)
            .await
            .map_err(|_| AppointmentError::DoctorNotFound(request.doctor_email.clone()))?;

        if request.start_time >= request.end_time {
            return Err(AppointmentError::InvalidTime(
                "start_time must be before end_time".to_string(),
            ));
        }

        let patient = self
            .patients
            .create_or_lookup(CreatePatientRequest {
                name: request.patient_name,
                mobile_number: request.patient_mobile_number,
                email: request.patient_email,
            })
            .await
            .map_err(map_patient_error)?;

        let mut appointments = self.inner.write().await;

        if let Some(blocking) = find_conflict(
            &appointments,
            &doctor.email,
            request.date,
            request.start_time,
            request.end_time,
            None,
        ) {
            warn!(
                "Booking conflict for doctor {} on {}: blocked by {}",
                doctor.email, request.date, blocking.id
            );
            return Err(AppointmentError::SlotConflict);
        }

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            doctor_email: doctor.email.clone(),
            patient_id: patient.id,
            date: request.date,
            start_time: request.start_time,
            end_time: request.end_time,
            timezone: request.timezone.unwrap_or(doctor.timezone),
            status: AppointmentStatus::Booked,
            notes: request.notes,
            previous_slots: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        info!(
            "Booked appointment {} for doctor {} on {} {}-{}",
            appointment.id, doctor.email, appointment.date, appointment.start_time,
            appointment.end_time
        );
        appointments.push(appointment.clone());
        Ok(appointment)
    }

    pub async fn get_appointment(&self, id: Uuid) -> Result<Appointment, AppointmentError> {
        self.inner
            .read()
            .await
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or(AppointmentError::NotFound(id))
    }

    /// Mark an appointment completed, optionally attaching consultation
    /// notes.
    pub async fn complete_appointment(
        &self,
        id: Uuid,
        request: CompleteAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let mut appointments = self.inner.write().await;
        let appointment = appointments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(AppointmentError::NotFound(id))?;

        appointment.status = self
            .lifecycle
            .validate_transition(appointment.status, AppointmentAction::Complete)?;
        if let Some(notes) = request.notes {
            appointment.notes = Some(notes);
        }
        appointment.updated_at = Utc::now();

        info!("Completed appointment {}", id);
        Ok(appointment.clone())
    }

    pub async fn cancel_appointment(
        &self,
        id: Uuid,
        request: CancelAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let mut appointments = self.inner.write().await;
        let appointment = appointments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(AppointmentError::NotFound(id))?;

        appointment.status = self
            .lifecycle
            .validate_transition(appointment.status, AppointmentAction::Cancel)?;
        if let Some(reason) = request.reason {
            appointment.notes = Some(format!("Cancelled by doctor: {}", reason));
        }
        appointment.updated_at = Utc::now();

        info!("Cancelled appointment {}", id);
        Ok(appointment.clone())
    }

    /// Move an appointment to a new window. The overlap check runs against
    /// every other occupying appointment of the same doctor, excluding this
    /// one, inside the same critical section as the write.
    pub async fn reschedule_appointment(
        &self,
        id: Uuid,
        request: RescheduleAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        if request.new_start_time >= request.new_end_time {
            return Err(AppointmentError::Validation(
                "new_start_time must be before new_end_time".to_string(),
            ));
        }

        let mut appointments = self.inner.write().await;

        let current = appointments
            .iter()
            .find(|a| a.id == id)
            .ok_or(AppointmentError::NotFound(id))?;
        self.lifecycle
            .validate_transition(current.status, AppointmentAction::Reschedule)?;
        let doctor_email = current.doctor_email.clone();

        if let Some(blocking) = find_conflict(
            &appointments,
            &doctor_email,
            request.new_date,
            request.new_start_time,
            request.new_end_time,
            Some(id),
        ) {
            warn!(
                "Reschedule conflict for appointment {}: blocked by {}",
                id, blocking.id
            );
            return Err(AppointmentError::SlotConflict);
        }

        let appointment = appointments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(AppointmentError::NotFound(id))?;

        appointment.previous_slots.push(AppointmentSlot {
            date: appointment.date,
            start_time: appointment.start_time,
            end_time: appointment.end_time,
        });
        appointment.date = request.new_date;
        appointment.start_time = request.new_start_time;
        appointment.end_time = request.new_end_time;
        appointment.status = AppointmentStatus::Rescheduled;
        if let Some(reason) = request.reason {
            appointment.notes = Some(format!("Rescheduled: {}", reason));
        }
        appointment.updated_at = Utc::now();

        info!(
            "Rescheduled appointment {} to {} {}-{}",
            id, appointment.date, appointment.start_time, appointment.end_time
        );
        Ok(appointment.clone())
    }

    /// Filtered listing, always ordered by (date, start_time) ascending.
    /// The day bucket is computed against `today`, which callers supply from
    /// their own wall clock.
    pub async fn list_appointments(
        &self,
        query: AppointmentSearchQuery,
        today: NaiveDate,
    ) -> Vec<Appointment> {
        // Resolve the free-text search against the patient store before
        // taking the appointment lock.
        let matching_patients = match &query.search {
            Some(text) => Some(self.patients.matching_ids(text).await),
            None => None,
        };

        let doctor_email = query.doctor_email.map(|e| e.trim().to_lowercase());
        let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);

        let appointments = self.inner.read().await;
        let mut results: Vec<Appointment> = appointments
            .iter()
            .filter(|a| match &doctor_email {
                Some(email) => &a.doctor_email == email,
                None => true,
            })
            .filter(|a| query.status.map(|s| a.status == s).unwrap_or(true))
            .filter(|a| query.start_date.map(|d| a.date >= d).unwrap_or(true))
            .filter(|a| query.end_date.map(|d| a.date <= d).unwrap_or(true))
            .filter(|a| {
                query
                    .when
                    .map(|bucket| bucket_for(a.date, today) == bucket)
                    .unwrap_or(true)
            })
            .filter(|a| match &matching_patients {
                Some(ids) => ids.contains(&a.patient_id),
                None => true,
            })
            .cloned()
            .collect();
        drop(appointments);

        sort_for_listing(&mut results);
        results.truncate(limit);

        debug!("Listed {} appointment(s)", results.len());
        results
    }
}
