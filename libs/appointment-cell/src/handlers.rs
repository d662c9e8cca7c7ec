// libs/appointment-cell/src/handlers.rs
use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    Appointment, AppointmentError, AppointmentSearchQuery, AppointmentStatus,
    BookAppointmentRequest, CancelAppointmentRequest, CompleteAppointmentRequest, DayBucket,
    RescheduleAppointmentRequest,
};
use crate::router::SchedulingState;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct AppointmentQueryParams {
    pub doctor_email: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<AppointmentStatus>,
    pub when: Option<DayBucket>,
    pub search: Option<String>,
    pub limit: Option<usize>,
    /// Caller's current date for the today/upcoming/past partition; defaults
    /// to the server's UTC date.
    pub today: Option<NaiveDate>,
}

impl AppointmentQueryParams {
    fn into_query(self) -> (AppointmentSearchQuery, NaiveDate) {
        let today = self.today.unwrap_or_else(|| Utc::now().date_naive());
        (
            AppointmentSearchQuery {
                doctor_email: self.doctor_email,
                start_date: self.start_date,
                end_date: self.end_date,
                status: self.status,
                when: self.when,
                search: self.search,
                limit: self.limit,
            },
            today,
        )
    }
}

fn map_appointment_error(e: AppointmentError) -> AppError {
    match e {
        AppointmentError::NotFound(id) => {
            AppError::NotFound(format!("Appointment not found: {}", id))
        }
        AppointmentError::DoctorNotFound(email) => {
            AppError::NotFound(format!("Doctor not found: {}", email))
        }
        AppointmentError::InvalidTransition(status) => AppError::InvalidTransition(format!(
            "Appointment cannot be modified in current status: {}",
            status
        )),
        AppointmentError::SlotConflict => {
            AppError::Conflict("Time slot conflicts with another appointment".to_string())
        }
        AppointmentError::InvalidTime(msg) => AppError::Validation(msg),
        AppointmentError::Validation(msg) => AppError::Validation(msg),
    }
}

/// Doctors may only touch their own appointments; admins may touch any.
fn check_appointment_access(user: &User, appointment: &Appointment) -> Result<(), AppError> {
    if user.role.as_deref() == Some("admin") {
        return Ok(());
    }
    let is_own = user
        .email
        .as_deref()
        .map(|e| e.eq_ignore_ascii_case(&appointment.doctor_email))
        .unwrap_or(false);
    if is_own {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Not authorized to modify this appointment".to_string(),
        ))
    }
}

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<SchedulingState>,
    Query(params): Query<AppointmentQueryParams>,
) -> Result<Json<Value>, AppError> {
    let (query, today) = params.into_query();
    let appointments = state.appointments.list_appointments(query, today).await;
    Ok(Json(json!({ "appointments": appointments })))
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(state): State<SchedulingState>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .appointments
        .book_appointment(request)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment booked successfully"
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<SchedulingState>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let appointment = state
        .appointments
        .get_appointment(appointment_id)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn complete_appointment(
    State(state): State<SchedulingState>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<CompleteAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let existing = state
        .appointments
        .get_appointment(appointment_id)
        .await
        .map_err(map_appointment_error)?;
    check_appointment_access(&user, &existing)?;

    let appointment = state
        .appointments
        .complete_appointment(appointment_id, request)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment marked as completed"
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<SchedulingState>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let existing = state
        .appointments
        .get_appointment(appointment_id)
        .await
        .map_err(map_appointment_error)?;
    check_appointment_access(&user, &existing)?;

    let appointment = state
        .appointments
        .cancel_appointment(appointment_id, request)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment cancelled successfully"
    })))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(state): State<SchedulingState>,
    Path(appointment_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<RescheduleAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let existing = state
        .appointments
        .get_appointment(appointment_id)
        .await
        .map_err(map_appointment_error)?;
    check_appointment_access(&user, &existing)?;

    let appointment = state
        .appointments
        .reschedule_appointment(appointment_id, request)
        .await
        .map_err(map_appointment_error)?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment rescheduled successfully"
    })))
}

// ==============================================================================
// DASHBOARD HANDLERS (scoped to the authenticated doctor)
// ==============================================================================

#[axum::debug_handler]
pub async fn dashboard_appointments(
    State(state): State<SchedulingState>,
    Query(params): Query<AppointmentQueryParams>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let email = user
        .email
        .clone()
        .ok_or_else(|| AppError::Auth("Token carries no email claim".to_string()))?;

    let (mut query, today) = params.into_query();
    query.doctor_email = Some(email);

    let appointments = state.appointments.list_appointments(query, today).await;
    Ok(Json(json!({ "appointments": appointments })))
}
