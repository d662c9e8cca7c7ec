// libs/clinic-cell/src/handlers.rs
use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    AssignDoctorRequest, CreateClinicRequest, CreateDoctorRequest, DirectoryError, DoctorFilter,
    UpdateClinicRequest, UpdateDoctorRequest,
};
use crate::router::DirectoryState;

// ==============================================================================
// QUERY PARAMETER STRUCTS
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct DeleteClinicQuery {
    pub force: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct DoctorQueryParams {
    pub clinic_id: Option<Uuid>,
    pub active_only: Option<bool>,
    pub limit: Option<usize>,
}

fn map_directory_error(e: DirectoryError) -> AppError {
    match e {
        DirectoryError::ClinicNotFound(id) => AppError::NotFound(format!("Clinic not found: {}", id)),
        DirectoryError::DoctorNotFound(email) => {
            AppError::NotFound(format!("Doctor not found: {}", email))
        }
        DirectoryError::DuplicateClinicName(name) => {
            AppError::Conflict(format!("Clinic name already in use: {}", name))
        }
        DirectoryError::DuplicateDoctor(email) => {
            AppError::Conflict(format!("Doctor already registered: {}", email))
        }
        DirectoryError::ClinicHasDoctors { count } => AppError::Conflict(format!(
            "Clinic has {} assigned doctor(s); pass force=true to cascade",
            count
        )),
        DirectoryError::Validation(msg) => AppError::Validation(msg),
    }
}

fn require_admin(user: &User) -> Result<(), AppError> {
    if user.role.as_deref() == Some("admin") {
        Ok(())
    } else {
        Err(AppError::Auth("Administrator role required".to_string()))
    }
}

// ==============================================================================
// CLINIC HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_clinics(
    State(state): State<DirectoryState>,
) -> Result<Json<Value>, AppError> {
    let clinics = state.directory.list_clinics().await;
    Ok(Json(json!({ "clinics": clinics })))
}

#[axum::debug_handler]
pub async fn create_clinic(
    State(state): State<DirectoryState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateClinicRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let clinic = state
        .directory
        .create_clinic(request)
        .await
        .map_err(map_directory_error)?;

    Ok(Json(json!({
        "success": true,
        "clinic": clinic,
        "message": "Clinic created successfully"
    })))
}

#[axum::debug_handler]
pub async fn update_clinic(
    State(state): State<DirectoryState>,
    Path(clinic_id): Path<Uuid>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateClinicRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let clinic = state
        .directory
        .update_clinic(clinic_id, request)
        .await
        .map_err(map_directory_error)?;

    Ok(Json(json!({
        "success": true,
        "clinic": clinic,
        "message": "Clinic updated successfully"
    })))
}

#[axum::debug_handler]
pub async fn delete_clinic(
    State(state): State<DirectoryState>,
    Path(clinic_id): Path<Uuid>,
    Query(query): Query<DeleteClinicQuery>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let deletion = state
        .directory
        .delete_clinic(clinic_id, query.force.unwrap_or(false))
        .await
        .map_err(map_directory_error)?;

    Ok(Json(json!({
        "success": true,
        "removed_doctors": deletion.removed_doctors,
        "message": "Clinic deleted successfully"
    })))
}

// ==============================================================================
// DOCTOR HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<DirectoryState>,
    Query(params): Query<DoctorQueryParams>,
) -> Result<Json<Value>, AppError> {
    let doctors = state
        .directory
        .list_doctors(DoctorFilter {
            clinic_id: params.clinic_id,
            active_only: params.active_only,
            limit: params.limit,
        })
        .await;

    Ok(Json(json!({ "doctors": doctors })))
}

#[axum::debug_handler]
pub async fn create_doctor(
    State(state): State<DirectoryState>,
    Extension(user): Extension<User>,
    Json(mut request): Json<CreateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    if request.timezone.is_none() {
        request.timezone = Some(state.config.default_timezone.clone());
    }

    let doctor = state
        .directory
        .create_doctor(request)
        .await
        .map_err(map_directory_error)?;

    Ok(Json(json!({
        "success": true,
        "doctor": doctor,
        "message": "Doctor created successfully"
    })))
}

#[axum::debug_handler]
pub async fn assign_doctor(
    State(state): State<DirectoryState>,
    Path(email): Path<String>,
    Extension(user): Extension<User>,
    Json(request): Json<AssignDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    let doctor = state
        .directory
        .assign_doctor(&email, request)
        .await
        .map_err(map_directory_error)?;

    Ok(Json(json!({
        "success": true,
        "doctor": doctor,
        "message": "Doctor assigned to clinic"
    })))
}

#[axum::debug_handler]
pub async fn update_doctor(
    State(state): State<DirectoryState>,
    Path(email): Path<String>,
    Extension(user): Extension<User>,
    Json(request): Json<UpdateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    // A doctor may edit their own profile; anything else is admin territory.
    let is_self = user
        .email
        .as_deref()
        .map(|e| e.eq_ignore_ascii_case(email.trim()))
        .unwrap_or(false);
    if !is_self {
        require_admin(&user)?;
    }

    let doctor = state
        .directory
        .update_doctor(&email, request)
        .await
        .map_err(map_directory_error)?;

    Ok(Json(json!({
        "success": true,
        "doctor": doctor,
        "message": "Doctor updated successfully"
    })))
}

#[axum::debug_handler]
pub async fn remove_doctor(
    State(state): State<DirectoryState>,
    Path(email): Path<String>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    require_admin(&user)?;

    state
        .directory
        .remove_doctor(&email)
        .await
        .map_err(map_directory_error)?;

    Ok(Json(json!({
        "success": true,
        "message": "Doctor removed"
    })))
}
