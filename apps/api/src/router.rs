use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::router::{appointment_routes, dashboard_routes, SchedulingState};
use appointment_cell::services::scheduling::AppointmentService;
use clinic_cell::router::{clinic_routes, doctor_routes, DirectoryState};
use clinic_cell::services::directory::DirectoryService;
use patient_cell::services::patient::PatientService;
use shared_config::AppConfig;

pub fn create_router(config: Arc<AppConfig>) -> Router {
    let directory = Arc::new(DirectoryService::new());
    let patients = Arc::new(PatientService::new());
    let appointments = Arc::new(AppointmentService::new(directory.clone(), patients));

    let directory_state = DirectoryState {
        config: config.clone(),
        directory,
    };
    let scheduling_state = SchedulingState {
        config,
        appointments,
    };

    Router::new()
        .route("/", get(|| async { "Clinic scheduling API is running!" }))
        .nest("/clinics", clinic_routes(directory_state.clone()))
        .nest("/doctors", doctor_routes(directory_state))
        .nest("/appointments", appointment_routes(scheduling_state.clone()))
        .nest("/dashboard", dashboard_routes(scheduling_state))
}
