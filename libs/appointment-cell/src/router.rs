use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::scheduling::AppointmentService;

#[derive(Clone)]
pub struct SchedulingState {
    pub config: Arc<AppConfig>,
    pub appointments: Arc<AppointmentService>,
}

pub fn appointment_routes(state: SchedulingState) -> Router {
    Router::new()
        .route("/", get(handlers::list_appointments))
        .route("/", post(handlers::book_appointment))
        .route("/{appointment_id}", get(handlers::get_appointment))
        .route("/{appointment_id}/complete", post(handlers::complete_appointment))
        .route("/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .route("/{appointment_id}/reschedule", put(handlers::reschedule_appointment))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ))
        .with_state(state)
}

pub fn dashboard_routes(state: SchedulingState) -> Router {
    Router::new()
        .route("/appointments", get(handlers::dashboard_appointments))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ))
        .with_state(state)
}
