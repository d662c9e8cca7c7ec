use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;
use crate::services::directory::DirectoryService;

#[derive(Clone)]
pub struct DirectoryState {
    pub config: Arc<AppConfig>,
    pub directory: Arc<DirectoryService>,
}

pub fn clinic_routes(state: DirectoryState) -> Router {
    Router::new()
        .route("/", get(handlers::list_clinics))
        .route("/", post(handlers::create_clinic))
        .route("/{clinic_id}", put(handlers::update_clinic))
        .route("/{clinic_id}", delete(handlers::delete_clinic))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ))
        .with_state(state)
}

pub fn doctor_routes(state: DirectoryState) -> Router {
    Router::new()
        .route("/", get(handlers::list_doctors))
        .route("/", post(handlers::create_doctor))
        .route("/{email}", put(handlers::assign_doctor))
        .route("/{email}", patch(handlers::update_doctor))
        .route("/{email}", delete(handlers::remove_doctor))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            auth_middleware,
        ))
        .with_state(state)
}
