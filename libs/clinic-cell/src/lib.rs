pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use router::{clinic_routes, doctor_routes, DirectoryState};
pub use services::directory::DirectoryService;
