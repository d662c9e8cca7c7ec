pub mod conflict;
pub mod lifecycle;
pub mod projection;
pub mod scheduling;
