// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use crate::models::{AppointmentError, AppointmentStatus};

/// Actions a caller can take on an existing appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentAction {
    Complete,
    Cancel,
    Reschedule,
}

pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate a transition and return the target status.
    ///
    /// Booked and Rescheduled accept every action; Completed and Cancelled
    /// are terminal and accept none. Transitions are monotonic: there is no
    /// path out of a terminal state.
    pub fn validate_transition(
        &self,
        current_status: AppointmentStatus,
        action: AppointmentAction,
    ) -> Result<AppointmentStatus, AppointmentError> {
        debug!("Validating {:?} from status {}", action, current_status);

        if current_status.is_terminal() {
            warn!("Rejected {:?} on terminal status {}", action, current_status);
            return Err(AppointmentError::InvalidTransition(current_status));
        }

        Ok(match action {
            AppointmentAction::Complete => AppointmentStatus::Completed,
            AppointmentAction::Cancel => AppointmentStatus::Cancelled,
            AppointmentAction::Reschedule => AppointmentStatus::Rescheduled,
        })
    }

    /// All actions valid for a given current status.
    pub fn valid_actions(&self, current_status: AppointmentStatus) -> Vec<AppointmentAction> {
        if current_status.is_terminal() {
            vec![]
        } else {
            vec![
                AppointmentAction::Complete,
                AppointmentAction::Cancel,
                AppointmentAction::Reschedule,
            ]
        }
    }
}

impl Default for AppointmentLifecycleService {
    fn default() -> Self {
        Self::new()
    }
}
